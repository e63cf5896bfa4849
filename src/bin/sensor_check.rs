#![no_std]
#![no_main]

//! # Sensor check
//!
//! Brings up the same rig as the firmware, keeps the LED flashing no matter
//! the attitude, and streams what every sensor reports as CSV over USB
//! CDC-ACM (and defmt). Used to tune the light mapping constants in
//! `config.rs` for a given board and enclosure.
//!
//! ## Usage
//! ```sh
//! cargo sensor-check
//! cat /dev/ttyACM0 > sensors.csv
//! ```
//!
//! ## CSV format
//! `ts_ms,speed_mps,light_mv,duty,pitch_deg,roll_deg,lit`
//!
//! The light is sampled every line, including while the LED is lit, so the
//! `lit` column shows how much the LED leaks into the sensor.

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_time::{Duration, Instant, Ticker, Timer};
use {defmt_rtt as _, panic_probe as _};

use level_indicator::board::{bring_up_rig, Board, RigPins};
use level_indicator::brightness::duty_for_light;
use level_indicator::config::SPEED_STALE_AFTER_MS;
use level_indicator::error::{fatal, Fault};
use level_indicator::peripheral::{LightSource, OrientationSource};
use level_indicator::speed::SpeedTracker;
use level_indicator::state::{LedCommand, LED_LINK, SPEED_FIX};
use level_indicator::{log_error, log_info, usb};

/// Sample period.
const SAMPLE_PERIOD_MS: u64 = 500;

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART5() {
    EXECUTOR_HIGH.on_interrupt()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let board = Board::init();
    let p = board.p;

    // USB CDC
    let (usb_dev, mut usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
    if spawner.spawn(usb::usb_task(usb_dev)).is_err() {
        log_error!("usb task did not spawn");
    }

    interrupt::UART5.set_priority(Priority::P6);
    let flash_spawner = EXECUTOR_HIGH.start(interrupt::UART5);

    let pins = RigPins {
        spi1: p.SPI1,
        sck: p.PA5,
        mosi: p.PA7,
        miso: p.PA6,
        imu_cs: p.PB12,
        usart3: p.USART3,
        gps_rx: p.PB11,
        gps_tx: p.PB10,
        gps_tx_dma: p.DMA1_CH3,
        gps_rx_dma: p.DMA1_CH1,
        adc1: p.ADC1,
        light: p.PC1,
        tim3: p.TIM3,
        led: p.PB1,
    };
    let mut rig = match bring_up_rig(spawner, flash_spawner, pins).await {
        Ok(rig) => rig,
        Err(e) => {
            log_error!("startup failed at {}: {}", e.stage, e.fault);
            panic!("startup failed");
        }
    };

    // ── Wait for a host (max 30 s, then stream anyway) ────────────────────────
    for _ in 0..300u32 {
        if usb_serial.dtr() {
            break;
        }
        Timer::after(Duration::from_millis(100)).await;
    }
    usb::write_line(&mut usb_serial, "# level indicator sensor check\r\n").await;
    usb::write_line(&mut usb_serial, "# ts_ms,speed_mps,light_mv,duty,pitch_deg,roll_deg,lit\r\n").await;

    let start = Instant::now();
    let mut speed = SpeedTracker::new(SPEED_STALE_AFTER_MS);
    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_PERIOD_MS));

    loop {
        ticker.next().await;
        let ts_ms = start.elapsed().as_millis();

        if let Some(fix) = SPEED_FIX.try_take() {
            speed.record(fix);
        }
        let speed_mps = speed.speed_mps(Instant::now().as_millis());

        let lit = LED_LINK.is_lit();
        let sample = async {
            let light_mv = rig.light.read().await?;
            let orientation = rig.orientation.read().await?;
            Ok::<_, Fault>((light_mv, orientation))
        };
        let (light_mv, orientation) = match sample.await {
            Ok(v) => v,
            Err(fault) => {
                rig.shutdown().await;
                fatal(fault);
            }
        };

        let duty = duty_for_light(light_mv);
        LED_LINK.publish(LedCommand { enabled: true, duty });

        log_info!(
            "{},{},{},{},{},{},{}",
            ts_ms,
            speed_mps,
            light_mv,
            duty.get(),
            orientation.pitch_deg,
            orientation.roll_deg,
            lit
        );
        usb::write_fmt(
            &mut usb_serial,
            format_args!(
                "{},{:.2},{},{},{:.2},{:.2},{}\r\n",
                ts_ms,
                speed_mps,
                light_mv,
                duty.get(),
                orientation.pitch_deg,
                orientation.roll_deg,
                lit as u8
            ),
        )
        .await;
    }
}
