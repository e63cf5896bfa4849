#![no_std]
#![no_main]

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_time::{Duration, Instant, Ticker};
use {defmt_rtt as _, panic_probe as _};

use level_indicator::board::{bring_up_rig, Board, RigPins};
use level_indicator::config::{LEVEL, POLL_PERIOD_MS, SPEED_STALE_AFTER_MS};
use level_indicator::error::fatal;
use level_indicator::monitor::Monitor;
use level_indicator::state::{LED_LINK, SPEED_FIX};
use level_indicator::{log_error, log_info};

// ── Flash executor ────────────────────────────────────────────────────────────
//  The flash task preempts the main loop from a spare interrupt vector.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART5() {
    EXECUTOR_HIGH.on_interrupt()
}

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Clocks (48 MHz PLL)
    let board = Board::init();
    let p = board.p;
    log_info!("level indicator starting");

    // 2. Interrupt executor for the flash task
    interrupt::UART5.set_priority(Priority::P6);
    let flash_spawner = EXECUTOR_HIGH.start(interrupt::UART5);

    // 3. Orientation → speed → light → LED
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
    log_info!("all peripherals up");

    // 4. Poll loop
    let mut monitor = Monitor::new(LEVEL, SPEED_STALE_AFTER_MS);
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));

    loop {
        if let Some(fix) = SPEED_FIX.try_take() {
            monitor.record_fix(fix);
        }

        let now_ms = Instant::now().as_millis();
        match monitor.poll(&mut rig.orientation, &mut rig.light, &LED_LINK, now_ms).await {
            Ok(report) => log_info!(
                "pitch {} roll {} speed {} light {} duty {} alarm {}",
                report.orientation.pitch_deg,
                report.orientation.roll_deg,
                report.speed_mps,
                report.light_mv,
                report.duty,
                report.alarm
            ),
            Err(fault) => {
                rig.shutdown().await;
                fatal(fault);
            }
        }

        ticker.next().await;
    }
}
