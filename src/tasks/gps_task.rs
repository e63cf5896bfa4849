use embassy_executor::{task, Spawner};
use embassy_futures::select::{select, Either};
use embassy_stm32::peripherals::{DMA1_CH1, DMA1_CH3, USART3};
use embassy_stm32::usart::{ConfigError, Uart};
use embassy_time::Instant;

use crate::drivers::gps::{NmeaEvent, NmeaParser};
use crate::error::{Fault, GpsFault};
use crate::peripheral::Device;
use crate::state::{SpeedFix, GPS_SHUTDOWN, SPEED_FIX};

pub type GpsUart = Uart<'static, USART3, DMA1_CH3, DMA1_CH1>;

/// GPS task: reads NMEA bursts from USART3 and pushes every speed report.
#[task]
pub async fn gps_task(mut uart: GpsUart) {
    let mut parser = NmeaParser::new();
    let mut buf = [0u8; 256];
    let mut uart_errors: u32 = 0;

    loop {
        match select(GPS_SHUTDOWN.requested(), uart.read_until_idle(&mut buf)).await {
            Either::First(()) => break,
            Either::Second(Ok(n)) => {
                let at_ms = Instant::now().as_millis();
                parser.push_data(&buf[..n], |event| match event {
                    NmeaEvent::Speed(mps) => SPEED_FIX.signal(SpeedFix { mps, at_ms }),
                    NmeaEvent::Unknown(sentence) => log_warn!("gps: unknown sentence {}", sentence),
                });
            }
            Either::Second(Err(_)) => {
                // Overrun or framing; the parser resyncs on the next '$'
                uart_errors = uart_errors.wrapping_add(1);
                log_debug!("gps: uart error #{}", uart_errors);
            }
        }
    }

    let stats = parser.stats;
    log_info!(
        "gps: {} sentences, {} checksum errors, {} overflows",
        stats.sentences_rx,
        stats.checksum_errors,
        stats.frame_errors
    );
    drop(uart);
    GPS_SHUTDOWN.finished(Ok(()));
}

/// Speed source backed by the GPS task. Fixes arrive through `SPEED_FIX`.
pub struct GpsSpeed {
    running: bool,
}

impl GpsSpeed {
    pub async fn start(spawner: Spawner, uart: Result<GpsUart, ConfigError>) -> Result<Self, Fault> {
        let uart = uart.map_err(|_| Fault::Gps(GpsFault::Config))?;
        SPEED_FIX.reset();
        spawner.spawn(gps_task(uart)).map_err(|_| Fault::Spawn)?;
        Ok(Self { running: true })
    }
}

impl Device for GpsSpeed {
    fn name(&self) -> &'static str {
        "gps"
    }

    async fn deinit(&mut self) -> Result<(), Fault> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        GPS_SHUTDOWN.stop().await
    }
}
