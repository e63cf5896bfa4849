use embassy_executor::{task, SendSpawner};
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use crate::config::FLASH_PERIOD_MS;
use crate::drivers::led_pwm::LedPwm;
use crate::error::{fatal, Fault};
use crate::flash::FlashDriver;
use crate::peripheral::{Device, DutyOutput};
use crate::state::{LED_LINK, LED_SHUTDOWN};

/// Flash task: one `FlashDriver` tick per period. Runs on the interrupt
/// executor so a slow main-loop iteration never delays it. A PWM fault halts.
#[task]
pub async fn flash_task(mut led: LedPwm) {
    let mut driver = FlashDriver::new();
    let mut ticker = Ticker::every(Duration::from_millis(FLASH_PERIOD_MS));

    loop {
        match select(LED_SHUTDOWN.requested(), ticker.next()).await {
            Either::First(()) => break,
            Either::Second(()) => {
                if let Err(fault) = driver.tick(&LED_LINK, &mut led) {
                    fatal(fault);
                }
            }
        }
    }

    let result = led.disable();
    LED_LINK.set_lit(false);
    LED_SHUTDOWN.finished(result);
}

pub struct FlashLed {
    running: bool,
}

impl FlashLed {
    pub async fn start(spawner: SendSpawner, led: LedPwm) -> Result<Self, Fault> {
        spawner.spawn(flash_task(led)).map_err(|_| Fault::Spawn)?;
        Ok(Self { running: true })
    }
}

impl Device for FlashLed {
    fn name(&self) -> &'static str {
        "led"
    }

    async fn deinit(&mut self) -> Result<(), Fault> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        LED_SHUTDOWN.stop().await
    }
}
