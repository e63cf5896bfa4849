//! Ordered bring-up and teardown of the four peripherals.
//!
//! Startup order is orientation, speed, light, LED. A failure part way
//! releases every stage that already came up, newest first, and reports the
//! stage that failed. Each constructor is a future, so a stage is not touched
//! until the one before it has succeeded.

use core::future::Future;

use crate::error::{Fault, Stage, StartupError};
use crate::peripheral::Device;

/// Everything that came up. Owned by the main loop until shutdown.
pub struct Rig<O, S, L, P> {
    pub orientation: O,
    pub speed: S,
    pub light: L,
    pub led: P,
}

async fn release<D: Device>(device: &mut D) {
    match device.deinit().await {
        Ok(()) => log_info!("{} released", device.name()),
        Err(e) => log_warn!("{} release failed: {}", device.name(), e),
    }
}

fn failed(stage: Stage, fault: Fault) -> StartupError {
    log_error!("{} init failed: {}", stage.name(), fault);
    StartupError { stage, fault }
}

pub async fn bring_up<O, S, L, P>(
    orientation: impl Future<Output = Result<O, Fault>>,
    speed: impl Future<Output = Result<S, Fault>>,
    light: impl Future<Output = Result<L, Fault>>,
    led: impl Future<Output = Result<P, Fault>>,
) -> Result<Rig<O, S, L, P>, StartupError>
where
    O: Device,
    S: Device,
    L: Device,
    P: Device,
{
    let mut orientation = orientation.await.map_err(|e| failed(Stage::Orientation, e))?;
    log_info!("{} up", orientation.name());

    let mut speed = match speed.await {
        Ok(s) => s,
        Err(e) => {
            release(&mut orientation).await;
            return Err(failed(Stage::Speed, e));
        }
    };
    log_info!("{} up", speed.name());

    let mut light = match light.await {
        Ok(l) => l,
        Err(e) => {
            release(&mut speed).await;
            release(&mut orientation).await;
            return Err(failed(Stage::Light, e));
        }
    };
    log_info!("{} up", light.name());

    let led = match led.await {
        Ok(p) => p,
        Err(e) => {
            release(&mut light).await;
            release(&mut speed).await;
            release(&mut orientation).await;
            return Err(failed(Stage::Led, e));
        }
    };
    log_info!("{} up", led.name());

    Ok(Rig { orientation, speed, light, led })
}

impl<O, S, L, P> Rig<O, S, L, P>
where
    O: Device,
    S: Device,
    L: Device,
    P: Device,
{
    /// Release in reverse bring-up order. Failures are logged and the
    /// remaining devices are still released.
    pub async fn shutdown(mut self) {
        release(&mut self.led).await;
        release(&mut self.light).await;
        release(&mut self.speed).await;
        release(&mut self.orientation).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GpsFault, ImuFault, LedFault, LightFault};
    use core::cell::RefCell;
    use embassy_futures::block_on;
    use std::rc::Rc;
    use std::string::{String, ToString};
    use std::vec::Vec;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        journal: Journal,
        deinit_fails: bool,
    }

    impl Device for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn deinit(&mut self) -> Result<(), Fault> {
            self.journal.borrow_mut().push(std::format!("deinit {}", self.name));
            if self.deinit_fails {
                Err(Fault::Led(LedFault::ChannelDisabled))
            } else {
                Ok(())
            }
        }
    }

    async fn open(name: &'static str, journal: Journal, fault: Option<Fault>) -> Result<Probe, Fault> {
        journal.borrow_mut().push(std::format!("init {}", name));
        match fault {
            Some(f) => Err(f),
            None => Ok(Probe { name, journal, deinit_fails: false }),
        }
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow().clone()
    }

    fn run(faults: [Option<Fault>; 4]) -> (Result<Rig<Probe, Probe, Probe, Probe>, StartupError>, Journal) {
        let journal: Journal = Rc::default();
        let result = block_on(bring_up(
            open("orientation", journal.clone(), faults[0]),
            open("speed", journal.clone(), faults[1]),
            open("light", journal.clone(), faults[2]),
            open("led", journal.clone(), faults[3]),
        ));
        (result, journal)
    }

    #[test]
    fn brings_up_in_order() {
        let (result, journal) = run([None; 4]);
        assert!(result.is_ok());
        assert_eq!(
            entries(&journal),
            ["init orientation", "init speed", "init light", "init led"].map(|s| s.to_string())
        );
    }

    #[test]
    fn first_stage_failure_releases_nothing() {
        let fault = Fault::Imu(ImuFault::WrongIdentity(0));
        let (result, journal) = run([Some(fault), None, None, None]);
        assert_eq!(result.err(), Some(StartupError { stage: Stage::Orientation, fault }));
        assert_eq!(entries(&journal), ["init orientation".to_string()]);
    }

    #[test]
    fn speed_failure_releases_orientation() {
        let fault = Fault::Gps(GpsFault::Config);
        let (result, journal) = run([None, Some(fault), None, None]);
        assert_eq!(result.err().map(|e| e.stage), Some(Stage::Speed));
        assert_eq!(
            entries(&journal),
            ["init orientation", "init speed", "deinit orientation"].map(|s| s.to_string())
        );
    }

    #[test]
    fn led_failure_releases_everything_in_reverse() {
        let fault = Fault::Led(LedFault::NoPeriod);
        let (result, journal) = run([None, None, None, Some(fault)]);
        assert_eq!(result.err(), Some(StartupError { stage: Stage::Led, fault }));
        assert_eq!(
            entries(&journal),
            [
                "init orientation",
                "init speed",
                "init light",
                "init led",
                "deinit light",
                "deinit speed",
                "deinit orientation",
            ]
            .map(|s| s.to_string())
        );
    }

    #[test]
    fn later_constructors_never_run_after_failure() {
        let fault = Fault::Light(LightFault::Reference);
        let (_, journal) = run([None, None, Some(fault), None]);
        assert!(!entries(&journal).iter().any(|e| e == "init led"));
    }

    #[test]
    fn shutdown_releases_led_first_and_survives_failures() {
        let (result, journal) = run([None; 4]);
        let mut rig = match result {
            Ok(rig) => rig,
            Err(e) => panic!("bring-up failed: {}", e),
        };
        rig.light.deinit_fails = true;
        journal.borrow_mut().clear();

        block_on(rig.shutdown());
        assert_eq!(
            entries(&journal),
            ["deinit led", "deinit light", "deinit speed", "deinit orientation"].map(|s| s.to_string())
        );
    }
}
