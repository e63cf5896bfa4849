use embassy_executor::{task, Spawner};
use embassy_futures::select::{select, Either};
use embassy_stm32::peripherals::SPI1;
use embassy_time::{with_timeout, Duration, Ticker, Timer};

use crate::config::{ATTITUDE_FIRST_SAMPLE_TIMEOUT_MS, ATTITUDE_RATE_HZ, GYRO_CALIB_SAMPLES};
use crate::drivers::ahrs::{accel_g, gyro_rad_s, BiasCalibrator, Mahony};
use crate::drivers::icm42688::Icm42688;
use crate::error::{Fault, ImuFault};
use crate::peripheral::{Device, OrientationSource};
use crate::state::{Orientation, ATTITUDE, ATTITUDE_SHUTDOWN};

pub type Imu = Icm42688<'static, SPI1>;

/// Attitude task: integrates the IMU at `ATTITUDE_RATE_HZ` and publishes
/// every estimate. A bus fault is published once, then the task idles until
/// asked to stop. The IMU is powered down on the way out.
#[task]
pub async fn attitude_task(mut imu: Imu, gyro_bias: [f32; 3]) {
    let mut filter = Mahony::new();
    let mut ticker = Ticker::every(Duration::from_hz(ATTITUDE_RATE_HZ));
    let dt = 1.0 / ATTITUDE_RATE_HZ as f32;

    loop {
        match select(ATTITUDE_SHUTDOWN.requested(), ticker.next()).await {
            Either::First(()) => break,
            Either::Second(()) => match imu.read_all().await {
                Ok((accel, gyro)) => {
                    filter.update(dt, gyro_rad_s(gyro, gyro_bias), accel_g(accel));
                    ATTITUDE.signal(Ok(filter.orientation()));
                }
                Err(fault) => {
                    log_error!("attitude: {}", fault);
                    ATTITUDE.signal(Err(fault));
                    ATTITUDE_SHUTDOWN.requested().await;
                    break;
                }
            },
        }
    }

    ATTITUDE_SHUTDOWN.finished(imu.power_down().await);
}

/// Orientation source backed by the attitude task.
pub struct ImuOrientation {
    running: bool,
}

impl ImuOrientation {
    /// Bring the IMU up, calibrate gyro bias at rest, start the task and
    /// wait for its first estimate.
    pub async fn start(spawner: Spawner, mut imu: Imu) -> Result<Self, Fault> {
        imu.init().await?;

        let mut cal = BiasCalibrator::default();
        for _ in 0..GYRO_CALIB_SAMPLES {
            let (_, gyro) = imu.read_all().await?;
            cal.add(gyro);
            Timer::after(Duration::from_millis(10)).await;
        }
        let bias = cal.bias();
        log_info!("imu: gyro bias {} {} {} over {} samples", bias[0], bias[1], bias[2], cal.samples());

        ATTITUDE.reset();
        spawner.spawn(attitude_task(imu, bias)).map_err(|_| Fault::Spawn)?;

        let mut source = Self { running: true };
        let first = with_timeout(
            Duration::from_millis(ATTITUDE_FIRST_SAMPLE_TIMEOUT_MS),
            ATTITUDE.wait(),
        )
        .await
        .unwrap_or(Err(Fault::Imu(ImuFault::NoSample)));

        match first {
            Ok(_) => Ok(source),
            Err(fault) => {
                let _ = source.deinit().await;
                Err(fault)
            }
        }
    }
}

impl OrientationSource for ImuOrientation {
    async fn read(&mut self) -> Result<Orientation, Fault> {
        ATTITUDE.wait().await
    }
}

impl Device for ImuOrientation {
    fn name(&self) -> &'static str {
        "imu"
    }

    async fn deinit(&mut self) -> Result<(), Fault> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        ATTITUDE_SHUTDOWN.stop().await
    }
}
