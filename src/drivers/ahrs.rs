//! Attitude from a 6-axis IMU: Mahony complementary filter plus the raw-count
//! scaling and gyro bias estimate that feed it.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::state::Orientation;

/// ±2000 dps full scale: 16.4 LSB per deg/s.
const GYRO_LSB_PER_DPS: f32 = 16.4;
/// ±16 g full scale: 2048 LSB per g.
const ACCEL_LSB_PER_G: f32 = 2048.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }
}

/// Raw gyro counts to rad/s.
pub fn gyro_rad_s(raw: [i16; 3], bias: [f32; 3]) -> [f32; 3] {
    core::array::from_fn(|i| ((raw[i] as f32 - bias[i]) / GYRO_LSB_PER_DPS).to_radians())
}

/// Raw accel counts to g.
pub fn accel_g(raw: [i16; 3]) -> [f32; 3] {
    raw.map(|v| v as f32 / ACCEL_LSB_PER_G)
}

/// Averages gyro counts while the vehicle is at rest.
#[derive(Default)]
pub struct BiasCalibrator {
    sum: [i32; 3],
    samples: u32,
}

impl BiasCalibrator {
    pub fn add(&mut self, gyro: [i16; 3]) {
        for (acc, v) in self.sum.iter_mut().zip(gyro) {
            *acc += v as i32;
        }
        self.samples += 1;
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Mean offset in raw counts; zero if nothing was collected.
    pub fn bias(&self) -> [f32; 3] {
        if self.samples == 0 {
            return [0.0; 3];
        }
        self.sum.map(|s| s as f32 / self.samples as f32)
    }
}

pub struct Mahony {
    kp: f32,
    ki: f32,

    // Integral error
    ix: f32,
    iy: f32,
    iz: f32,

    pub q: Quaternion,
}

impl Mahony {
    pub fn new() -> Self {
        Self {
            kp: 2.0,
            ki: 0.005,
            ix: 0.0,
            iy: 0.0,
            iz: 0.0,
            q: Quaternion::default(),
        }
    }

    /// One filter step. `gyro` in rad/s, `accel` in any unit (normalised here).
    pub fn update(&mut self, dt: f32, gyro: [f32; 3], accel: [f32; 3]) {
        let Quaternion { w: mut q0, x: mut q1, y: mut q2, z: mut q3 } = self.q;
        let [gx, gy, gz] = gyro;
        let [ax, ay, az] = accel;

        // Free fall or a dead sensor; nothing to correct against
        let norm_sq = ax * ax + ay * ay + az * az;
        if norm_sq == 0.0 {
            return;
        }
        let recip_norm = norm_sq.sqrt().recip();
        let (ax, ay, az) = (ax * recip_norm, ay * recip_norm, az * recip_norm);

        // Half the estimated direction of gravity
        let halfvx = q1 * q3 - q0 * q2;
        let halfvy = q0 * q1 + q2 * q3;
        let halfvz = q0 * q0 - 0.5 + q3 * q3;

        // Cross product of estimated and measured gravity
        let halfex = ay * halfvz - az * halfvy;
        let halfey = az * halfvx - ax * halfvz;
        let halfez = ax * halfvy - ay * halfvx;

        if self.ki > 0.0 {
            self.ix += self.ki * halfex * dt;
            self.iy += self.ki * halfey * dt;
            self.iz += self.ki * halfez * dt;
        }

        let gx = (gx + self.kp * halfex + self.ix) * (0.5 * dt);
        let gy = (gy + self.kp * halfey + self.iy) * (0.5 * dt);
        let gz = (gz + self.kp * halfez + self.iz) * (0.5 * dt);

        let (qa, qb, qc) = (q0, q1, q2);
        q0 += -qb * gx - qc * gy - q3 * gz;
        q1 += qa * gx + qc * gz - q3 * gy;
        q2 += qa * gy - qb * gz + q3 * gx;
        q3 += qa * gz + qb * gy - qc * gx;

        let recip_norm = (q0 * q0 + q1 * q1 + q2 * q2 + q3 * q3).sqrt().recip();
        self.q = Quaternion {
            w: q0 * recip_norm,
            x: q1 * recip_norm,
            y: q2 * recip_norm,
            z: q3 * recip_norm,
        };
    }

    /// Pitch and roll in degrees. Yaw is not observable without a
    /// magnetometer and is not reported.
    pub fn orientation(&self) -> Orientation {
        let Quaternion { w: q0, x: q1, y: q2, z: q3 } = self.q;

        // Roll (x-axis rotation)
        let sinr_cosp = 2.0 * (q0 * q1 + q2 * q3);
        let cosr_cosp = 1.0 - 2.0 * (q1 * q1 + q2 * q2);
        let roll = sinr_cosp.atan2(cosr_cosp);

        // Pitch (y-axis rotation), clamped at ±90°
        let sinp = 2.0 * (q0 * q2 - q3 * q1);
        let pitch = if sinp.abs() >= 1.0 {
            core::f32::consts::FRAC_PI_2.copysign(sinp)
        } else {
            sinp.asin()
        };

        Orientation::new(pitch.to_degrees(), roll.to_degrees())
    }
}

impl Default for Mahony {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(filter: &mut Mahony, accel: [f32; 3], steps: usize) {
        for _ in 0..steps {
            filter.update(0.01, [0.0; 3], accel);
        }
    }

    #[test]
    fn level_stays_level() {
        let mut f = Mahony::new();
        settle(&mut f, [0.0, 0.0, 1.0], 500);
        let o = f.orientation();
        assert!(o.pitch_deg.abs() < 0.5, "pitch {}", o.pitch_deg);
        assert!(o.roll_deg.abs() < 0.5, "roll {}", o.roll_deg);
    }

    #[test]
    fn converges_to_a_static_roll() {
        let mut f = Mahony::new();
        let a = 20.0f32.to_radians();
        settle(&mut f, [0.0, a.sin(), a.cos()], 3000);
        let o = f.orientation();
        assert!((o.roll_deg - 20.0).abs() < 1.5, "roll {}", o.roll_deg);
        assert!(o.pitch_deg.abs() < 1.5, "pitch {}", o.pitch_deg);
    }

    #[test]
    fn zero_accel_leaves_state_untouched() {
        let mut f = Mahony::new();
        f.update(0.01, [1.0, 1.0, 1.0], [0.0; 3]);
        assert_eq!(f.q, Quaternion::default());
    }

    #[test]
    fn bias_is_the_mean() {
        let mut cal = BiasCalibrator::default();
        assert_eq!(cal.bias(), [0.0; 3]);
        cal.add([10, -4, 0]);
        cal.add([20, -6, 3]);
        assert_eq!(cal.samples(), 2);
        assert_eq!(cal.bias(), [15.0, -5.0, 1.5]);
    }

    #[test]
    fn scaling() {
        let g = gyro_rad_s([164 + 10, 0, -164], [10.0, 0.0, 0.0]);
        assert!((g[0] - 10.0f32.to_radians()).abs() < 1e-4);
        assert_eq!(g[1], 0.0);
        assert!((g[2] + 10.0f32.to_radians()).abs() < 1e-4);

        assert_eq!(accel_g([2048, -1024, 0]), [1.0, -0.5, 0.0]);
    }
}
