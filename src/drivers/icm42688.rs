use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{AnyPin, Output};
use embassy_stm32::spi::{Instance, Spi};
use embassy_time::{Duration, Timer};

use crate::error::{Fault, ImuFault};

const REG_DEVICE_CONFIG: u8 = 0x11;
const REG_ACCEL_DATA_X1: u8 = 0x1F;
const REG_PWR_MGMT0: u8 = 0x4E;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I: u8 = 0x47;
/// Gyro and accel in low-noise mode.
const PWR_LOW_NOISE: u8 = 0x0F;
/// Both sensors off.
const PWR_OFF: u8 = 0x00;

const BUS: Fault = Fault::Imu(ImuFault::Bus);

pub struct Icm42688<'d, T: Instance> {
    spi: Spi<'d, T, NoDma, NoDma>,
    cs: Output<'d, AnyPin>,
}

impl<'d, T: Instance> Icm42688<'d, T> {
    pub fn new(spi: Spi<'d, T, NoDma, NoDma>, cs: Output<'d, AnyPin>) -> Self {
        Self { spi, cs }
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Fault> {
        let buf = [reg & 0x7F, value];
        self.cs.set_low();
        let res = self.spi.blocking_write(&buf);
        self.cs.set_high();
        res.map_err(|_| BUS)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, Fault> {
        let tx = [reg | 0x80, 0x00];
        let mut rx = [0u8; 2];

        self.cs.set_low();
        let res = self.spi.blocking_transfer(&mut rx, &tx);
        self.cs.set_high();

        res.map_err(|_| BUS)?;
        Ok(rx[1])
    }

    /// Reset, confirm identity, start both sensors at their reset full
    /// scales (±2000 dps, ±16 g).
    pub async fn init(&mut self) -> Result<(), Fault> {
        self.write_reg(REG_DEVICE_CONFIG, 0x01)?;
        Timer::after(Duration::from_millis(10)).await;

        let id = self.read_reg(REG_WHO_AM_I)?;
        if id != WHO_AM_I {
            return Err(Fault::Imu(ImuFault::WrongIdentity(id)));
        }

        self.write_reg(REG_PWR_MGMT0, PWR_LOW_NOISE)?;
        Timer::after(Duration::from_millis(50)).await;

        Ok(())
    }

    pub async fn power_down(&mut self) -> Result<(), Fault> {
        self.write_reg(REG_PWR_MGMT0, PWR_OFF)
    }

    /// One burst read: (accel, gyro) in raw counts.
    pub async fn read_all(&mut self) -> Result<([i16; 3], [i16; 3]), Fault> {
        let mut tx = [0u8; 13];
        tx[0] = REG_ACCEL_DATA_X1 | 0x80;
        let mut rx = [0u8; 13];

        self.cs.set_low();
        let res = self.spi.blocking_transfer(&mut rx, &tx);
        self.cs.set_high();
        res.map_err(|_| BUS)?;

        let word = |i: usize| i16::from_be_bytes([rx[i], rx[i + 1]]);
        Ok(([word(1), word(3), word(5)], [word(7), word(9), word(11)]))
    }
}
