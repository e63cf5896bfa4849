//! STM32F405 board bring-up.
//!
//! Pin map:
//!
//! | Function      | Peripheral | Pins                                  |
//! |---------------|------------|---------------------------------------|
//! | ICM-42688     | SPI1       | SCK PA5, MOSI PA7, MISO PA6, CS PB12  |
//! | GPS receiver  | USART3     | RX PB11, TX PB10 (DMA1 CH3/CH1)       |
//! | Photoresistor | ADC1       | PC1                                   |
//! | Status LED    | TIM3 CH4   | PB1                                   |
//! | USB CDC       | OTG_FS     | DP PA12, DM PA11                      |

use embassy_executor::{SendSpawner, Spawner};
use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::peripherals::{ADC1, DMA1_CH1, DMA1_CH3, PA5, PA6, PA7, PB1, PB10, PB11, PB12, PC1, SPI1, TIM3, USART3};
use embassy_stm32::rcc::*;
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::usart::{Config as UsartConfig, Uart};
use embassy_stm32::{bind_interrupts, peripherals, usart, Config};

use crate::config::GPS_BAUD;
use crate::drivers::icm42688::Icm42688;
use crate::drivers::led_pwm::LedPwm;
use crate::drivers::photoresistor::Photoresistor;
use crate::error::{Fault, StartupError};
use crate::supervisor::{bring_up, Rig};
use crate::tasks::attitude_task::ImuOrientation;
use crate::tasks::flash_task::FlashLed;
use crate::tasks::gps_task::GpsSpeed;

bind_interrupts!(struct Irqs {
    USART3 => usart::InterruptHandler<peripherals::USART3>;
});

pub type BoardRig = Rig<ImuOrientation, GpsSpeed, Photoresistor, FlashLed>;

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    /// 48 MHz from the 8 MHz crystal. Plenty for a 100 Hz filter, and the
    /// same PLL feeds USB its 48 MHz.
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL96,
            divp: Some(PllPDiv::DIV4), // 48 MHz
            divq: Some(PllQDiv::DIV4), // 48 MHz USB
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV2;
        config.rcc.apb2_pre = APBPrescaler::DIV1;

        let p = embassy_stm32::init(config);

        Self { p }
    }
}

/// Peripherals the rig takes; the rest of `Peripherals` stays with the caller.
pub struct RigPins {
    pub spi1: SPI1,
    pub sck: PA5,
    pub mosi: PA7,
    pub miso: PA6,
    pub imu_cs: PB12,
    pub usart3: USART3,
    pub gps_rx: PB11,
    pub gps_tx: PB10,
    pub gps_tx_dma: DMA1_CH3,
    pub gps_rx_dma: DMA1_CH1,
    pub adc1: ADC1,
    pub light: PC1,
    pub tim3: TIM3,
    pub led: PB1,
}

async fn open_imu(spawner: Spawner, spi1: SPI1, sck: PA5, mosi: PA7, miso: PA6, cs: PB12) -> Result<ImuOrientation, Fault> {
    use embassy_stm32::dma::NoDma;

    let mut spi_config = SpiConfig::default();
    spi_config.frequency = TimeHertz(10_000_000);
    let spi = Spi::new(spi1, sck, mosi, miso, NoDma, NoDma, spi_config);
    let cs = Output::new(cs.degrade(), Level::High, Speed::VeryHigh);

    ImuOrientation::start(spawner, Icm42688::new(spi, cs)).await
}

async fn open_gps(
    spawner: Spawner,
    usart3: USART3,
    rx: PB11,
    tx: PB10,
    tx_dma: DMA1_CH3,
    rx_dma: DMA1_CH1,
) -> Result<GpsSpeed, Fault> {
    let mut gps_config = UsartConfig::default();
    gps_config.baudrate = GPS_BAUD;
    let uart = Uart::new(usart3, rx, tx, Irqs, tx_dma, rx_dma, gps_config);

    GpsSpeed::start(spawner, uart).await
}

async fn open_led(spawner: SendSpawner, tim3: TIM3, pin: PB1) -> Result<FlashLed, Fault> {
    FlashLed::start(spawner, LedPwm::new(tim3, pin)?).await
}

/// Bring up orientation, speed, light and LED in that order. The flash task
/// goes to `flash_spawner` (the interrupt executor); everything else to
/// `spawner`.
pub async fn bring_up_rig(spawner: Spawner, flash_spawner: SendSpawner, pins: RigPins) -> Result<BoardRig, StartupError> {
    let RigPins {
        spi1,
        sck,
        mosi,
        miso,
        imu_cs,
        usart3,
        gps_rx,
        gps_tx,
        gps_tx_dma,
        gps_rx_dma,
        adc1,
        light,
        tim3,
        led,
    } = pins;

    bring_up(
        open_imu(spawner, spi1, sck, mosi, miso, imu_cs),
        open_gps(spawner, usart3, gps_rx, gps_tx, gps_tx_dma, gps_rx_dma),
        Photoresistor::open(adc1, light),
        open_led(flash_spawner, tim3, led),
    )
    .await
}
