//! USB CDC-ACM link used by the sensor-check binary to stream CSV.

use core::fmt::Write;

use embassy_stm32::usb_otg::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    OTG_FS => usb_otg::InterruptHandler<peripherals::USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, peripherals::USB_OTG_FS>;
pub type UsbSerial = CdcAcmClass<'static, UsbDriver>;

/// Largest packet a full-speed CDC bulk endpoint carries.
const MAX_PACKET: usize = 64;

struct UsbBuffers {
    config_desc: [u8; 256],
    bos_desc: [u8; 256],
    control_buf: [u8; 64],
    ep_out: [u8; 256],
}

static BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
static STATE: StaticCell<State<'static>> = StaticCell::new();

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Build the device and its serial class. Call once.
pub fn init(
    usb_periph: peripherals::USB_OTG_FS,
    pa12: peripherals::PA12,
    pa11: peripherals::PA11,
) -> (UsbDevice<'static, UsbDriver>, UsbSerial) {
    let bufs = BUFFERS.init(UsbBuffers {
        config_desc: [0; 256],
        bos_desc: [0; 256],
        control_buf: [0; 64],
        ep_out: [0; 256],
    });

    let mut usb_config = usb_otg::Config::default();
    usb_config.vbus_detection = false;
    let driver = Driver::new_fs(usb_periph, Irqs, pa12, pa11, &mut bufs.ep_out, usb_config);

    let mut config = Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("Level Indicator");
    config.product = Some("Level Indicator Sensor Check");
    config.serial_number = Some("00000001");

    let mut builder = Builder::new(
        driver,
        config,
        &mut bufs.config_desc,
        &mut bufs.bos_desc,
        &mut [], // msos_descs
        &mut bufs.control_buf,
    );

    let state = STATE.init(State::new());
    let class = CdcAcmClass::new(&mut builder, state, MAX_PACKET as u16);
    let usb = builder.build();

    (usb, class)
}

/// Send one line if a host has the port open. Split into packet-sized chunks.
pub async fn write_line(serial: &mut UsbSerial, line: &str) {
    if !serial.dtr() {
        return;
    }
    for chunk in line.as_bytes().chunks(MAX_PACKET) {
        if serial.write_packet(chunk).await.is_err() {
            return;
        }
    }
}

/// Format into a fixed buffer and send. Lines that do not fit are cut.
pub async fn write_fmt(serial: &mut UsbSerial, args: core::fmt::Arguments<'_>) {
    let mut line = heapless::String::<128>::new();
    let _ = line.write_fmt(args);
    write_line(serial, &line).await;
}
