//! knob-firmware
//!
//! Gray-code rotary knob → USB HID keyboard firmware for the Raspberry Pi
//! Pico 2. Everything runs as futures joined on the single main task:
//!
//! 1. The USB runner services the device stack and answers remote-wakeup
//!    requests while the bus is suspended.
//! 2. The knob loop wakes every `poll_interval_ms`, samples the encoder
//!    and runs one [`ReportEmitter::tick`], which queues at most one
//!    press or release report.
//! 3. The HID writer drains the queued report to the IN endpoint; the
//!    HID reader answers class requests from the host.
//! 4. The LED loop blinks at a rate chosen by the USB lifecycle state.
//!
//! No future here blocks another: each one only awaits timers, the USB
//! peripheral or the report channel.

#![no_std]
#![no_main]

mod usb;

use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::join::{join, join3};
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_time::{Instant, Timer};
use embassy_usb::class::hid::{self, HidReaderWriter, State};
use embassy_usb::Builder;
use usbd_hid::descriptor::{KeyboardReport as HidKeyboardReport, SerializedDescriptor};
use {defmt_rtt as _, panic_probe as _};

use knob_hid::{EncoderPins, KnobConfig, KnobError, PollSchedule, ReportEmitter, TickOutcome};

use crate::usb::{
    with_status, KeyboardRequests, UsbLifecycle, UsbTransport, REMOTE_WAKEUP, REPORTS,
};

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// Wire the USB controller interrupt to Embassy's async handler.
bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

// ---------------------------------------------------------------------------
// USB identity
// ---------------------------------------------------------------------------

const USB_VID: u16 = 0xcafe;
const USB_PID: u16 = 0x4004;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("knob-firmware starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // ENC1 → GP5, ENC2 → GP2, ENC3 → GP4, ENC4 → GP3  (pull-ups, active-low)
    // LED  → GP25
    // ———————————————————————————————————————————————————————————————————————

    let mut pins = EncoderPins::new(
        Input::new(p.PIN_5, Pull::Up),
        Input::new(p.PIN_2, Pull::Up),
        Input::new(p.PIN_4, Pull::Up),
        Input::new(p.PIN_3, Pull::Up),
    );
    let mut led = Output::new(p.PIN_25, Level::Low);

    let knob_config = KnobConfig::default();

    // —— USB device ——————————————————————————————————————————————————————————

    let driver = Driver::new(p.USB, Irqs);

    let mut usb_config = embassy_usb::Config::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some("knob-hid");
    usb_config.product = Some("Gray-code knob");
    usb_config.serial_number = Some("00000001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;
    usb_config.supports_remote_wakeup = true;

    let mut config_descriptor = [0; 256];
    let mut bos_descriptor = [0; 256];
    let mut msos_descriptor = [0; 256];
    let mut control_buf = [0; 64];

    let mut lifecycle = UsbLifecycle::new();
    // One handler for control-pipe GET/SET_REPORT, one for the OUT endpoint.
    let mut control_handler = KeyboardRequests;
    let mut request_handler = KeyboardRequests;
    let mut hid_state = State::new();

    let mut builder = Builder::new(
        driver,
        usb_config,
        &mut config_descriptor,
        &mut bos_descriptor,
        &mut msos_descriptor,
        &mut control_buf,
    );
    builder.handler(&mut lifecycle);

    let hid_config = hid::Config {
        report_descriptor: HidKeyboardReport::desc(),
        request_handler: Some(&mut control_handler),
        poll_ms: knob_config.hid_poll_ms(),
        max_packet_size: 8,
    };
    let keyboard = HidReaderWriter::<_, 1, 8>::new(&mut builder, &mut hid_state, hid_config);

    let mut usb = builder.build();
    let (reader, mut writer) = keyboard.split();

    // —— Futures —————————————————————————————————————————————————————————————

    // Device runner. While suspended, a knob-requested wakeup resumes the bus.
    let usb_fut = async {
        loop {
            usb.run_until_suspend().await;
            REMOTE_WAKEUP.reset();
            match select(usb.wait_resume(), REMOTE_WAKEUP.wait()).await {
                Either::First(()) => {}
                Either::Second(()) => {
                    info!("requesting remote wakeup");
                    if let Err(e) = usb.remote_wakeup().await {
                        warn!("remote wakeup failed: {}", Debug2Format(&e));
                    }
                }
            }
        }
    };

    // Drains the one-slot report channel into the IN endpoint.
    let writer_fut = async {
        loop {
            let report = REPORTS.receive().await;
            if let Err(e) = writer.write_serialize(&report).await {
                warn!("HID write failed: {}", Debug2Format(&e));
            }
        }
    };

    let reader_fut = async {
        reader.run(false, &mut request_handler).await;
    };

    // Sampler → classifier → report emitter, once per poll interval.
    let knob_fut = async {
        let mut emitter = match ReportEmitter::start(&mut pins, knob_config) {
            Ok(emitter) => emitter,
            Err(KnobError::Pin(never)) => match never {},
        };
        let mut transport = UsbTransport;
        let mut schedule = PollSchedule::new(Instant::now(), knob_config.poll_interval());

        info!("knob started at position {}", emitter.previous().index());

        loop {
            Timer::at(schedule.next_due()).await;
            if !schedule.poll(Instant::now()) {
                continue;
            }

            match emitter.tick(&mut pins, &mut transport) {
                Ok(TickOutcome::Pressed(step)) => {
                    debug!("step {} (delta {})", step, emitter.last_delta());
                }
                Ok(_) => {}
                Err(KnobError::Pin(never)) => match never {},
            }
        }
    };

    // Activity LED: 250 ms unmounted, 1 s mounted, 2.5 s suspended.
    let led_fut = async {
        loop {
            let period = with_status(|s| s.blink_interval());
            Timer::after(period).await;
            led.toggle();
        }
    };

    info!("USB HID keyboard ready");
    join(
        join3(usb_fut, writer_fut, reader_fut),
        join(knob_fut, led_fut),
    )
    .await;
}
