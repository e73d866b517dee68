//! Glue between the knob core and `embassy-usb`.
//!
//! - [`UsbLifecycle`] forwards device-level bus events into the shared
//!   [`UsbStatus`].
//! - [`KeyboardRequests`] answers HID class control requests.
//! - [`UsbTransport`] implements [`HidTransport`] on top of a one-slot
//!   report channel drained by the HID writer future in `main`.

use core::cell::RefCell;

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{ReportId, RequestHandler};
use embassy_usb::control::OutResponse;
use embassy_usb::Handler;
use usbd_hid::descriptor::KeyboardReport as HidKeyboardReport;

use knob_hid::{HidTransport, KeyboardLeds, UsbEvents, UsbStatus, MAX_KEYS};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Bus lifecycle, written by [`UsbLifecycle`], read by the knob and LED loops.
pub static USB_STATUS: BlockingMutex<CriticalSectionRawMutex, RefCell<UsbStatus>> =
    BlockingMutex::new(RefCell::new(UsbStatus::new()));

/// Reports waiting for the HID IN endpoint. One slot: a full channel means
/// the previous report has not been picked up yet.
pub static REPORTS: Channel<CriticalSectionRawMutex, HidKeyboardReport, 1> = Channel::new();

/// Raised by the knob loop to ask the USB runner for a remote wakeup.
pub static REMOTE_WAKEUP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Run `f` against the shared [`UsbStatus`].
pub fn with_status<R>(f: impl FnOnce(&mut UsbStatus) -> R) -> R {
    USB_STATUS.lock(|status| f(&mut *status.borrow_mut()))
}

// ---------------------------------------------------------------------------
// Device lifecycle
// ---------------------------------------------------------------------------

/// Device-level event handler registered with the USB builder.
///
/// Only touches [`USB_STATUS`]; the knob decoder is out of its reach.
pub struct UsbLifecycle {
    remote_wakeup_enabled: bool,
}

impl UsbLifecycle {
    pub const fn new() -> Self {
        Self {
            remote_wakeup_enabled: false,
        }
    }
}

impl Handler for UsbLifecycle {
    fn enabled(&mut self, enabled: bool) {
        if !enabled {
            info!("USB disabled");
            with_status(|s| s.on_unmount());
        }
    }

    fn reset(&mut self) {
        debug!("USB bus reset");
        self.remote_wakeup_enabled = false;
        with_status(|s| s.on_unmount());
    }

    fn configured(&mut self, configured: bool) {
        if configured {
            info!("USB mounted");
            with_status(|s| s.on_mount());
        } else {
            info!("USB unmounted");
            with_status(|s| s.on_unmount());
        }
    }

    fn suspended(&mut self, suspended: bool) {
        if suspended {
            info!("USB suspended (remote wakeup {})", self.remote_wakeup_enabled);
            let enabled = self.remote_wakeup_enabled;
            with_status(|s| s.on_suspend(enabled));
        } else {
            info!("USB resumed");
            with_status(|s| s.on_resume());
        }
    }

    fn remote_wakeup_enabled(&mut self, enabled: bool) {
        self.remote_wakeup_enabled = enabled;
    }
}

// ---------------------------------------------------------------------------
// HID class requests
// ---------------------------------------------------------------------------

/// HID class request handler for the keyboard interface.
///
/// Registered twice: once in the class config for control-pipe
/// GET_REPORT/SET_REPORT, once with the reader for the OUT endpoint.
pub struct KeyboardRequests;

impl RequestHandler for KeyboardRequests {
    // Nothing to report on demand; `None` stalls the request.
    fn get_report(&mut self, id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        debug!("GET_REPORT {} ignored", Debug2Format(&id));
        None
    }

    // The host writes the keyboard LED state (num/caps/scroll lock) here.
    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        match KeyboardLeds::from_report(data) {
            Some(leds) => {
                info!(
                    "SET_REPORT {}: num={} caps={} scroll={}",
                    Debug2Format(&id),
                    leds.num_lock(),
                    leds.caps_lock(),
                    leds.scroll_lock()
                );
                OutResponse::Accepted
            }
            None => {
                warn!("SET_REPORT {} with empty payload", Debug2Format(&id));
                OutResponse::Rejected
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// [`HidTransport`] backed by [`REPORTS`], [`USB_STATUS`] and [`REMOTE_WAKEUP`].
pub struct UsbTransport;

impl HidTransport for UsbTransport {
    fn is_ready(&self) -> bool {
        with_status(|s| s.is_mounted()) && !REPORTS.is_full()
    }

    fn send_keyboard_report(&mut self, report_id: u8, modifier: u8, keycodes: [u8; MAX_KEYS]) {
        // The boot keyboard descriptor declares no report IDs.
        if report_id != 0 {
            warn!("report id {} not in descriptor, sending without it", report_id);
        }

        let report = HidKeyboardReport {
            modifier,
            reserved: 0,
            leds: 0,
            keycodes,
        };

        if REPORTS.try_send(report).is_err() {
            warn!("HID report slot busy, report dropped");
        }
    }

    fn is_suspended(&self) -> bool {
        with_status(|s| s.is_suspended())
    }

    fn remote_wakeup(&mut self) {
        if with_status(|s| s.remote_wakeup_enabled()) {
            REMOTE_WAKEUP.signal(());
        }
    }
}
