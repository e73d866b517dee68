//! Boot-keyboard report layout and the transport contract.
//!
//! The USB stack is not part of this crate. The emitter only needs to
//! know whether the HID endpoint can take a report and how to hand one
//! over; [`HidTransport`] captures exactly that.

use crate::config::KeyBinding;

/// HID usage for `\` and `|` (US layout).
pub const KEY_BACKSLASH: u8 = 0x31;

/// HID usage for `]` and `}` (US layout).
pub const KEY_BRACKET_RIGHT: u8 = 0x30;

/// Maximum number of simultaneous keys in a boot keyboard report.
pub const MAX_KEYS: usize = 6;

/// One boot-protocol keyboard input report (the reserved byte is omitted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier bit field.
    pub modifier: u8,
    /// Pressed key usages; unused slots are `0`.
    pub keycodes: [u8; MAX_KEYS],
}

impl KeyboardReport {
    /// A report with a single key held down.
    pub const fn press(binding: KeyBinding) -> Self {
        let mut keycodes = [0u8; MAX_KEYS];
        keycodes[0] = binding.keycode;
        Self {
            modifier: binding.modifier,
            keycodes,
        }
    }

    /// The all-keys-released report.
    pub const fn release() -> Self {
        Self {
            modifier: 0,
            keycodes: [0; MAX_KEYS],
        }
    }

    /// Returns `true` if no key and no modifier is held.
    pub fn is_release(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }
}

/// Host-side lock LEDs, as written by a keyboard output report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardLeds(u8);

impl KeyboardLeds {
    /// Parse a SET_REPORT / OUT payload. The LED byte is the first byte;
    /// an empty payload yields `None`.
    pub fn from_report(data: &[u8]) -> Option<Self> {
        data.first().map(|&bits| Self(bits))
    }

    pub fn num_lock(self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn caps_lock(self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn scroll_lock(self) -> bool {
        self.0 & 0x04 != 0
    }
}

/// The USB HID keyboard endpoint as seen from the knob core.
///
/// Implementations must not block: [`send_keyboard_report`] is
/// fire-and-forget and is only ever called right after [`is_ready`]
/// returned `true`.
///
/// [`send_keyboard_report`]: HidTransport::send_keyboard_report
/// [`is_ready`]: HidTransport::is_ready
pub trait HidTransport {
    /// Whether the endpoint can accept a report right now.
    fn is_ready(&self) -> bool;

    /// Queue one keyboard report. All-zero `keycodes` means "all released".
    fn send_keyboard_report(&mut self, report_id: u8, modifier: u8, keycodes: [u8; MAX_KEYS]);

    /// Whether the bus is currently suspended by the host.
    fn is_suspended(&self) -> bool {
        false
    }

    /// Ask the host to resume the bus. Only honoured if the host enabled
    /// remote wakeup.
    fn remote_wakeup(&mut self) {}
}
