//! Knob configuration.

use embassy_time::Duration;

use crate::report::{KEY_BACKSLASH, KEY_BRACKET_RIGHT};

/// One key (plus modifiers) sent for a single detent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyBinding {
    /// HID modifier bit field (left ctrl = bit 0 … right GUI = bit 7).
    pub modifier: u8,
    /// HID keyboard usage ID.
    pub keycode: u8,
}

impl KeyBinding {
    /// A binding with no modifiers.
    pub const fn key(keycode: u8) -> Self {
        Self {
            modifier: 0,
            keycode,
        }
    }
}

/// Configuration for the sampler cadence and the emitted reports.
///
/// [`KnobConfig::default()`] reproduces the stock knob: a 10 ms cadence,
/// `\` for clockwise and `]` for counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KnobConfig {
    /// Sampling interval in milliseconds. Default: 10.
    ///
    /// Must be short enough that the knob cannot travel half the ring
    /// (8 detents) between two samples.
    pub poll_interval_ms: u64,
    /// HID report ID passed to the transport. `0` means the descriptor
    /// declares no report IDs. Default: 0.
    pub report_id: u8,
    /// Key sent when the ring position increases. Default: `\`.
    pub clockwise: KeyBinding,
    /// Key sent when the ring position decreases. Default: `]`.
    pub counter_clockwise: KeyBinding,
    /// Ask the host to resume on every tick while the bus is suspended.
    /// Default: `false`.
    pub wake_host_on_suspend: bool,
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            report_id: 0,
            clockwise: KeyBinding::key(KEY_BACKSLASH),
            counter_clockwise: KeyBinding::key(KEY_BRACKET_RIGHT),
            wake_host_on_suspend: false,
        }
    }
}

impl KnobConfig {
    /// The sampling interval as a timer duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The sampling interval as a HID endpoint polling interval
    /// (`bInterval`), saturating at 255 ms.
    pub fn hid_poll_ms(&self) -> u8 {
        u8::try_from(self.poll_interval_ms).unwrap_or(u8::MAX)
    }
}
