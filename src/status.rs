//! USB lifecycle tracking and the activity LED cadence.
//!
//! The USB stack reports bus events through [`UsbEvents`]. The resulting
//! [`UsbStatus`] drives presentation only (the blink rate of the on-board
//! LED) and whether the HID endpoint may be used. It holds no reference
//! to the knob decoder, so a bus event can never disturb a press/release
//! cycle in flight.

use embassy_time::Duration;

/// LED half-period while the device is not mounted.
pub const BLINK_NOT_MOUNTED: Duration = Duration::from_millis(250);

/// LED half-period while the device is mounted and running.
pub const BLINK_MOUNTED: Duration = Duration::from_millis(1000);

/// LED half-period while the bus is suspended.
pub const BLINK_SUSPENDED: Duration = Duration::from_millis(2500);

/// Notifications raised by the USB device stack.
pub trait UsbEvents {
    /// The host selected a configuration.
    fn on_mount(&mut self);

    /// The configuration was removed or the device was reset/detached.
    fn on_unmount(&mut self);

    /// The bus was suspended. `remote_wakeup_enabled` tells whether the
    /// host allows the device to request a resume.
    fn on_suspend(&mut self, remote_wakeup_enabled: bool);

    /// The bus resumed from suspend.
    fn on_resume(&mut self);
}

/// Coarse device state as seen from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Not configured by a host.
    #[default]
    NotMounted,
    /// Configured and active.
    Mounted,
    /// Suspended by the host.
    Suspended,
}

/// Current USB lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbStatus {
    state: DeviceState,
    /// State to return to on resume.
    before_suspend: DeviceState,
    remote_wakeup_enabled: bool,
}

impl UsbStatus {
    /// A device that has not been mounted yet.
    pub const fn new() -> Self {
        Self {
            state: DeviceState::NotMounted,
            before_suspend: DeviceState::NotMounted,
            remote_wakeup_enabled: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Configured and not suspended, i.e. the HID endpoint may be used.
    pub fn is_mounted(&self) -> bool {
        self.state == DeviceState::Mounted
    }

    /// Suspended by the host.
    pub fn is_suspended(&self) -> bool {
        self.state == DeviceState::Suspended
    }

    /// Whether the host allowed remote wakeup at the last suspend.
    pub fn remote_wakeup_enabled(&self) -> bool {
        self.remote_wakeup_enabled
    }

    /// How long the activity LED stays in each state before toggling.
    pub fn blink_interval(&self) -> Duration {
        match self.state {
            DeviceState::NotMounted => BLINK_NOT_MOUNTED,
            DeviceState::Mounted => BLINK_MOUNTED,
            DeviceState::Suspended => BLINK_SUSPENDED,
        }
    }
}

impl UsbEvents for UsbStatus {
    fn on_mount(&mut self) {
        self.state = DeviceState::Mounted;
    }

    fn on_unmount(&mut self) {
        self.state = DeviceState::NotMounted;
        self.remote_wakeup_enabled = false;
    }

    fn on_suspend(&mut self, remote_wakeup_enabled: bool) {
        if self.state != DeviceState::Suspended {
            self.before_suspend = self.state;
        }
        self.state = DeviceState::Suspended;
        self.remote_wakeup_enabled = remote_wakeup_enabled;
    }

    fn on_resume(&mut self) {
        if self.state == DeviceState::Suspended {
            self.state = self.before_suspend;
        }
    }
}
