//! Gray-code rotary knob decoder and HID keystroke emitter.
//!
//! This crate holds the hardware-independent core of the knob firmware:
//! a 4-pin absolute Gray-code encoder is sampled at a fixed cadence, each
//! detected detent becomes exactly one key press followed by exactly one
//! key release, and both reports are handed to a USB HID transport.
//!
//! # Architecture
//!
//! - **[`gray`]** — the fixed 16-entry lookup table, [`Position`] decoding
//!   and the signed [`classify`] fold.
//! - **[`sampler`]** — [`EncoderPins`], reading four `embedded-hal` inputs
//!   into a raw 4-bit code.
//! - **[`emitter`]** — the [`ReportEmitter`] press/release state machine.
//! - **[`schedule`]** — the drift-free [`PollSchedule`] gate.
//! - **[`status`]** — USB lifecycle events and the activity LED cadence.
//!
//! The USB stack itself lives outside this crate. It is reached through
//! the [`HidTransport`] trait and reports bus events through
//! [`UsbEvents`].
//!
//! # Quick start
//!
//! ```ignore
//! use knob_hid::{EncoderPins, KnobConfig, ReportEmitter};
//!
//! let mut pins = EncoderPins::new(enc1, enc2, enc3, enc4);
//! let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default())?;
//!
//! loop {
//!     // once every `poll_interval_ms`
//!     emitter.tick(&mut pins, &mut transport)?;
//! }
//! ```
//!
//! # Features
//!
//! - **`defmt`** — structured logging and [`defmt::Format`] derives for
//!   embedded targets.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod emitter;
pub mod error;
pub mod gray;
pub mod report;
pub mod sampler;
pub mod schedule;
pub mod status;

pub use config::{KeyBinding, KnobConfig};
pub use emitter::{EmitterState, ReportEmitter, TickOutcome};
pub use error::KnobError;
pub use gray::{classify, Position, Step, GRAY_TABLE};
pub use report::{HidTransport, KeyboardLeds, KeyboardReport, KEY_BACKSLASH, KEY_BRACKET_RIGHT, MAX_KEYS};
pub use sampler::{EncoderPins, PositionSource};
pub use schedule::PollSchedule;
pub use status::{DeviceState, UsbEvents, UsbStatus};
