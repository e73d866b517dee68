//! Error types for the knob core.

use core::fmt;

/// Errors that can occur while sampling the encoder.
///
/// Decoding and classification are total, so the only failure is the
/// pin read itself. On targets whose GPIO error type is
/// [`Infallible`](core::convert::Infallible) this can never be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnobError<E> {
    /// Reading one of the encoder input pins failed.
    Pin(E),
}

// Allow ergonomic `?` propagation from raw pin errors.
impl<E> From<E> for KnobError<E> {
    fn from(error: E) -> Self {
        KnobError::Pin(error)
    }
}

impl<E: fmt::Debug> fmt::Display for KnobError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KnobError::Pin(e) => write!(f, "encoder pin read failed: {:?}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for KnobError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            KnobError::Pin(e) => defmt::write!(f, "encoder pin read failed: {}", e),
        }
    }
}
