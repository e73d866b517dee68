//! Four-pin encoder sampling.

use embedded_hal::digital::InputPin;

use crate::error::KnobError;
use crate::gray::Position;

/// Anything that can report the knob's current ring position.
///
/// [`EncoderPins`] is the hardware implementation; tests script their own.
pub trait PositionSource {
    /// Error produced by the underlying read.
    type Error;

    /// Read the current position. No side effects beyond the read.
    fn sample(&mut self) -> Result<Position, Self::Error>;
}

/// The four encoder contacts.
///
/// Pins are expected to be configured as inputs with pull-ups: an open
/// contact reads high, a closed one reads low. The sampler does not rate
/// limit itself; the caller decides the cadence.
pub struct EncoderPins<A, B, C, D> {
    pin1: A,
    pin2: B,
    pin3: C,
    pin4: D,
}

impl<A, B, C, D, E> EncoderPins<A, B, C, D>
where
    A: InputPin<Error = E>,
    B: InputPin<Error = E>,
    C: InputPin<Error = E>,
    D: InputPin<Error = E>,
{
    /// Take ownership of the four encoder inputs, pin 1 first.
    pub fn new(pin1: A, pin2: B, pin3: C, pin4: D) -> Self {
        Self {
            pin1,
            pin2,
            pin3,
            pin4,
        }
    }

    /// Pack the pin levels into a 4-bit code, pin 1 in bit 0.
    pub fn read_raw(&mut self) -> Result<u8, KnobError<E>> {
        let mut raw = 0u8;
        if self.pin1.is_high()? {
            raw |= 1 << 0;
        }
        if self.pin2.is_high()? {
            raw |= 1 << 1;
        }
        if self.pin3.is_high()? {
            raw |= 1 << 2;
        }
        if self.pin4.is_high()? {
            raw |= 1 << 3;
        }
        Ok(raw)
    }
}

impl<A, B, C, D, E> PositionSource for EncoderPins<A, B, C, D>
where
    A: InputPin<Error = E>,
    B: InputPin<Error = E>,
    C: InputPin<Error = E>,
    D: InputPin<Error = E>,
{
    type Error = KnobError<E>;

    fn sample(&mut self) -> Result<Position, Self::Error> {
        Ok(Position::decode(self.read_raw()?))
    }
}
