//! Gray-code position decoding and step classification.
//!
//! The knob is an absolute 16-position encoder with four contacts. Its
//! contacts are active-low, so the raw 4-bit code read from the pins is
//! the bitwise complement of a reflected Gray code. [`GRAY_TABLE`] undoes
//! both at once: indexing it with the raw pin code yields the ring
//! position `0..=15`, and neighbouring positions always differ by a
//! single contact.

/// Number of positions on the encoder ring.
pub const RING_SIZE: u8 = 16;

/// Half of the ring. A jump of exactly this many positions has no
/// defined direction.
const HALF_RING: i8 = (RING_SIZE / 2) as i8;

/// Raw pin code → ring position.
///
/// Index bit 0 is encoder pin 1, bit 3 is encoder pin 4; a set bit means
/// the pin reads high (contact open).
pub const GRAY_TABLE: [u8; RING_SIZE as usize] =
    [10, 11, 9, 8, 13, 12, 14, 15, 5, 4, 6, 7, 2, 3, 1, 0];

/// A decoded ring position in `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position(u8);

impl Position {
    /// Build a position from a ring index.
    ///
    /// Returns `None` if `index >= 16`.
    pub const fn new(index: u8) -> Option<Self> {
        if index < RING_SIZE {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Decode a raw 4-bit pin code through [`GRAY_TABLE`].
    ///
    /// Bits above bit 3 are ignored, so this is total over `u8`.
    pub const fn decode(raw: u8) -> Self {
        Self(GRAY_TABLE[(raw & 0x0F) as usize])
    }

    /// The ring index `0..=15`.
    pub const fn index(self) -> u8 {
        self.0
    }

    /// The position `steps` detents further clockwise, wrapping around the ring.
    pub const fn offset(self, steps: i8) -> Self {
        Self((self.0 as i16 + steps as i16).rem_euclid(RING_SIZE as i16) as u8)
    }
}

/// Signed number of detents moved from `prev` to `curr`.
///
/// The raw difference is folded onto the ring so the shorter way round
/// wins. A difference of exactly half the ring is ambiguous and yields
/// `0`, the same as no movement at all. The result is always in `-7..=7`.
///
/// # Examples
///
/// ```
/// use knob_hid::{classify, Position};
///
/// let p = |i| Position::new(i).unwrap();
/// assert_eq!(classify(p(15), p(0)), 1);
/// assert_eq!(classify(p(0), p(15)), -1);
/// assert_eq!(classify(p(0), p(8)), 0);
/// ```
pub fn classify(prev: Position, curr: Position) -> i8 {
    let diff = curr.0 as i8 - prev.0 as i8;

    if diff.abs() == HALF_RING {
        0
    } else if diff > HALF_RING {
        diff - RING_SIZE as i8
    } else if diff < -HALF_RING {
        diff + RING_SIZE as i8
    } else {
        diff
    }
}

/// Direction of one classified movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// No net movement (including the ambiguous half-ring jump).
    None,
    /// The ring position increased.
    Clockwise,
    /// The ring position decreased.
    CounterClockwise,
}

impl Step {
    /// Classify a folded delta by sign only.
    pub fn from_delta(delta: i8) -> Self {
        match delta {
            d if d > 0 => Step::Clockwise,
            d if d < 0 => Step::CounterClockwise,
            _ => Step::None,
        }
    }

    /// Returns `true` for [`Step::Clockwise`] and [`Step::CounterClockwise`].
    pub fn is_step(self) -> bool {
        self != Step::None
    }
}
