use crate::{Error, Result, TimeUnit};

/// Bit-layout profile for the packed 64-bit ID.
///
/// An encoded ID holds three adjacent fields, most- to least-significant:
///
/// ```text
///  +-----------------+--------------+------------------+
///  | timestamp       | node         | counter          |
///  +-----------------+--------------+------------------+
///  |<-- grows up --->|<------ reserved low bits ------>|
/// ```
///
/// The layout fixes the time unit and how many low bits are reserved for the
/// node and counter fields together; the split between those two is chosen
/// later via [`Generator::set_node`]. The timestamp field occupies everything
/// above the reserved low bits and is written unmasked, so it grows with
/// wall-clock time until it eventually overflows into the sign bit. That
/// horizon is decades away for every built-in layout and is accepted rather
/// than checked.
///
/// [`Generator::set_node`]: crate::Generator::set_node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    time_unit: TimeUnit,
    total_usable_bits: u8,
    reserved_low_bits: u8,
    zero_node_reserved: bool,
    adjustable_timestamp: bool,
}

impl Layout {
    /// Second-resolution ticks with 21 low bits of node + counter space.
    ///
    /// The default layout: roughly 2M IDs per second with the full counter,
    /// and timestamp headroom far beyond the lifetime of the process.
    pub const SECONDS: Self = Self {
        time_unit: TimeUnit::Seconds,
        total_usable_bits: 63,
        reserved_low_bits: 21,
        zero_node_reserved: false,
        adjustable_timestamp: false,
    };

    /// Second-resolution ticks with 20 low bits of node + counter space.
    ///
    /// Trades half the per-tick capacity of [`Layout::SECONDS`] for one more
    /// bit of timestamp headroom.
    pub const SECONDS_COMPACT: Self = Self {
        time_unit: TimeUnit::Seconds,
        total_usable_bits: 63,
        reserved_low_bits: 20,
        zero_node_reserved: false,
        adjustable_timestamp: false,
    };

    /// Millisecond-resolution ticks capped at 53 usable bits, so every ID is
    /// exactly representable as an IEEE-754 double.
    ///
    /// Defaults to a 42-bit timestamp (11 low bits); the split can be moved
    /// with [`Generator::set_timestamp_bits`]. Node id 0 is reserved as an
    /// "unassigned" sentinel in this layout.
    ///
    /// [`Generator::set_timestamp_bits`]: crate::Generator::set_timestamp_bits
    pub const DOUBLE_SAFE: Self = Self {
        time_unit: TimeUnit::Millis,
        total_usable_bits: 53,
        reserved_low_bits: 11,
        zero_node_reserved: true,
        adjustable_timestamp: true,
    };

    /// Unit of one timestamp tick.
    pub const fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Upper bound on the bits an encoded ID may occupy before the accepted
    /// overflow horizon.
    pub const fn total_usable_bits(&self) -> u8 {
        self.total_usable_bits
    }

    /// Bits reserved below the timestamp field for node + counter.
    pub const fn reserved_low_bits(&self) -> u8 {
        self.reserved_low_bits
    }

    /// Width of the timestamp field.
    pub const fn timestamp_bits(&self) -> u8 {
        self.total_usable_bits - self.reserved_low_bits
    }

    /// Whether node id 0 is reserved as an "unassigned" sentinel.
    pub const fn zero_node_reserved(&self) -> bool {
        self.zero_node_reserved
    }

    /// Width of the counter field once `node_bits` are taken by the node.
    pub const fn counter_bits(&self, node_bits: u8) -> u8 {
        self.reserved_low_bits - node_bits
    }

    /// Maximum representable counter value for the given node width.
    pub const fn counter_mask(&self, node_bits: u8) -> u32 {
        (1 << self.counter_bits(node_bits)) - 1
    }

    /// Returns a copy of this layout with the timestamp field resized.
    ///
    /// Only [`Layout::DOUBLE_SAFE`] supports resizing, and only within
    /// 42..=43 bits.
    pub(crate) fn with_timestamp_bits(self, bits: u8) -> Result<Self> {
        if !self.adjustable_timestamp || !(42..=43).contains(&bits) {
            return Err(Error::InvalidTimestampBits { bits });
        }
        Ok(Self {
            reserved_low_bits: self.total_usable_bits - bits,
            ..self
        })
    }

    /// Packs a tick, node, and counter into an encoded ID.
    pub(crate) fn pack(&self, tick: i64, node: u32, node_bits: u8, counter: u32) -> i64 {
        let mut id = (tick << self.reserved_low_bits) | i64::from(counter);
        if node_bits > 0 {
            id |= i64::from(node) << self.counter_bits(node_bits);
        }
        id
    }

    /// Splits an encoded ID into its tick and counter fields.
    ///
    /// The tick is recovered with a plain shift rather than a mask; see the
    /// type-level docs for the overflow horizon this assumes.
    pub(crate) fn unpack(&self, id: i64, node_bits: u8) -> (i64, u32) {
        (
            id >> self.reserved_low_bits,
            (id as u32) & self.counter_mask(node_bits),
        )
    }
}
