//! Per-device memo of probed parameter values.
//!
//! Each [`Axis`] keeps two disjoint ordered sets: values the device accepted and values it
//! rejected. A value moves between the sets only through [`ParamCache::promote`] and
//! [`ParamCache::demote`], so membership stays exclusive.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;

/// One independently negotiable stream parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Rate,
    Channels,
    Bits,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Rate, Axis::Channels, Axis::Bits];

    fn index(self) -> usize {
        match self {
            Axis::Rate => 0,
            Axis::Channels => 1,
            Axis::Bits => 2,
        }
    }

    /// Whether `value` may stand in for a rejected request on this axis.
    ///
    /// Only stereo and 16 bit samples are substitutes the rest of the pipeline can produce;
    /// any rate is acceptable.
    pub fn is_convertible(self, value: u32) -> bool {
        match self {
            Axis::Rate => true,
            Axis::Channels => value == 2,
            Axis::Bits => value == 16,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Rate => "rate",
            Axis::Channels => "channels",
            Axis::Bits => "bits",
        };
        f.write_str(name)
    }
}

/// What the cache knows about a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Support {
    Supported,
    Unsupported,
    Unknown,
}

/// Values assumed good before any probe has run.
pub const SEED_RATES: [u32; 2] = [44_100, 48_000];
pub const SEED_CHANNELS: [u32; 1] = [2];
pub const SEED_BITS: [u32; 1] = [16];

#[derive(Clone, Debug, Default)]
struct AxisSets {
    supported: BTreeSet<u32>,
    unsupported: BTreeSet<u32>,
}

/// Supported/unsupported history for one device instance.
#[derive(Clone, Debug)]
pub struct ParamCache {
    axes: [AxisSets; 3],
}

impl ParamCache {
    /// A cache with no history at all.
    pub fn empty() -> Self {
        Self {
            axes: Default::default(),
        }
    }

    /// A cache seeded with the conservative defaults most devices accept.
    pub fn new() -> Self {
        let mut cache = Self::empty();
        for rate in SEED_RATES {
            cache.promote(Axis::Rate, rate);
        }
        for channels in SEED_CHANNELS {
            cache.promote(Axis::Channels, channels);
        }
        for bits in SEED_BITS {
            cache.promote(Axis::Bits, bits);
        }
        cache
    }

    fn sets(&self, axis: Axis) -> &AxisSets {
        &self.axes[axis.index()]
    }

    fn sets_mut(&mut self, axis: Axis) -> &mut AxisSets {
        &mut self.axes[axis.index()]
    }

    pub fn classify(&self, axis: Axis, value: u32) -> Support {
        let sets = self.sets(axis);
        if sets.supported.contains(&value) {
            Support::Supported
        } else if sets.unsupported.contains(&value) {
            Support::Unsupported
        } else {
            Support::Unknown
        }
    }

    /// Record `value` as accepted by the device.
    pub fn promote(&mut self, axis: Axis, value: u32) {
        let sets = self.sets_mut(axis);
        sets.unsupported.remove(&value);
        sets.supported.insert(value);
    }

    /// Record `value` as rejected by the device.
    pub fn demote(&mut self, axis: Axis, value: u32) {
        let sets = self.sets_mut(axis);
        sets.supported.remove(&value);
        sets.unsupported.insert(value);
    }

    /// Known-good values in ascending order.
    pub fn supported(&self, axis: Axis) -> impl Iterator<Item = u32> + '_ {
        self.sets(axis).supported.iter().copied()
    }

    #[cfg(test)]
    fn unsupported(&self, axis: Axis) -> impl Iterator<Item = u32> + '_ {
        self.sets(axis).unsupported.iter().copied()
    }

    /// The supported, convertible value closest to `desired`.
    ///
    /// Ties go to the higher value.
    pub fn nearest_convertible(&self, axis: Axis, desired: u32) -> Option<u32> {
        self.supported(axis)
            .filter(|&value| axis.is_convertible(value))
            .min_by_key(|&value| (value.abs_diff(desired), Reverse(value)))
    }
}

impl Default for ParamCache {
    fn default() -> Self {
        Self::new()
    }
}
