//! Closed vertical intervals with symbolic level markers.

use crate::extent::Extents;
use serde::{Deserialize, Serialize};

/// Level marker of the first vertical level.
pub const START: i32 = 0;
/// Level marker of the last vertical level.
pub const END: i32 = 1 << 20;

/// A closed vertical range `[lower_level+lower_offset, upper_level+upper_offset]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    lower_level: i32,
    upper_level: i32,
    lower_offset: i32,
    upper_offset: i32,
}

impl Interval {
    pub fn new(lower_level: i32, upper_level: i32) -> Self {
        Self::with_offsets(lower_level, upper_level, 0, 0)
    }

    /// Panics if the lower bound lies above the upper bound.
    pub fn with_offsets(
        lower_level: i32,
        upper_level: i32,
        lower_offset: i32,
        upper_offset: i32,
    ) -> Self {
        let interval = Interval {
            lower_level,
            upper_level,
            lower_offset,
            upper_offset,
        };
        assert!(
            interval.lower_bound() <= interval.upper_bound(),
            "inverted interval {interval}"
        );
        interval
    }

    pub fn lower_level(&self) -> i32 {
        self.lower_level
    }

    pub fn upper_level(&self) -> i32 {
        self.upper_level
    }

    pub fn lower_offset(&self) -> i32 {
        self.lower_offset
    }

    pub fn upper_offset(&self) -> i32 {
        self.upper_offset
    }

    pub fn lower_bound(&self) -> i32 {
        self.lower_level + self.lower_offset
    }

    pub fn upper_bound(&self) -> i32 {
        self.upper_level + self.upper_offset
    }

    /// Widens `self` to the smallest interval containing both operands.
    pub fn merge(&mut self, other: &Interval) {
        if other.lower_bound() < self.lower_bound() {
            self.lower_level = other.lower_level;
            self.lower_offset = other.lower_offset;
        }
        if other.upper_bound() > self.upper_bound() {
            self.upper_level = other.upper_level;
            self.upper_offset = other.upper_offset;
        }
    }

    /// Returns a copy whose bounds are shifted by the vertical components of
    /// `extents`.
    pub fn extend_interval(&self, extents: &Extents) -> Interval {
        let k = extents.vertical();
        Interval {
            lower_level: self.lower_level,
            upper_level: self.upper_level,
            lower_offset: self.lower_offset + k.minus,
            upper_offset: self.upper_offset + k.plus,
        }
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.lower_bound() <= other.lower_bound() && self.upper_bound() >= other.upper_bound()
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.lower_bound() <= other.upper_bound() && other.lower_bound() <= self.upper_bound()
    }
}

fn fmt_level(f: &mut std::fmt::Formatter<'_>, level: i32, offset: i32) -> std::fmt::Result {
    match level {
        START => write!(f, "start")?,
        END => write!(f, "end")?,
        other => write!(f, "{other}")?,
    }
    if offset > 0 {
        write!(f, "+{offset}")?;
    } else if offset < 0 {
        write!(f, "{offset}")?;
    }
    Ok(())
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ ")?;
        fmt_level(f, self.lower_level, self.lower_offset)?;
        write!(f, " : ")?;
        fmt_level(f, self.upper_level, self.upper_offset)?;
        write!(f, " }}")
    }
}
