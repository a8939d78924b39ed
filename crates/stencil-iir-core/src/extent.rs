//! Access extents: bounded relative offset ranges along the three grid axes.
//!
//! An [`Extents`] value answers "how far away from its own grid point does a
//! statement touch this location". Extents form a join-semilattice under
//! [`Extents::merge`], which is the only way accumulated extents ever change.

use serde::{Deserialize, Serialize};

/// Grid dimension. `K` is the vertical (center) dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    I = 0,
    J = 1,
    K = 2,
}

/// Offset range along one axis, `minus <= plus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub minus: i32,
    pub plus: i32,
}

impl Extent {
    /// Panics if `minus > plus`; an inverted range is a construction bug.
    pub fn new(minus: i32, plus: i32) -> Self {
        assert!(
            minus <= plus,
            "inverted extent: minus ({minus}) > plus ({plus})"
        );
        Extent { minus, plus }
    }

    /// Extent of a single access at `offset`.
    pub fn point(offset: i32) -> Self {
        Extent {
            minus: offset,
            plus: offset,
        }
    }

    pub fn merge(&mut self, other: &Extent) {
        self.minus = self.minus.min(other.minus);
        self.plus = self.plus.max(other.plus);
    }

    /// Widens the range so that it contains offset zero.
    pub fn add_center(&mut self) {
        self.minus = self.minus.min(0);
        self.plus = self.plus.max(0);
    }

    pub fn contains(&self, other: &Extent) -> bool {
        self.minus <= other.minus && self.plus >= other.plus
    }

    pub fn is_pointwise(&self) -> bool {
        self.minus == 0 && self.plus == 0
    }
}

/// Extents along the `i`, `j` and `k` axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extents {
    dims: [Extent; 3],
}

impl Extents {
    /// Builds extents from `(minus, plus)` pairs for `i`, `j` and `k`.
    ///
    /// Panics if any pair is inverted.
    pub fn new(i: (i32, i32), j: (i32, i32), k: (i32, i32)) -> Self {
        Extents {
            dims: [
                Extent::new(i.0, i.1),
                Extent::new(j.0, j.1),
                Extent::new(k.0, k.1),
            ],
        }
    }

    /// The center point: no offset in any direction.
    pub fn zero() -> Self {
        Extents::from_offset([0, 0, 0])
    }

    /// Extents of a single access at a relative grid offset.
    pub fn from_offset(offset: [i32; 3]) -> Self {
        Extents {
            dims: offset.map(Extent::point),
        }
    }

    pub fn dim(&self, dim: Dim) -> &Extent {
        &self.dims[dim as usize]
    }

    pub fn vertical(&self) -> &Extent {
        self.dim(Dim::K)
    }

    /// Component-wise envelope of both extents.
    pub fn merge(&mut self, other: &Extents) {
        for (mine, theirs) in self.dims.iter_mut().zip(other.dims.iter()) {
            mine.merge(theirs);
        }
    }

    /// Returns the envelope without modifying either operand.
    pub fn merged(mut self, other: &Extents) -> Extents {
        self.merge(other);
        self
    }

    /// Includes the center point along `dim`.
    pub fn add_center(&mut self, dim: Dim) {
        self.dims[dim as usize].add_center();
    }

    /// Shifts every range by a constant offset (a call-site offset folded
    /// into the accesses of a stencil-function body).
    pub fn shift(&mut self, offset: [i32; 3]) {
        for (extent, delta) in self.dims.iter_mut().zip(offset) {
            extent.minus += delta;
            extent.plus += delta;
        }
    }

    pub fn contains(&self, other: &Extents) -> bool {
        self.dims
            .iter()
            .zip(other.dims.iter())
            .all(|(mine, theirs)| mine.contains(theirs))
    }

    pub fn is_pointwise(&self) -> bool {
        self.dims.iter().all(Extent::is_pointwise)
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Extents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [i, j, k] = &self.dims;
        write!(
            f,
            "[({}, {}), ({}, {}), ({}, {})]",
            i.minus, i.plus, j.minus, j.plus, k.minus, k.plus
        )
    }
}
