//! Basic coordinate types for the hex lattices and the block world they are
//! laid over. See the parent module for how the two spaces relate.

use crate::util;
use derive_more::{Add, AddAssign, Display, Sub, SubAssign};
use fnv::FnvBuildHasher;
use std::collections::{HashMap, HashSet};

/// A cell of a hex lattice, in axial coordinates. The same type is used for
/// both the basin lattice and the river lattice; which one a coordinate
/// belongs to is determined by the [HexGrid](super::HexGrid) it came from.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    serde::Serialize,
    serde::Deserialize,
)]
#[display(fmt = "<{}, {}>", q, r)]
pub struct AxialCoord {
    pub q: i32,
    pub r: i32,
}

impl AxialCoord {
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }
}

/// A point in the block world. `x` and `z` are the horizontal axes; height
/// is never part of a point.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    serde::Serialize,
    serde::Deserialize,
)]
#[display(fmt = "({}, {})", x, z)]
pub struct CartesianPoint {
    pub x: i32,
    pub z: i32,
}

impl CartesianPoint {
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Point halfway between two points, truncated towards zero on each axis
    pub fn midpoint(self, other: Self) -> Self {
        Self::new(
            util::midpoint(self.x, other.x),
            util::midpoint(self.z, other.z),
        )
    }

    /// Squared euclidean distance between two points. Computed in `i64` so
    /// basin-scale distances can't overflow.
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    /// 2D cross product `self.z * other.x - self.x * other.z`, which is the
    /// (doubled) signed area of the triangle `(origin, self, other)`
    pub fn cross(self, other: Self) -> i64 {
        self.z as i64 * other.x as i64 - self.x as i64 * other.z as i64
    }
}

/// A half-open rectangle in block space: `[x1, x2) x [z1, z2)`
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[display(fmt = "[{}..{}, {}..{}]", x1, x2, z1, z2)]
pub struct Rect {
    pub x1: i32,
    pub z1: i32,
    pub x2: i32,
    pub z2: i32,
}

impl Rect {
    pub const fn new(x1: i32, z1: i32, x2: i32, z2: i32) -> Self {
        Self { x1, z1, x2, z2 }
    }

    /// Rectangle from a corner plus a size
    pub const fn with_size(x: i32, z: i32, width: i32, depth: i32) -> Self {
        Self::new(x, z, x + width, z + depth)
    }

    /// Smallest rectangle containing every given point
    pub fn bounding(points: &[CartesianPoint]) -> Self {
        let mut rect = Self::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for point in points {
            rect.x1 = rect.x1.min(point.x);
            rect.z1 = rect.z1.min(point.z);
            // Bounds are exclusive
            rect.x2 = rect.x2.max(point.x + 1);
            rect.z2 = rect.z2.max(point.z + 1);
        }
        rect
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn depth(&self) -> i32 {
        self.z2 - self.z1
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        self.x1 <= x && x < self.x2 && self.z1 <= z && z < self.z2
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x1 < other.x2
            && other.x1 < self.x2
            && self.z1 < other.z2
            && other.z1 < self.z2
    }
}

/// A set of lattice coordinates
pub type AxialCoordSet = HashSet<AxialCoord, FnvBuildHasher>;
/// A map of lattice coordinates to some `T`
pub type AxialCoordMap<T> = HashMap<AxialCoord, T, FnvBuildHasher>;
/// An ORDERED map of lattice coordinates to some `T`. Iteration follows
/// insertion order, which the drainage generator relies on.
pub type AxialCoordIndexMap<T> =
    indexmap::IndexMap<AxialCoord, T, FnvBuildHasher>;
