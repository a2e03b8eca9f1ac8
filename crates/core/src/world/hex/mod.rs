//! This module holds the hex lattice that everything else is placed on.
//!
//! ## Coordinate Systems
//!
//! ### Block space
//!
//! Block space is the voxel world itself, seen from above. A
//! [CartesianPoint] is `(x, z)` in blocks. Height never appears here; it is
//! the *output* of generation.
//!
//! ### Lattice space
//!
//! A lattice is a grid of flat-sided hexagons of height `h` (distance between
//! opposite sides) laid over block space. Cells are addressed by
//! [AxialCoord] `(q, r)`. `q` runs along `x`, and every step in `q` shifts the
//! cell half a cell up in `z`. Cell centers are:
//!
//! ```text
//! x = q * w
//! z = r * h - h * q / 2     (integer division, truncated towards zero)
//! ```
//!
//! where `w = round(h * sqrt(3) / 2)`. Under this convention the six
//! neighbors of a cell are at offsets `(0,-1) (1,0) (1,1) (0,1) (-1,0)
//! (-1,-1)`, in that angular order.
//!
//! Two lattices are used: a coarse one whose cells are drainage basins, and a
//! fine one whose cells are river nodes. They differ only in cell size and in
//! the salt of their random stream.
//!
//! ### Jitter
//!
//! A perfect lattice makes for very straight rivers, so every cell's center is
//! displaced into a *site* by a per-cell RNG. The displacement stays inside
//! the fan of triangles between the cell and its neighbors, so the sites still
//! form a valid planar subdivision and point location only ever needs to look
//! at the 19 closest cells.

mod triangle;
mod unit;

pub use self::{triangle::*, unit::*};
use crate::config::Seed;
use rand::Rng;

/// Maximum jitter, as a fraction of the sector triangle around a cell center
const JITTER: f32 = 0.7;

/// Slack for f32 rounding when checking that a point is inside a triangle
const WEIGHT_TOLERANCE: f32 = 1e-4;

/// Number of entries in the neighbor table: the cell itself, the 6 cells of
/// ring 1 and the 12 cells of ring 2
pub const NEIGHBORHOOD_SIZE: usize = 19;

/// Axial offsets of the neighborhood. Index 0 is the cell itself, 1..=6 is
/// ring 1 in angular order, 7..=18 is ring 2.
///
/// ```text
///        -2,-2 -1,-2 +0,-2
///     -2,-1 -1,-1 +0,-1 +1,-1
///  -2,+0 -1,+0 +0,+0 +1,+0 +2,+0
///     -1,+1 +0,+1 +1,+1 +2,+1
///        +0,+2 +1,+2 +2,+2
/// ```
const NEIGHBOR_OFFSETS: [AxialCoord; NEIGHBORHOOD_SIZE] = [
    AxialCoord::new(0, 0),
    AxialCoord::new(0, -1),
    AxialCoord::new(1, 0),
    AxialCoord::new(1, 1),
    AxialCoord::new(0, 1),
    AxialCoord::new(-1, 0),
    AxialCoord::new(-1, -1),
    AxialCoord::new(0, -2),
    AxialCoord::new(1, -1),
    AxialCoord::new(2, 0),
    AxialCoord::new(2, 1),
    AxialCoord::new(2, 2),
    AxialCoord::new(1, 2),
    AxialCoord::new(0, 2),
    AxialCoord::new(-1, 1),
    AxialCoord::new(-2, 0),
    AxialCoord::new(-2, -1),
    AxialCoord::new(-2, -2),
    AxialCoord::new(-1, -2),
];

/// A seeded hex lattice. Immutable once built; cheap to share.
#[derive(Clone, Debug)]
pub struct HexGrid {
    cell_height: i32,
    cell_width: i32,
    /// Separates this lattice's jitter stream from other lattices
    salt: u32,
    /// Offsets (in block space) from a cell center to the doubled centroid of
    /// each of the 6 triangles around it. Sector `i` lies between ring-1
    /// neighbors `i` and `i + 1`.
    sector_offsets: [CartesianPoint; 6],
}

impl HexGrid {
    pub fn new(cell_height: i32, salt: u32) -> Self {
        assert!(cell_height > 1, "cell height {} is too small", cell_height);
        let cell_width =
            (3.0f64.sqrt() * 0.5 * cell_height as f64).round() as i32;
        let mut grid = Self {
            cell_height,
            cell_width,
            salt,
            sector_offsets: [CartesianPoint::ORIGIN; 6],
        };
        for i in 0..6 {
            let a = grid.axial_to_cartesian(NEIGHBOR_OFFSETS[1 + i]);
            let b = grid.axial_to_cartesian(NEIGHBOR_OFFSETS[1 + (i + 1) % 6]);
            grid.sector_offsets[i] = a + b;
        }
        grid
    }

    pub fn cell_height(&self) -> i32 {
        self.cell_height
    }

    pub fn cell_width(&self) -> i32 {
        self.cell_width
    }

    /// The fixed neighborhood table. See [NEIGHBORHOOD_SIZE] for layout.
    pub fn neighbors(&self) -> &'static [AxialCoord; NEIGHBORHOOD_SIZE] {
        &NEIGHBOR_OFFSETS
    }

    /// The 6 cells directly adjacent to `coord`, in angular order
    pub fn adjacents(
        &self,
        coord: AxialCoord,
    ) -> impl Iterator<Item = AxialCoord> {
        NEIGHBOR_OFFSETS[1..7].iter().map(move |offset| coord + *offset)
    }

    /// `coord` plus its 18 closest cells, in table order
    pub fn neighborhood(
        &self,
        coord: AxialCoord,
    ) -> impl Iterator<Item = AxialCoord> {
        NEIGHBOR_OFFSETS.iter().map(move |offset| coord + *offset)
    }

    /// Exact (unjittered) center of a cell
    pub fn axial_to_cartesian(&self, coord: AxialCoord) -> CartesianPoint {
        CartesianPoint::new(
            coord.q * self.cell_width,
            coord.r * self.cell_height - self.cell_height * coord.q / 2,
        )
    }

    /// The cell whose hexagon contains `point`. Uses Chris Cox's conversion,
    /// see <https://www.redblobgames.com/grids/hexagons/more-pixel-to-hex.html>
    pub fn cartesian_to_axial(&self, point: CartesianPoint) -> AxialCoord {
        let y = point.z as f64 / self.cell_height as f64;
        let x = point.x as f64 / self.cell_width as f64 * 1.5 + 1.0;
        let aux = (x + y).floor();
        let q = ((aux + x - y) / 3.0).floor() as i32;
        let r = ((aux + 2.0 * y + 1.0) / 3.0).floor() as i32;
        AxialCoord::new(q, r)
    }

    /// The jittered site of a cell. Deterministic in `(seed, coord)`.
    pub fn jittered_site(
        &self,
        seed: Seed,
        coord: AxialCoord,
    ) -> CartesianPoint {
        let mut rng = seed.rng_at(self.salt, coord.q, coord.r);
        let sector = rng.gen_range(0..6);
        let a = self.sector_offsets[sector];
        let b = self.sector_offsets[(sector + 1) % 6];
        let mut u = rng.gen::<f32>() * JITTER;
        let mut v = rng.gen::<f32>() * JITTER;
        // Fold points past the far edge back into the sector triangle
        let overshoot = u + v - JITTER;
        if overshoot > 0.0 {
            u -= overshoot;
            v -= overshoot;
        }
        let center = self.axial_to_cartesian(coord);
        CartesianPoint::new(
            center.x + ((u * a.x as f32 + v * b.x as f32) / 3.0) as i32,
            center.z + ((u * a.z as f32 + v * b.z as f32) / 3.0) as i32,
        )
    }

    /// The cell whose jittered site is closest to `point`, along with the
    /// squared distance to that site. Only the containing cell and its ring-1
    /// neighbors are candidates. Ties go to the earlier cell in table order.
    pub fn closest_site(
        &self,
        seed: Seed,
        point: CartesianPoint,
    ) -> (i64, AxialCoord) {
        let center = self.cartesian_to_axial(point);
        let mut best = (i64::MAX, center);
        for coord in self.neighborhood(center).take(7) {
            let distance =
                self.jittered_site(seed, coord).distance_squared(point);
            if distance < best.0 {
                best = (distance, coord);
            }
        }
        best
    }

    /// Find the triangle of jittered sites containing `point`, and the
    /// barycentric weights of `point` within it.
    ///
    /// The containing cell's fan of triangles is tried first. Jitter can
    /// push a point past the far edge of that fan, in which case its
    /// triangle belongs to the fan of a ring-1 neighbor, tried closest site
    /// first.
    ///
    /// Panics if a triangle found is degenerate. That can only happen if
    /// jitter moved sites outside their sectors, which would be a bug.
    pub fn locate(
        &self,
        seed: Seed,
        point: CartesianPoint,
    ) -> BarycentricTriangle {
        let center = self.cartesian_to_axial(point);
        let triangle = self.fan_triangle(seed, center, point);
        if triangle.min() >= -WEIGHT_TOLERANCE {
            return triangle;
        }

        let mut neighbors: Vec<(i64, AxialCoord)> = self
            .adjacents(center)
            .map(|coord| {
                let site = self.jittered_site(seed, coord);
                (site.distance_squared(point), coord)
            })
            .collect();
        neighbors.sort_unstable();
        let mut best = triangle;
        for (_, neighbor) in neighbors {
            let candidate = self.fan_triangle(seed, neighbor, point);
            if candidate.min() >= -WEIGHT_TOLERANCE {
                return candidate;
            }
            if candidate.min() > best.min() {
                best = candidate;
            }
        }
        best
    }

    /// Fan scan around one cell: starting from the last ring-1 neighbor,
    /// step around the ring until the point falls between two consecutive
    /// neighbors. The point may still be beyond the triangle's far edge.
    fn fan_triangle(
        &self,
        seed: Seed,
        center: AxialCoord,
        point: CartesianPoint,
    ) -> BarycentricTriangle {
        let center_site = self.jittered_site(seed, center);
        let point = point - center_site;

        let mut prev = center + NEIGHBOR_OFFSETS[6];
        let mut prev_site = self.jittered_site(seed, prev) - center_site;
        let mut prev_area = prev_site.cross(point);
        let mut current = prev;
        let mut current_site = prev_site;
        let mut area = prev_area;
        for offset in &NEIGHBOR_OFFSETS[1..7] {
            current = center + *offset;
            current_site = self.jittered_site(seed, current) - center_site;
            area = current_site.cross(point);
            if prev_area <= 0 && area >= 0 {
                break;
            }
            prev = current;
            prev_site = current_site;
            prev_area = area;
        }

        let denominator = current_site.cross(prev_site);
        assert!(
            denominator != 0,
            "degenerate triangle {} {} {} while locating {}",
            current,
            prev,
            center,
            point + center_site,
        );
        let a = -prev_area as f32 / denominator as f32;
        let b = area as f32 / denominator as f32;
        BarycentricTriangle::new([current, prev, center], [a, b, 1.0 - a - b])
    }
}
