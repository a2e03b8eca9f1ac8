//! Turning drainage segments into a height field.
//!
//! Rendering a region happens in two steps:
//! 1. Every river segment near the region is rasterized into a buffer, each
//!    pixel keeping the smallest depth drawn onto it. Everything else starts
//!    at infinity.
//! 2. A distance transform propagates, to every pixel, the offset of the
//!    source pixel that minimizes `distance + depth`.
//!
//! The terrain height of a column is then the [SlopeProfile] evaluated at that
//! minimum. Big rivers have small depths, so their valleys spread wider.

mod edt;
mod raster;
mod slope;
#[cfg(feature = "svg")]
pub mod svg;

pub use self::{
    edt::squared_distance_transform,
    slope::{SlopeProfile, SlopeSegment},
};
use crate::world::{
    basin::DrainageSegment,
    hex::{CartesianPoint, Rect},
};

/// One pixel of the transform's output
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransformCell {
    /// Offset from this pixel to its source pixel
    pub offset_x: i32,
    pub offset_z: i32,
    /// Distance to the source plus the source's input value
    pub value: f32,
}

/// Result of sampling the transform at a world position
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransformSample {
    /// Offset from the sampled position to the nearest source
    pub offset: CartesianPoint,
    pub value: f32,
}

/// A raster over a rectangle of block space that river segments get drawn
/// into. Owned by a single region generation call.
#[derive(Clone, Debug)]
pub struct HeightMapRenderer {
    frame: Rect,
    input: Vec<f32>,
    output: Vec<TransformCell>,
}

impl HeightMapRenderer {
    pub fn new(frame: Rect) -> Self {
        assert!(
            frame.width() > 0 && frame.depth() > 0,
            "empty render frame {}",
            frame
        );
        let size = frame.width() as usize * frame.depth() as usize;
        Self {
            frame,
            input: vec![f32::INFINITY; size],
            output: vec![
                TransformCell {
                    offset_x: 0,
                    offset_z: 0,
                    value: f32::INFINITY,
                };
                size
            ],
        }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Raw rasterized values, row-major over the frame
    pub fn input(&self) -> &[f32] {
        &self.input
    }

    /// Transform results, row-major over the frame. Only meaningful after
    /// [Self::distance_transform].
    pub fn output(&self) -> &[TransformCell] {
        &self.output
    }

    /// Smallest value drawn so far, or infinity if nothing was
    pub fn input_min(&self) -> f32 {
        self.input.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Draw one pixel at a world position. Pixels outside the frame are
    /// dropped.
    pub fn plot_point(&mut self, x: i32, height: i32, z: i32) {
        self.plot_local(
            x as i64 - self.frame.x1 as i64,
            height as i64,
            z as i64 - self.frame.z1 as i64,
        );
    }

    pub fn plot_line_3d(
        &mut self,
        x0: i32,
        y0: i32,
        z0: i32,
        x1: i32,
        y1: i32,
        z1: i32,
    ) {
        let (fx, fz) = (self.frame.x1 as i64, self.frame.z1 as i64);
        raster::line_3d(
            [x0 as i64 - fx, y0 as i64, z0 as i64 - fz],
            [x1 as i64 - fx, y1 as i64, z1 as i64 - fz],
            &mut |x, y, z| self.plot_local(x, y, z),
        );
    }

    /// Draw a quadratic Bézier curve from `a` to `c`, pulled towards `b`, at
    /// a constant height
    pub fn plot_quadratic_bezier_3d(
        &mut self,
        a: CartesianPoint,
        b: CartesianPoint,
        c: CartesianPoint,
        height: i32,
    ) {
        let local = |point: CartesianPoint| {
            (
                point.x as i64 - self.frame.x1 as i64,
                point.z as i64 - self.frame.z1 as i64,
            )
        };
        let (a, b, c) = (local(a), local(b), local(c));
        raster::quadratic_bezier(a, b, c, height as i64, &mut |x, y, z| {
            self.plot_local(x, y, z)
        });
    }

    /// Draw a river segment. Returns `false` if the segment is entirely
    /// outside the frame, in which case nothing was drawn.
    pub fn plot_segment(&mut self, segment: &DrainageSegment) -> bool {
        if !segment.bounds.intersects(&self.frame) {
            return false;
        }
        self.plot_quadratic_bezier_3d(
            segment.a,
            segment.b,
            segment.c,
            segment.depth,
        );
        true
    }

    /// Chained-offset Euclidean distance transform, after Cuisenaire and
    /// Macq, "Fast and exact signed Euclidean distance transformation with
    /// linear complexity" (1999).
    ///
    /// Each pixel stores the offset to its best known source. A pixel
    /// adopts a neighbor's source if that gives a smaller
    /// `|offset| + input[source]`. The forward pass looks at the four
    /// neighbors above and to the left, then sweeps the row back from the
    /// right. The backward pass mirrors it from the bottom right.
    pub fn distance_transform(&mut self) {
        let width = self.frame.width() as usize;
        let depth = self.frame.depth() as usize;
        for (cell, value) in self.output.iter_mut().zip(&self.input) {
            *cell = TransformCell {
                offset_x: 0,
                offset_z: 0,
                value: *value,
            };
        }

        for z in 0..depth {
            for x in 0..width {
                if x > 0 {
                    self.relax(width, x, z, x - 1, z);
                }
                if z > 0 {
                    if x > 0 {
                        self.relax(width, x, z, x - 1, z - 1);
                    }
                    self.relax(width, x, z, x, z - 1);
                    if x + 1 < width {
                        self.relax(width, x, z, x + 1, z - 1);
                    }
                }
            }
            for x in (0..width - 1).rev() {
                self.relax(width, x, z, x + 1, z);
            }
        }

        for z in (0..depth).rev() {
            for x in (0..width).rev() {
                if x + 1 < width {
                    self.relax(width, x, z, x + 1, z);
                }
                if z + 1 < depth {
                    if x + 1 < width {
                        self.relax(width, x, z, x + 1, z + 1);
                    }
                    self.relax(width, x, z, x, z + 1);
                    if x > 0 {
                        self.relax(width, x, z, x - 1, z + 1);
                    }
                }
            }
            for x in 1..width {
                self.relax(width, x, z, x - 1, z);
            }
        }
    }

    /// Transform result at a world position. Panics if the position is
    /// outside the frame.
    pub fn sample(&self, x: i32, z: i32) -> TransformSample {
        let cell = self.output[self.index(x, z)];
        TransformSample {
            offset: CartesianPoint::new(cell.offset_x, cell.offset_z),
            value: cell.value,
        }
    }

    /// Input value of the source pixel that `(x, z)` resolved to. For a
    /// pixel near a river, this is the river's depth.
    pub fn source_value(&self, x: i32, z: i32) -> f32 {
        let cell = self.output[self.index(x, z)];
        self.input[self.index(x + cell.offset_x, z + cell.offset_z)]
    }

    /// Exact squared distance from every pixel to the nearest drawn pixel,
    /// ignoring depth. Row-major over the frame.
    pub fn squared_distance_map(&self) -> Vec<f64> {
        squared_distance_transform(
            self.frame.width() as usize,
            self.frame.depth() as usize,
            |i| self.input[i].is_finite(),
        )
    }

    fn index(&self, x: i32, z: i32) -> usize {
        assert!(
            self.frame.contains(x, z),
            "({}, {}) is outside render frame {}",
            x,
            z,
            self.frame
        );
        (z - self.frame.z1) as usize * self.frame.width() as usize
            + (x - self.frame.x1) as usize
    }

    fn plot_local(&mut self, x: i64, height: i64, z: i64) {
        let width = self.frame.width() as i64;
        if x < 0 || z < 0 || x >= width || z >= self.frame.depth() as i64 {
            return;
        }
        let i = (z * width + x) as usize;
        self.input[i] = self.input[i].min(height as f32);
    }

    /// Try to improve pixel `(x, z)` with the source of pixel `(nx, nz)`
    fn relax(
        &mut self,
        width: usize,
        x: usize,
        z: usize,
        nx: usize,
        nz: usize,
    ) {
        let neighbor = self.output[nz * width + nx];
        let sx = nx as i64 + neighbor.offset_x as i64;
        let sz = nz as i64 + neighbor.offset_z as i64;
        let source = self.input[sz as usize * width + sx as usize];
        if source == f32::INFINITY {
            return;
        }
        let offset_x = (sx - x as i64) as i32;
        let offset_z = (sz - z as i64) as i32;
        let distance = ((offset_x as f32).powi(2) + (offset_z as f32).powi(2))
            .sqrt();
        let value = distance + source;
        let cell = &mut self.output[z * width + x];
        if value < cell.value {
            *cell = TransformCell {
                offset_x,
                offset_z,
                value,
            };
        }
    }
}
