use crate::world::hex::AxialCoord;

/// Three lattice cells whose jittered sites enclose a point, plus the
/// barycentric weights of that point. Weights line up with vertices and sum
/// to 1.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BarycentricTriangle {
    vertices: [AxialCoord; 3],
    weights: [f32; 3],
}

impl BarycentricTriangle {
    pub fn new(vertices: [AxialCoord; 3], weights: [f32; 3]) -> Self {
        Self { vertices, weights }
    }

    pub fn vertices(&self) -> &[AxialCoord; 3] {
        &self.vertices
    }

    pub fn weights(&self) -> &[f32; 3] {
        &self.weights
    }

    /// The largest of the three weights
    pub fn max(&self) -> f32 {
        self.weights.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// The smallest of the three weights. Negative if the point is outside
    /// the triangle.
    pub fn min(&self) -> f32 {
        self.weights.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// The vertex carrying the largest weight. On a tie, the first one wins.
    pub fn closest_vertex(&self) -> AxialCoord {
        let max = self.max();
        self.vertices
            .iter()
            .zip(self.weights.iter())
            .find(|(_, weight)| **weight == max)
            .map(|(vertex, _)| *vertex)
            .unwrap_or(self.vertices[0])
    }

    /// Weighted average of a per-vertex value
    pub fn interpolate(&self, mut value: impl FnMut(AxialCoord) -> f32) -> f32 {
        self.vertices
            .iter()
            .zip(self.weights.iter())
            .map(|(vertex, weight)| value(*vertex) * weight)
            .sum()
    }
}
