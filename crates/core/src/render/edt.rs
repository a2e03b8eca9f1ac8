//! Exact squared Euclidean distance transform, from Felzenszwalb and
//! Huttenlocher, "Distance Transforms of Sampled Functions" (2012).
//!
//! Unlike the chained-offset transform on [HeightMapRenderer], this only
//! yields distances. It can't tell which source a pixel is closest to, so it
//! can't carry a river's depth.
//!
//! [HeightMapRenderer]: super::HeightMapRenderer

/// Stand-in for infinity, so the parabola intersections stay finite
const FAR: f64 = 1e20;

/// Squared distance from every cell of a `width * depth` row-major grid to
/// the nearest cell where `is_source` holds. Cells with no source anywhere
/// in the grid get `f64::INFINITY`.
pub fn squared_distance_transform(
    width: usize,
    depth: usize,
    is_source: impl Fn(usize) -> bool,
) -> Vec<f64> {
    let mut grid: Vec<f64> = (0..width * depth)
        .map(|i| if is_source(i) { 0.0 } else { FAR })
        .collect();

    let longest = width.max(depth);
    let mut line = vec![0.0; longest];
    let mut out = vec![0.0; longest];
    let mut vertices = vec![0; longest];
    let mut bounds = vec![0.0; longest + 1];

    // Columns
    for x in 0..width {
        for z in 0..depth {
            line[z] = grid[z * width + x];
        }
        transform_1d(&line[..depth], &mut out, &mut vertices, &mut bounds);
        for z in 0..depth {
            grid[z * width + x] = out[z];
        }
    }
    // Rows
    for z in 0..depth {
        let row = &mut grid[z * width..(z + 1) * width];
        line[..width].copy_from_slice(row);
        transform_1d(&line[..width], &mut out, &mut vertices, &mut bounds);
        row.copy_from_slice(&out[..width]);
    }

    for value in grid.iter_mut() {
        if *value >= FAR {
            *value = f64::INFINITY;
        }
    }
    grid
}

/// Lower envelope of the parabolas `(q - p)^2 + f(p)`
fn transform_1d(
    f: &[f64],
    out: &mut [f64],
    vertices: &mut [usize],
    bounds: &mut [f64],
) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let intersect = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    let mut k = 0;
    vertices[0] = 0;
    bounds[0] = f64::NEG_INFINITY;
    bounds[1] = f64::INFINITY;
    for q in 1..n {
        let mut s = intersect(q, vertices[k]);
        while s <= bounds[k] {
            k -= 1;
            s = intersect(q, vertices[k]);
        }
        k += 1;
        vertices[k] = q;
        bounds[k] = s;
        bounds[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, value) in out[..n].iter_mut().enumerate() {
        while bounds[k + 1] < q as f64 {
            k += 1;
        }
        let d = q as f64 - vertices[k] as f64;
        *value = d * d + f[vertices[k]];
    }
}
