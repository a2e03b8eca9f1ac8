//! Integer rasterization of lines and quadratic Bézier curves, after Alois
//! Zingl's "A Rasterizing Algorithm for Drawing Curves"
//! (<http://members.chello.at/easyfilter/bresenham.html>).
//!
//! Everything here works on raw `i64` coordinates and hands each pixel to a
//! callback as `(x, y, z)`, where `y` is the value being drawn. Clipping is
//! the callback's job.

/// 3D Bresenham line from `from` to `to`, both ends included
pub fn line_3d(
    from: [i64; 3],
    to: [i64; 3],
    plot: &mut impl FnMut(i64, i64, i64),
) {
    let [mut x, mut y, mut z] = from;
    let (dx, sx) = ((to[0] - x).abs(), (to[0] - x).signum());
    let (dy, sy) = ((to[1] - y).abs(), (to[1] - y).signum());
    let (dz, sz) = ((to[2] - z).abs(), (to[2] - z).signum());
    let steps = dx.max(dy).max(dz);
    let (mut ex, mut ey, mut ez) = (steps / 2, steps / 2, steps / 2);

    for _ in 0..=steps {
        plot(x, y, z);
        ex -= dx;
        if ex < 0 {
            ex += steps;
            x += sx;
        }
        ey -= dy;
        if ey < 0 {
            ey += steps;
            y += sy;
        }
        ez -= dz;
        if ez < 0 {
            ez += steps;
            z += sz;
        }
    }
}

/// Quadratic Bézier curve from `p0` to `p2` with control point `p1`, drawn at
/// a constant `height`. Points are `(x, z)`.
///
/// The curve is split wherever its gradient changes sign in either axis, and
/// each monotonic piece is drawn with [quadratic_bezier_segment].
pub fn quadratic_bezier(
    p0: (i64, i64),
    p1: (i64, i64),
    p2: (i64, i64),
    height: i64,
    plot: &mut impl FnMut(i64, i64, i64),
) {
    let ((mut x0, mut z0), (mut x1, mut z1), (mut x2, mut z2)) = (p0, p1, p2);
    let mut x = x0 - x1;
    let mut z = z0 - z1;

    // Horizontal cut
    if x * (x2 - x1) > 0 {
        let mut t = (x0 - 2 * x1 + x2) as f64;
        // Vertical cut too? Make sure the horizontal one comes first
        if z * (z2 - z1) > 0
            && ((z0 - 2 * z1 + z2) as f64 / t * x as f64).abs()
                > (z as f64).abs()
        {
            x0 = x2;
            x2 = x + x1;
            z0 = z2;
            z2 = z + z1;
        }
        t = (x0 - x1) as f64 / t;
        let mut r = (1.0 - t) * ((1.0 - t) * z0 as f64 + 2.0 * t * z1 as f64)
            + t * t * z2 as f64;
        t = (x0 as f64 * x2 as f64 - x1 as f64 * x1 as f64) * t
            / (x0 - x1) as f64;
        x = round(t);
        z = round(r);
        r = (z1 - z0) as f64 * (t - x0 as f64) / (x1 - x0) as f64 + z0 as f64;
        quadratic_bezier_segment((x0, z0), (x, round(r)), (x, z), height, plot);
        r = (z1 - z2) as f64 * (t - x2 as f64) / (x1 - x2) as f64 + z2 as f64;
        x0 = x;
        x1 = x;
        z0 = z;
        z1 = round(r);
    }

    // Vertical cut
    if (z0 - z1) * (z2 - z1) > 0 {
        let mut t = (z0 - 2 * z1 + z2) as f64;
        t = (z0 - z1) as f64 / t;
        let mut r = (1.0 - t) * ((1.0 - t) * x0 as f64 + 2.0 * t * x1 as f64)
            + t * t * x2 as f64;
        t = (z0 as f64 * z2 as f64 - z1 as f64 * z1 as f64) * t
            / (z0 - z1) as f64;
        x = round(r);
        z = round(t);
        r = (x1 - x0) as f64 * (t - z0 as f64) / (z1 - z0) as f64 + x0 as f64;
        quadratic_bezier_segment((x0, z0), (round(r), z), (x, z), height, plot);
        r = (x1 - x2) as f64 * (t - z2 as f64) / (z1 - z2) as f64 + x2 as f64;
        x0 = x;
        x1 = round(r);
        z0 = z;
        z1 = z;
    }

    quadratic_bezier_segment((x0, z0), (x1, z1), (x2, z2), height, plot);
}

/// Draw a quadratic Bézier piece whose gradient doesn't change sign. Pieces
/// that break that rule are skipped.
pub fn quadratic_bezier_segment(
    p0: (i64, i64),
    p1: (i64, i64),
    p2: (i64, i64),
    height: i64,
    plot: &mut impl FnMut(i64, i64, i64),
) {
    let ((mut x0, mut z0), (x1, z1), (mut x2, mut z2)) = (p0, p1, p2);
    let mut sx = x2 - x1;
    let mut sz = z2 - z1;
    let mut xx = x0 - x1;
    let mut zz = z0 - z1;
    let mut cur = (xx * sz - zz * sx) as f64;
    if xx * sx > 0 || zz * sz > 0 {
        return;
    }

    // Start with the longer half
    if sx * sx + sz * sz > xx * xx + zz * zz {
        x2 = x0;
        x0 = sx + x1;
        z2 = z0;
        z0 = sz + z1;
        cur = -cur;
    }

    if cur != 0.0 {
        xx += sx;
        sx = if x0 < x2 { 1 } else { -1 };
        xx *= sx;
        zz += sz;
        sz = if z0 < z2 { 1 } else { -1 };
        zz *= sz;
        let mut xz = 2 * xx * zz;
        xx *= xx;
        zz *= zz;
        // Negated curvature
        if cur * ((sx * sz) as f64) < 0.0 {
            xx = -xx;
            zz = -zz;
            xz = -xz;
            cur = -cur;
        }
        let mut dx = 4.0 * sz as f64 * cur * (x1 - x0) as f64
            + xx as f64
            - xz as f64;
        let mut dz = 4.0 * sx as f64 * cur * (z0 - z1) as f64
            + zz as f64
            - xz as f64;
        xx += xx;
        zz += zz;
        let mut err = dx + dz + xz as f64;
        loop {
            plot(x0, height, z0);
            if x0 == x2 && z0 == z2 {
                return;
            }
            let step_z = 2.0 * err < dx;
            if 2.0 * err > dz {
                x0 += sx;
                dx -= xz as f64;
                dz += zz as f64;
                err += dz;
            }
            if step_z {
                z0 += sz;
                dz -= xz as f64;
                dx += xx as f64;
                err += dx;
            }
            if dz >= dx {
                break;
            }
        }
    }

    line_3d([x0, height, z0], [x2, height, z2], plot);
}

fn round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
