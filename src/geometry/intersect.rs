// Segment-segment intersection using f64 orientation tests with tolerances.

use crate::model::Vec2;

#[inline]
fn orient(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> f64 {
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

#[inline]
fn within_eps(x: f64, eps: f64) -> bool {
    x.abs() <= eps
}

/// True when segments `a..b` and `c..d` properly cross (shared endpoints and
/// mere touches within tolerance do not count). Overlap tests run on shrunk
/// polygons, so touching borders must not register as intersections.
pub fn segments_properly_cross(a: Vec2, b: Vec2, c: Vec2, d: Vec2, eps_pos: f32) -> bool {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);
    let (dx, dy) = (d.x as f64, d.y as f64);
    let eps = eps_pos as f64;

    let o1 = orient(ax, ay, bx, by, cx, cy);
    let o2 = orient(ax, ay, bx, by, dx, dy);
    let o3 = orient(cx, cy, dx, dy, ax, ay);
    let o4 = orient(cx, cy, dx, dy, bx, by);

    if within_eps(o1, eps) || within_eps(o2, eps) || within_eps(o3, eps) || within_eps(o4, eps) {
        return false;
    }
    ((o1 > 0.0) != (o2 > 0.0)) && ((o3 > 0.0) != (o4 > 0.0))
}

/// Infinite-line intersection of `a + t*(b-a)` and `c + u*(d-c)`.
/// `None` when the lines are (near) parallel.
pub fn line_intersection(a: Vec2, b: Vec2, c: Vec2, d: Vec2, eps_denom: f32) -> Option<Vec2> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() <= eps_denom {
        return None;
    }
    let t = (c - a).cross(s) / denom;
    Some(a + r * t)
}
