//! Simple-polygon primitives: area/centroid/bbox, point containment,
//! inward miter offset, RDP simplification, oriented bounding box and
//! half-plane splitting.
//!
//! Every polygon crossing a module boundary is counter-clockwise (positive
//! signed area); producers call `ensure_ccw`, consumers may debug-assert it.

use crate::model::Vec2;

use super::intersect::{line_intersection, segments_properly_cross};
use super::math::seg_distance_sq;
use super::tolerance::{EPS_AREA, EPS_DENOM, EPS_POS, SHRINK_SPIKE_FACTOR};

/// Signed area; positive for counter-clockwise winding.
pub fn polygon_area(poly: &[Vec2]) -> f32 {
    let mut a = 0.0f32;
    for i in 0..poly.len() {
        let j = (i + 1) % poly.len();
        a += poly[i].x * poly[j].y - poly[j].x * poly[i].y;
    }
    0.5 * a
}

pub fn polygon_centroid(poly: &[Vec2]) -> Vec2 {
    let mut cx = 0.0f32;
    let mut cy = 0.0f32;
    let mut a = 0.0f32;
    for i in 0..poly.len() {
        let j = (i + 1) % poly.len();
        let cross = poly[i].x * poly[j].y - poly[j].x * poly[i].y;
        a += cross;
        cx += (poly[i].x + poly[j].x) * cross;
        cy += (poly[i].y + poly[j].y) * cross;
    }
    let a = a * 0.5;
    if a.abs() < EPS_AREA {
        return poly[0];
    }
    Vec2::new(cx / (6.0 * a), cy / (6.0 * a))
}

pub fn polygon_bbox(poly: &[Vec2]) -> (f32, f32, f32, f32) {
    let mut minx = f32::INFINITY;
    let mut miny = f32::INFINITY;
    let mut maxx = f32::NEG_INFINITY;
    let mut maxy = f32::NEG_INFINITY;
    for p in poly {
        minx = minx.min(p.x);
        maxx = maxx.max(p.x);
        miny = miny.min(p.y);
        maxy = maxy.max(p.y);
    }
    (minx, miny, maxx, maxy)
}

pub fn bbox_intersects(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> bool {
    !(a.2 < b.0 || b.2 < a.0 || a.3 < b.1 || b.3 < a.1)
}

pub fn is_ccw(poly: &[Vec2]) -> bool {
    polygon_area(poly) > 0.0
}

pub fn ensure_ccw(poly: &mut Vec<Vec2>) {
    if polygon_area(poly) < 0.0 {
        poly.reverse();
    }
}

/// Even-odd point containment via horizontal ray crossing count.
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut crossings = 0i32;
    let n = poly.len();
    for i in 0..n {
        let p1 = poly[i];
        let p2 = poly[(i + 1) % n];
        let y_crosses = (p1.y <= p.y && p2.y > p.y) || (p2.y <= p.y && p1.y > p.y);
        if y_crosses {
            let t = (p.y - p1.y) / (p2.y - p1.y);
            let x_intersect = p1.x + t * (p2.x - p1.x);
            if p.x < x_intersect {
                crossings += 1;
            }
        }
    }
    crossings % 2 == 1
}

/// Ramer-Douglas-Peucker simplification of an open vertex chain.
pub fn rdp_simplify(points: &[Vec2], eps: f32) -> Vec<Vec2> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let eps2 = eps * eps;
    fn rec(slice: &[Vec2], eps2: f32, out: &mut Vec<Vec2>) {
        let n = slice.len();
        if n <= 2 {
            out.push(slice[0]);
            return;
        }
        let a = slice[0];
        let b = slice[n - 1];
        let mut idx = 0usize;
        let mut md2 = 0.0f32;
        for (i, p) in slice.iter().enumerate().take(n - 1).skip(1) {
            let (d2, _) = seg_distance_sq(*p, a, b);
            if d2 > md2 {
                md2 = d2;
                idx = i;
            }
        }
        if md2 > eps2 {
            rec(&slice[..=idx], eps2, out);
            rec(&slice[idx..], eps2, out);
        } else {
            out.push(a);
        }
    }
    let mut out = Vec::new();
    rec(points, eps2, &mut out);
    out.push(*points.last().unwrap());
    out
}

/// Simplify a closed polygon; the first vertex is pinned.
pub fn simplify_polygon(poly: &[Vec2], eps: f32) -> Vec<Vec2> {
    if poly.len() <= 4 {
        return poly.to_vec();
    }
    let mut chain: Vec<Vec2> = poly.to_vec();
    chain.push(poly[0]);
    let mut out = rdp_simplify(&chain, eps);
    out.pop();
    if out.len() >= 3 {
        out
    } else {
        poly.to_vec()
    }
}

/// Drop vertices whose perpendicular deviation from the line through their
/// neighbors is below `tol`.
pub fn remove_collinear(poly: &[Vec2], tol: f32) -> Vec<Vec2> {
    if poly.len() <= 3 {
        return poly.to_vec();
    }
    let n = poly.len();
    let tol2 = tol * tol;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = poly[(i + n - 1) % n];
        let next = poly[(i + 1) % n];
        let (d2, _) = seg_distance_sq(poly[i], prev, next);
        if d2 > tol2 {
            out.push(poly[i]);
        }
    }
    if out.len() >= 3 {
        out
    } else {
        poly.to_vec()
    }
}

/// Inward offset of a CCW polygon by `dist` using per-edge normal offsetting
/// and consecutive-offset-edge intersection. Corner intersections that shoot
/// further than a small multiple of `dist` from the original corner are
/// clamped along the corner-to-intersection direction (spike suppression).
///
/// Returns `None` when the polygon collapses.
pub fn shrink_polygon(poly: &[Vec2], dist: f32) -> Option<Vec<Vec2>> {
    if poly.len() < 3 || dist <= 0.0 {
        return None;
    }
    debug_assert!(is_ccw(poly));
    let n = poly.len();
    let max_reach = SHRINK_SPIKE_FACTOR * dist;

    // Offset each edge inward (left of the CCW direction is the interior).
    let mut offs: Vec<(Vec2, Vec2)> = Vec::with_capacity(n);
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let dir = (b - a).normalized_or(Vec2::new(1.0, 0.0));
        let normal = dir.perp();
        offs.push((a + normal * dist, b + normal * dist));
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = offs[(i + n - 1) % n];
        let cur = offs[i];
        let corner = poly[i];
        let pt = match line_intersection(prev.0, prev.1, cur.0, cur.1, EPS_DENOM) {
            Some(p) => p,
            None => cur.0, // near-collinear edges: plain offset point
        };
        let reach = pt - corner;
        let pt = if reach.length() > max_reach {
            corner + reach.normalized_or(Vec2::new(1.0, 0.0)) * max_reach
        } else {
            pt
        };
        out.push(pt);
    }

    let area = polygon_area(&out);
    if out.len() < 3 || area <= EPS_AREA {
        return None;
    }
    Some(out)
}

/// Oriented bounding box aligned to the polygon's longest edge.
#[derive(Clone, Copy, Debug)]
pub struct Obb {
    pub center: Vec2,
    /// Unit direction of the long axis.
    pub axis: Vec2,
    pub length: f32,
    pub width: f32,
}

pub fn oriented_bbox(poly: &[Vec2]) -> Obb {
    let n = poly.len();
    let mut best_dir = Vec2::new(1.0, 0.0);
    let mut best_len2 = -1.0f32;
    for i in 0..n {
        let d = poly[(i + 1) % n] - poly[i];
        let l2 = d.length_sq();
        if l2 > best_len2 {
            best_len2 = l2;
            best_dir = d;
        }
    }
    let axis = best_dir.normalized_or(Vec2::new(1.0, 0.0));
    let perp = axis.perp();
    let mut min_a = f32::INFINITY;
    let mut max_a = f32::NEG_INFINITY;
    let mut min_p = f32::INFINITY;
    let mut max_p = f32::NEG_INFINITY;
    for v in poly {
        let a = v.dot(axis);
        let p = v.dot(perp);
        min_a = min_a.min(a);
        max_a = max_a.max(a);
        min_p = min_p.min(p);
        max_p = max_p.max(p);
    }
    let len = max_a - min_a;
    let wid = max_p - min_p;
    let mid_a = 0.5 * (min_a + max_a);
    let mid_p = 0.5 * (min_p + max_p);
    let center = axis * mid_a + perp * mid_p;
    if wid > len {
        Obb {
            center,
            axis: perp,
            length: wid,
            width: len,
        }
    } else {
        Obb {
            center,
            axis,
            length: len,
            width: wid,
        }
    }
}

/// Split a polygon by the line through `point` with unit `normal` into the
/// positive-side and negative-side halves. Degenerate slivers come back as
/// polygons with < 3 vertices; callers filter by area.
pub fn split_polygon(poly: &[Vec2], point: Vec2, normal: Vec2) -> (Vec<Vec2>, Vec<Vec2>) {
    let n = poly.len();
    let mut pos: Vec<Vec2> = Vec::new();
    let mut neg: Vec<Vec2> = Vec::new();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let da = (a - point).dot(normal);
        let db = (b - point).dot(normal);
        if da >= -EPS_POS {
            pos.push(a);
        }
        if da <= EPS_POS {
            neg.push(a);
        }
        // Side change: insert the crossing point into both halves.
        if (da > EPS_POS && db < -EPS_POS) || (da < -EPS_POS && db > EPS_POS) {
            let t = da / (da - db);
            let x = a + (b - a) * t;
            pos.push(x);
            neg.push(x);
        }
    }
    ensure_ccw(&mut pos);
    ensure_ccw(&mut neg);
    (pos, neg)
}

/// Polygon-polygon conflict: any properly crossing segment pair, or either
/// polygon containing a vertex of the other. AABB pre-filtered.
pub fn polygons_overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    if !bbox_intersects(polygon_bbox(a), polygon_bbox(b)) {
        return false;
    }
    let na = a.len();
    let nb = b.len();
    for i in 0..na {
        let a0 = a[i];
        let a1 = a[(i + 1) % na];
        for j in 0..nb {
            if segments_properly_cross(a0, a1, b[j], b[(j + 1) % nb], EPS_POS) {
                return true;
            }
        }
    }
    if a.iter().any(|p| point_in_polygon(*p, b)) {
        return true;
    }
    b.iter().any(|p| point_in_polygon(*p, a))
}

/// Smallest interior angle of the polygon, in degrees.
pub fn min_interior_angle_deg(poly: &[Vec2]) -> f32 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut best = f32::INFINITY;
    for i in 0..n {
        let prev = poly[(i + n - 1) % n];
        let next = poly[(i + 1) % n];
        let u = (prev - poly[i]).normalized_or(Vec2::new(1.0, 0.0));
        let v = (next - poly[i]).normalized_or(Vec2::new(1.0, 0.0));
        let c = u.dot(v).clamp(-1.0, 1.0);
        best = best.min(c.acos().to_degrees());
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(s: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(s, 0.0),
            Vec2::new(s, s),
            Vec2::new(0.0, s),
        ]
    }

    #[test]
    fn area_and_winding() {
        let sq = square(10.0);
        assert!((polygon_area(&sq) - 100.0).abs() < 1e-4);
        let mut cw = sq.clone();
        cw.reverse();
        assert!(polygon_area(&cw) < 0.0);
        ensure_ccw(&mut cw);
        assert!(is_ccw(&cw));
    }

    #[test]
    fn shrink_square_by_two() {
        let shrunk = shrink_polygon(&square(20.0), 2.0).expect("shrink");
        assert_eq!(shrunk.len(), 4);
        let area = polygon_area(&shrunk);
        assert!(area < 400.0, "area {area} not reduced");
        assert!(area > 200.0, "area {area} collapsed too far");
        // A 20x20 square shrunk by 2 is exactly 16x16.
        assert!((area - 256.0).abs() < 1.0);
    }

    #[test]
    fn shrink_collapses_to_none() {
        assert!(shrink_polygon(&square(2.0), 5.0).is_none());
    }

    #[test]
    fn split_square_in_half() {
        let (pos, neg) = split_polygon(&square(10.0), Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0));
        assert!((polygon_area(&pos) - 50.0).abs() < 1e-3);
        assert!((polygon_area(&neg) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn obb_of_rectangle() {
        let rect = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(8.0, 0.0),
            Vec2::new(8.0, 3.0),
            Vec2::new(0.0, 3.0),
        ];
        let obb = oriented_bbox(&rect);
        assert!((obb.length - 8.0).abs() < 1e-4);
        assert!((obb.width - 3.0).abs() < 1e-4);
        assert!((obb.center.x - 4.0).abs() < 1e-4);
        assert!((obb.center.y - 1.5).abs() < 1e-4);
    }

    #[test]
    fn overlap_detection() {
        let a = square(10.0);
        let mut b = square(10.0);
        for p in &mut b {
            p.x += 5.0;
            p.y += 5.0;
        }
        assert!(polygons_overlap(&a, &b));
        let mut c = square(10.0);
        for p in &mut c {
            p.x += 20.0;
        }
        assert!(!polygons_overlap(&a, &c));
        // Containment without segment crossings.
        let inner = vec![
            Vec2::new(4.0, 4.0),
            Vec2::new(6.0, 4.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(4.0, 6.0),
        ];
        assert!(polygons_overlap(&a, &inner));
    }

    #[test]
    fn collinear_vertex_removed() {
        let poly = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.01),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let out = remove_collinear(&poly, 0.5);
        assert_eq!(out.len(), 4);
    }
}
