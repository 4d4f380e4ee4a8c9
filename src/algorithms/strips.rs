//! Filament/strip plots: uninterrupted road runs extruded sideways.
//!
//! A candidate half-edge is first rewound through degree-2 predecessors that
//! keep roughly the same direction, then traced forward the same way; the
//! resulting node chain is offset to its left side with miter joins into a
//! closed polygon.

use std::collections::HashSet;

use crate::geometry::math::{angle_diff, hash01};
use crate::geometry::polygon::ensure_ccw;
use crate::geometry::tolerance::{EPS_LEN, MAX_CHAIN_NODES, MITER_LIMIT};
use crate::graph::RoadGraph;
use crate::model::{HalfEdgeKey, Vec2};
use crate::terrain::Terrain;

/// Maximum heading deviation for a run to count as "the same street".
const CHAIN_ANGLE_TOL: f32 = 0.6;

/// Depth jitter band: each back vertex sits at 0.85..1.15 of nominal depth.
const JITTER_LO: f32 = 0.85;
const JITTER_SPAN: f32 = 0.3;

/// Minimum usable fraction of nominal depth after the water pullback.
const MIN_DEPTH_FRACTION: f32 = 0.25;

fn chain_dir(graph: &RoadGraph, from: u32, to: u32) -> Option<Vec2> {
    let a = graph.pos(from)?;
    let b = graph.pos(to)?;
    Some((b - a).normalized_or(Vec2::new(1.0, 0.0)))
}

/// Collect the full uninterrupted run containing the half-edge `start`.
///
/// Both the rewind and the forward walk stop at intersections (degree >= 3),
/// dead ends, direction breaks, already-occupied adjacent half-edges, and
/// self-revisits. The returned chain always contains at least `start`'s two
/// nodes, ordered in the direction of `start`.
pub fn collect_chain(
    graph: &RoadGraph,
    start: HalfEdgeKey,
    occupied: &HashSet<HalfEdgeKey>,
) -> Vec<u32> {
    let (u, v) = start;
    let mut chain = vec![u, v];

    // Rewind: walk backward from u while the street continues.
    let mut head = u;
    let mut ahead = v;
    while chain.len() < MAX_CHAIN_NODES {
        let node = match graph.node(head) {
            Some(n) => n,
            None => break,
        };
        if node.neighbors.len() != 2 {
            break;
        }
        let w = match node.neighbors.iter().copied().find(|&n| n != ahead) {
            Some(w) => w,
            None => break,
        };
        if chain.contains(&w) {
            break;
        }
        let fwd = match chain_dir(graph, head, ahead) {
            Some(d) => d,
            None => break,
        };
        let inc = match chain_dir(graph, w, head) {
            Some(d) => d,
            None => break,
        };
        if angle_diff(inc.angle(), fwd.angle()).abs() > CHAIN_ANGLE_TOL {
            break;
        }
        if occupied.contains(&(w, head)) {
            break;
        }
        chain.insert(0, w);
        ahead = head;
        head = w;
    }

    // Forward: extend past v the same way.
    let mut tail = v;
    let mut behind = chain[chain.len() - 2];
    while chain.len() < MAX_CHAIN_NODES {
        let node = match graph.node(tail) {
            Some(n) => n,
            None => break,
        };
        if node.neighbors.len() != 2 {
            break;
        }
        let w = match node.neighbors.iter().copied().find(|&n| n != behind) {
            Some(w) => w,
            None => break,
        };
        if chain.contains(&w) {
            break;
        }
        let inc = match chain_dir(graph, behind, tail) {
            Some(d) => d,
            None => break,
        };
        let out = match chain_dir(graph, tail, w) {
            Some(d) => d,
            None => break,
        };
        if angle_diff(out.angle(), inc.angle()).abs() > CHAIN_ANGLE_TOL {
            break;
        }
        if occupied.contains(&(tail, w)) {
            break;
        }
        chain.push(w);
        behind = tail;
        tail = w;
    }

    chain
}

/// Miter direction and scale for vertex `i` of an open chain. The scale
/// preserves perpendicular offset distance at corners and is capped so a
/// sharp turn cannot explode into a spike.
fn miter_at(points: &[Vec2], i: usize) -> (Vec2, f32) {
    let n = points.len();
    let in_dir = if i > 0 {
        (points[i] - points[i - 1]).normalized_or(Vec2::new(1.0, 0.0))
    } else {
        (points[1] - points[0]).normalized_or(Vec2::new(1.0, 0.0))
    };
    let out_dir = if i + 1 < n {
        (points[i + 1] - points[i]).normalized_or(in_dir)
    } else {
        in_dir
    };
    let left_in = in_dir.perp();
    let left_out = out_dir.perp();
    let bisector = (left_in + left_out).normalized_or(left_in);
    let denom = bisector.dot(left_in);
    let scale = if denom > 1.0 / MITER_LIMIT {
        1.0 / denom
    } else {
        MITER_LIMIT
    };
    (bisector, scale)
}

/// Largest dry offset in `[lo, hi]` along `dir` from `origin`, found by
/// binary search. `hi` itself is returned unchanged when already dry.
fn dry_offset(origin: Vec2, dir: Vec2, lo: f32, hi: f32, terrain: &dyn Terrain) -> f32 {
    if !terrain.is_point_in_water(origin + dir * hi) {
        return hi;
    }
    let mut lo = lo;
    let mut hi = hi;
    for _ in 0..12 {
        let mid = 0.5 * (lo + hi);
        if terrain.is_point_in_water(origin + dir * mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}

/// Extrude a node chain into a closed strip polygon on the chain's left.
///
/// `gap` is the clearance from the road centerline, `depth` the nominal lot
/// depth; each back vertex gets a deterministic jitter so straight streets do
/// not extrude into a perfect rectangle. Returns `None` when the chain is
/// degenerate or water leaves no usable depth.
pub fn extrude_chain(
    points: &[Vec2],
    gap: f32,
    depth: f32,
    salt: u32,
    terrain: &dyn Terrain,
) -> Option<Vec<Vec2>> {
    if points.len() < 2 || depth <= EPS_LEN {
        return None;
    }
    let n = points.len();
    let mut front = Vec::with_capacity(n);
    let mut back = Vec::with_capacity(n);

    for i in 0..n {
        let (miter, scale) = miter_at(points, i);
        let jitter = JITTER_LO + JITTER_SPAN * hash01(i as u32, salt);
        let nominal = gap + depth * jitter;
        let offset_dir = miter * scale;
        let usable = dry_offset(points[i], offset_dir, gap, nominal, terrain);
        if usable - gap < depth * MIN_DEPTH_FRACTION {
            return None;
        }
        front.push(points[i] + offset_dir * gap);
        back.push(points[i] + offset_dir * usable);
    }

    let mut polygon = front;
    polygon.extend(back.into_iter().rev());
    ensure_ccw(&mut polygon);
    if polygon.len() < 3 {
        return None;
    }
    Some(polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::polygon_area;
    use crate::terrain::Flatland;

    fn flat() -> Flatland {
        Flatland::new(Vec2::new(0.0, 0.0), 1000.0)
    }

    #[test]
    fn straight_chain_extrudes_left() {
        let pts = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 0.0),
        ];
        let poly = extrude_chain(&pts, 2.0, 10.0, 1, &flat()).expect("strip");
        // Left of +x travel is +y; every vertex sits above the road.
        assert!(poly.iter().all(|p| p.y > 1.0));
        assert!(polygon_area(&poly) > 0.0);
    }

    #[test]
    fn chain_rewinds_through_pass_through_nodes() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0));
        let b = g.add_node(Vec2::new(10.0, 0.0));
        let c = g.add_node(Vec2::new(20.0, 1.0));
        let d = g.add_node(Vec2::new(30.0, 1.5));
        g.add_edge(a, b, false);
        g.add_edge(b, c, false);
        g.add_edge(c, d, false);
        let chain = collect_chain(&g, (b, c), &HashSet::new());
        assert_eq!(chain, vec![a, b, c, d]);
    }

    #[test]
    fn chain_stops_at_intersection_and_occupied() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0));
        let b = g.add_node(Vec2::new(10.0, 0.0));
        let c = g.add_node(Vec2::new(20.0, 0.0));
        let spur = g.add_node(Vec2::new(10.0, 10.0));
        g.add_edge(a, b, false);
        g.add_edge(b, c, false);
        g.add_edge(b, spur, false); // b becomes an intersection
        let chain = collect_chain(&g, (b, c), &HashSet::new());
        assert_eq!(chain, vec![b, c]);

        let mut g2 = RoadGraph::new();
        let a = g2.add_node(Vec2::new(0.0, 0.0));
        let b = g2.add_node(Vec2::new(10.0, 0.0));
        let c = g2.add_node(Vec2::new(20.0, 0.0));
        g2.add_edge(a, b, false);
        g2.add_edge(b, c, false);
        let mut occ = HashSet::new();
        occ.insert((a, b));
        let chain = collect_chain(&g2, (b, c), &occ);
        assert_eq!(chain, vec![b, c]);
    }

    #[test]
    fn water_pullback_rejects_drowned_strip() {
        use crate::terrain::BandRiver;
        let river = BandRiver::new(Vec2::new(0.0, 0.0), 1000.0, 6.0, 5.0);
        let pts = vec![Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0)];
        // Extruding +y runs straight into the river band at y=1..11.
        assert!(extrude_chain(&pts, 2.0, 10.0, 1, &river).is_none());
    }
}
