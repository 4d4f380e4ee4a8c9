//! Planar face tracing with the leftmost-turn rule.
//!
//! At each node the walk continues along the neighbor whose outgoing angle
//! is the next one counter-clockwise after the reverse of the incoming
//! direction. Bounded interior faces come out counter-clockwise (positive
//! area); the unbounded outer face comes out clockwise and is rejected by
//! the caller's signed-area gate.
//!
//! Visited/occupied half-edge state is passed in explicitly so a trace is
//! referentially transparent and multiple extraction runs cannot leak state
//! into each other.

use std::collections::{HashMap, HashSet};

use crate::geometry::tolerance::{EPS_ANG, MAX_TRACE_STEPS};
use crate::graph::RoadGraph;
use crate::model::{HalfEdgeKey, Vec2};

pub struct TracedFace {
    /// Node ids along the loop, in trace order (no repeated closing node).
    pub nodes: Vec<u32>,
    pub polygon: Vec<Vec2>,
    /// Edge ids along the loop.
    pub edges: Vec<u32>,
    /// Directed half-edge keys of the loop boundary.
    pub half_edges: Vec<HalfEdgeKey>,
}

/// Angular successor: the neighbor of `at` whose outgoing angle is the next
/// one counter-clockwise strictly after `after_angle`.
fn next_ccw_neighbor(
    graph: &RoadGraph,
    adj: &HashMap<u32, Vec<u32>>,
    at: u32,
    after_angle: f32,
) -> Option<u32> {
    let list = adj.get(&at)?;
    if list.is_empty() {
        return None;
    }
    let at_pos = graph.pos(at)?;
    let mut idx = 0usize;
    while idx < list.len() {
        let p = graph.pos(list[idx])?;
        let ang = (p - at_pos).angle();
        if ang > after_angle + EPS_ANG {
            break;
        }
        idx += 1;
    }
    let idx = if idx == list.len() { 0 } else { idx };
    Some(list[idx])
}

/// Walk one face starting from the directed half-edge `start.0 -> start.1`.
///
/// Aborts (returns `None`) when the walk crosses a bridge, U-turns, exceeds
/// the step cap, or runs onto a half-edge that is already occupied or was
/// already visited in this pass. Every half-edge the walk touches is added
/// to `visited` even on abort, so a failed face is not retried from another
/// of its half-edges.
pub fn trace_face(
    graph: &RoadGraph,
    adj: &HashMap<u32, Vec<u32>>,
    start: HalfEdgeKey,
    occupied: &HashSet<HalfEdgeKey>,
    visited: &mut HashSet<HalfEdgeKey>,
) -> Option<TracedFace> {
    let mut nodes: Vec<u32> = Vec::new();
    let mut edges: Vec<u32> = Vec::new();
    let mut half_edges: Vec<HalfEdgeKey> = Vec::new();
    let mut cur = start;

    for _ in 0..MAX_TRACE_STEPS {
        let (u, v) = cur;
        let eid = graph.find_edge(u, v)?;
        if graph.edge(eid)?.bridge {
            return None;
        }
        visited.insert(cur);
        nodes.push(u);
        edges.push(eid);
        half_edges.push(cur);

        let u_pos = graph.pos(u)?;
        let v_pos = graph.pos(v)?;
        let rev_angle = (u_pos - v_pos).angle();
        let next = next_ccw_neighbor(graph, adj, v, rev_angle)?;
        if next == u {
            return None; // dead end / U-turn
        }
        let step = (v, next);
        if step == start {
            // Closed back onto the starting half-edge.
            let polygon: Vec<Vec2> = nodes.iter().filter_map(|&n| graph.pos(n)).collect();
            if polygon.len() != nodes.len() || polygon.len() < 3 {
                return None;
            }
            return Some(TracedFace {
                nodes,
                polygon,
                edges,
                half_edges,
            });
        }
        if visited.contains(&step) || occupied.contains(&step) {
            return None;
        }
        cur = step;
    }
    None // step cap: runaway traversal yields no face
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_graph() -> (RoadGraph, [u32; 4]) {
        let mut g = RoadGraph::new();
        let n0 = g.add_node(Vec2::new(0.0, 0.0));
        let n1 = g.add_node(Vec2::new(10.0, 0.0));
        let n2 = g.add_node(Vec2::new(10.0, 10.0));
        let n3 = g.add_node(Vec2::new(0.0, 10.0));
        g.add_edge(n0, n1, false);
        g.add_edge(n1, n2, false);
        g.add_edge(n2, n3, false);
        g.add_edge(n3, n0, false);
        (g, [n0, n1, n2, n3])
    }

    #[test]
    fn square_interior_traces_ccw() {
        let (g, [n0, n1, ..]) = square_graph();
        let adj = g.angle_sorted_adjacency();
        let occupied = HashSet::new();
        let mut visited = HashSet::new();
        let face = trace_face(&g, &adj, (n0, n1), &occupied, &mut visited).expect("face");
        assert_eq!(face.nodes.len(), 4);
        assert!(crate::geometry::polygon::polygon_area(&face.polygon) > 0.0);
    }

    #[test]
    fn square_outer_face_traces_cw() {
        let (g, [n0, n1, ..]) = square_graph();
        let adj = g.angle_sorted_adjacency();
        let occupied = HashSet::new();
        let mut visited = HashSet::new();
        let face = trace_face(&g, &adj, (n1, n0), &occupied, &mut visited).expect("face");
        assert!(crate::geometry::polygon::polygon_area(&face.polygon) < 0.0);
    }

    #[test]
    fn dead_end_aborts() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0));
        let b = g.add_node(Vec2::new(10.0, 0.0));
        g.add_edge(a, b, false);
        let adj = g.angle_sorted_adjacency();
        let occupied = HashSet::new();
        let mut visited = HashSet::new();
        assert!(trace_face(&g, &adj, (a, b), &occupied, &mut visited).is_none());
    }

    #[test]
    fn bridge_aborts() {
        let (mut g, [n0, n1, ..]) = square_graph();
        // Rebuild edge n0-n1 as a bridge.
        let eid = g.find_edge(n0, n1).unwrap();
        g.remove_edge(eid);
        g.add_edge(n0, n1, true);
        let adj = g.angle_sorted_adjacency();
        let occupied = HashSet::new();
        let mut visited = HashSet::new();
        assert!(trace_face(&g, &adj, (n0, n1), &occupied, &mut visited).is_none());
    }
}
