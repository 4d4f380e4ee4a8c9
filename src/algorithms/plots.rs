//! Plot extraction: enclosed faces first, then filament strips, then a
//! gap-filling sweep, plus the graph-repair cleanup loop.
//!
//! One `generate` call threads a single occupancy set of directed half-edge
//! keys through all passes; the set lives on the stack of the call so
//! repeated runs cannot leak state into each other.

use std::collections::HashSet;

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::algorithms::buildings::smart_subdivide;
use crate::algorithms::faces::trace_face;
use crate::algorithms::strips::{collect_chain, extrude_chain};
use crate::config::GenerationConfig;
use crate::geometry::polygon::{
    min_interior_angle_deg, oriented_bbox, point_in_polygon, polygon_area, polygon_centroid,
    polygons_overlap, shrink_polygon, simplify_polygon,
};
use crate::geometry::tolerance::MAX_CLEANUP_ITERS;
use crate::graph::RoadGraph;
use crate::model::{HalfEdgeKey, Plot, PlotKind, Vec2};
use crate::terrain::Terrain;

/// Faces larger than this fraction of the world are the unbounded outer face
/// (or close enough to it to be useless).
const MAX_WORLD_FRACTION: f32 = 0.8;

/// Progressively shallower depth attempts for strip candidates.
const DEPTH_SCALES: [f32; 3] = [1.0, 0.75, 0.5];

/// RDP tolerance for shrunk plot outlines.
const SIMPLIFY_TOL: f32 = 0.5;

/// Run both extraction passes plus gap filling over the current graph.
/// Pure with respect to the graph; plots are numbered from zero.
pub fn generate(graph: &RoadGraph, terrain: &dyn Terrain, config: &GenerationConfig) -> Vec<Plot> {
    let mut occupied: HashSet<HalfEdgeKey> = HashSet::new();
    let mut plots: Vec<Plot> = Vec::new();
    enclosed_pass(graph, terrain, config, &mut occupied, &mut plots);
    strip_pass(graph, terrain, config, &mut occupied, &mut plots);
    gap_fill_pass(graph, terrain, config, &mut occupied, &mut plots);
    debug!(
        "plot extraction: {} plots, {} half-edges claimed",
        plots.len(),
        occupied.len()
    );
    plots
}

fn enclosed_pass(
    graph: &RoadGraph,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    occupied: &mut HashSet<HalfEdgeKey>,
    plots: &mut Vec<Plot>,
) {
    let adj = graph.angle_sorted_adjacency();
    let mut visited: HashSet<HalfEdgeKey> = HashSet::new();
    let mut edge_ids: Vec<u32> = graph.edge_ids().collect();
    edge_ids.sort_unstable();

    for eid in edge_ids {
        let edge = match graph.edge(eid) {
            Some(e) => e,
            None => continue,
        };
        if edge.bridge {
            continue;
        }
        for key in [(edge.a, edge.b), (edge.b, edge.a)] {
            if occupied.contains(&key) || visited.contains(&key) {
                continue;
            }
            let face = match trace_face(graph, &adj, key, occupied, &mut visited) {
                Some(f) => f,
                None => continue,
            };
            let raw_area = polygon_area(&face.polygon);
            // Negative area is the unbounded outer face.
            if raw_area <= 0.0 || raw_area > MAX_WORLD_FRACTION * config.world_area() {
                continue;
            }
            if raw_area < 0.5 * config.min_building_area {
                continue; // noise face
            }
            if terrain.is_point_in_water(polygon_centroid(&face.polygon)) {
                continue;
            }
            let shrunk = match shrink_polygon(&face.polygon, config.sidewalk) {
                Some(p) => simplify_polygon(&p, SIMPLIFY_TOL),
                None => continue,
            };
            let area = polygon_area(&shrunk);
            if area < config.min_building_area {
                continue;
            }
            // Claiming the loop frees the opposite side of each boundary
            // edge for strip generation.
            for he in &face.half_edges {
                occupied.insert(*he);
            }
            let mut frontage = face.edges.clone();
            frontage.sort_unstable();
            frontage.dedup();
            plots.push(Plot {
                id: plots.len() as u32,
                polygon: shrunk,
                kind: PlotKind::Enclosed,
                area,
                frontage,
                claimed: face.half_edges,
            });
        }
    }
}

fn chain_half_edges(chain: &[u32]) -> Vec<HalfEdgeKey> {
    chain.windows(2).map(|w| (w[0], w[1])).collect()
}

fn chain_edge_ids(graph: &RoadGraph, chain: &[u32]) -> Vec<u32> {
    let mut out: Vec<u32> = chain
        .windows(2)
        .filter_map(|w| graph.find_edge(w[0], w[1]))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

fn strip_salt(key: HalfEdgeKey) -> u32 {
    key.0.wrapping_mul(0x9E37_79B9).wrapping_add(key.1)
}

/// Validate one extruded candidate against terrain and the accepted plots.
/// The candidate is shrunk slightly before intersection testing so merely
/// touching borders do not count as overlap.
fn strip_candidate_ok(
    polygon: &[Vec2],
    plots: &[Plot],
    terrain: &dyn Terrain,
    config: &GenerationConfig,
) -> bool {
    let area = polygon_area(polygon);
    if area < 0.5 * config.min_building_area {
        return false;
    }
    if oriented_bbox(polygon).width < config.min_edge_length {
        return false; // sliver
    }
    let centroid = polygon_centroid(polygon);
    if terrain.is_point_in_water(centroid) {
        return false;
    }
    let test_poly = match shrink_polygon(polygon, 0.5 * config.sidewalk) {
        Some(p) => p,
        None => return false,
    };
    for plot in plots {
        if polygons_overlap(&test_poly, &plot.polygon) {
            return false;
        }
        if point_in_polygon(centroid, &plot.polygon) {
            return false;
        }
    }
    true
}

/// Attempt a strip for `chain` at progressively shallower depths; on success
/// claims the chain's half-edges and records the plot.
fn try_strip(
    graph: &RoadGraph,
    chain: &[u32],
    depth_scales: &[f32],
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    occupied: &mut HashSet<HalfEdgeKey>,
    plots: &mut Vec<Plot>,
) -> bool {
    if chain.len() < 2 {
        return false;
    }
    let points: Vec<Vec2> = match chain.iter().map(|&n| graph.pos(n)).collect() {
        Some(p) => p,
        None => return false,
    };
    let salt = strip_salt((chain[0], chain[1]));
    for &scale in depth_scales {
        let depth = config.lot_depth * scale;
        let polygon = match extrude_chain(&points, config.sidewalk, depth, salt, terrain) {
            Some(p) => p,
            None => continue,
        };
        if !strip_candidate_ok(&polygon, plots, terrain, config) {
            continue;
        }
        let half_edges = chain_half_edges(chain);
        for he in &half_edges {
            occupied.insert(*he);
        }
        let area = polygon_area(&polygon);
        plots.push(Plot {
            id: plots.len() as u32,
            polygon,
            kind: PlotKind::Strip,
            area,
            frontage: chain_edge_ids(graph, chain),
            claimed: half_edges,
        });
        return true;
    }
    false
}

fn strip_pass(
    graph: &RoadGraph,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    occupied: &mut HashSet<HalfEdgeKey>,
    plots: &mut Vec<Plot>,
) {
    let center = config.center();
    // Innermost start nodes first; deterministic tie-break on the key.
    let mut candidates: Vec<(f32, HalfEdgeKey)> = Vec::new();
    for (_, edge) in graph.edges_iter() {
        if edge.bridge {
            continue;
        }
        for key in [(edge.a, edge.b), (edge.b, edge.a)] {
            if let Some(p) = graph.pos(key.0) {
                candidates.push((p.distance(center), key));
            }
        }
    }
    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.cmp(&b.1)));

    for (_, key) in candidates {
        if occupied.contains(&key) {
            continue;
        }
        let chain = collect_chain(graph, key, occupied);
        if try_strip(graph, &chain, &DEPTH_SCALES, terrain, config, occupied, plots) {
            continue;
        }
        // Whole run failed at every depth: fall back to just this segment.
        if chain.len() > 2 {
            try_strip(
                graph,
                &[key.0, key.1],
                &DEPTH_SCALES,
                terrain,
                config,
                occupied,
                plots,
            );
        }
    }
}

/// Second sweep forcing shallow strips wherever a one-sided street would
/// otherwise leave a dangling empty frontage.
fn gap_fill_pass(
    graph: &RoadGraph,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    occupied: &mut HashSet<HalfEdgeKey>,
    plots: &mut Vec<Plot>,
) {
    let touched: HashSet<u32> = occupied.iter().flat_map(|&(a, b)| [a, b]).collect();
    let mut edge_ids: Vec<u32> = graph.edge_ids().collect();
    edge_ids.sort_unstable();

    for eid in edge_ids {
        let edge = match graph.edge(eid) {
            Some(e) => e,
            None => continue,
        };
        if edge.bridge {
            continue;
        }
        for key in [(edge.a, edge.b), (edge.b, edge.a)] {
            if occupied.contains(&key) {
                continue;
            }
            let opposite_claimed = occupied.contains(&(key.1, key.0));
            let endpoint_touched = touched.contains(&key.0) || touched.contains(&key.1);
            if opposite_claimed || endpoint_touched {
                try_strip(
                    graph,
                    &[key.0, key.1],
                    &[0.5],
                    terrain,
                    config,
                    occupied,
                    plots,
                );
            }
        }
    }
}

/// Can at least one building plausibly fit? Dry-run subdivision with zero
/// irregularity (fully deterministic) and no trimming.
fn fits_a_building(plot: &Plot, config: &GenerationConfig) -> bool {
    let mut dry = config.clone();
    dry.building_irregularity = 0.0;
    let mut rng = ChaCha8Rng::seed_from_u64(plot.id as u64);
    let lots = smart_subdivide(&plot.polygon, &[], &dry, &mut rng);
    lots.iter()
        .any(|lot| polygon_area(lot) >= config.min_building_area)
}

fn plot_is_buildable(plot: &Plot, config: &GenerationConfig) -> bool {
    if plot.area < config.min_building_area {
        return false;
    }
    if oriented_bbox(&plot.polygon).width < config.min_edge_length {
        return false;
    }
    if min_interior_angle_deg(&plot.polygon) < config.min_interior_angle_deg {
        return false;
    }
    fits_a_building(plot, config)
}

/// Prune one sweep of spur edges (degree-1 endpoint against an intersection)
/// and any node left isolated. Returns removed edge count.
fn prune_spurs(graph: &mut RoadGraph) -> usize {
    let spurs: Vec<(u32, u32, u32)> = graph
        .edges_iter()
        .filter(|(_, e)| {
            let da = graph.degree(e.a);
            let db = graph.degree(e.b);
            (da == 1 && db >= 3) || (db == 1 && da >= 3)
        })
        .map(|(eid, e)| (eid, e.a, e.b))
        .collect();
    let count = spurs.len();
    for (eid, a, b) in spurs {
        graph.remove_edge(eid);
        for n in [a, b] {
            if graph.degree(n) == 0 {
                graph.remove_node(n);
            }
        }
    }
    count
}

/// Remove the single longest edge of every loop whose entire half-edge
/// boundary is unclaimed, merging it into a neighboring face. Returns
/// removed edge count.
fn break_empty_loops(graph: &mut RoadGraph, claimed: &HashSet<HalfEdgeKey>) -> usize {
    let adj = graph.angle_sorted_adjacency();
    let mut visited: HashSet<HalfEdgeKey> = HashSet::new();
    let mut doomed: Vec<u32> = Vec::new();
    let mut edge_ids: Vec<u32> = graph.edge_ids().collect();
    edge_ids.sort_unstable();

    for eid in edge_ids {
        let edge = match graph.edge(eid) {
            Some(e) => e,
            None => continue,
        };
        if edge.bridge {
            continue;
        }
        for key in [(edge.a, edge.b), (edge.b, edge.a)] {
            if claimed.contains(&key) || visited.contains(&key) {
                continue;
            }
            // Tracing with the claim set as occupancy aborts the moment the
            // walk touches a claimed half-edge, so a successful positive-area
            // trace is exactly an empty loop.
            let face = match trace_face(graph, &adj, key, claimed, &mut visited) {
                Some(f) => f,
                None => continue,
            };
            if polygon_area(&face.polygon) <= 0.0 {
                continue;
            }
            let longest = face
                .edges
                .iter()
                .copied()
                .max_by(|&x, &y| {
                    let lx = edge_length(graph, x);
                    let ly = edge_length(graph, y);
                    lx.partial_cmp(&ly).unwrap().then(x.cmp(&y))
                });
            if let Some(eid) = longest {
                doomed.push(eid);
            }
        }
    }
    doomed.sort_unstable();
    doomed.dedup();
    let count = doomed.len();
    for eid in doomed {
        graph.remove_edge(eid);
    }
    count
}

fn edge_length(graph: &RoadGraph, eid: u32) -> f32 {
    match graph.edge(eid) {
        Some(e) => match (graph.pos(e.a), graph.pos(e.b)) {
            (Some(a), Some(b)) => a.distance(b),
            _ => 0.0,
        },
        None => 0.0,
    }
}

/// Iterative graph repair: prune spurs, drop unbuildable plots, break empty
/// loops, regenerate, repeat until stable or the iteration cap. Returns the
/// total number of edges removed; zero means the map was already stable.
pub fn cleanup(
    graph: &mut RoadGraph,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    plots: &mut Vec<Plot>,
) -> usize {
    let mut total_removed = 0usize;
    for iteration in 0..MAX_CLEANUP_ITERS {
        let mut removed = prune_spurs(graph);
        plots.retain(|p| plot_is_buildable(p, config));
        let claimed: HashSet<HalfEdgeKey> = plots
            .iter()
            .flat_map(|p| p.claimed.iter().copied())
            .collect();
        removed += break_empty_loops(graph, &claimed);
        debug!("cleanup iteration {iteration}: {removed} edges removed");
        if removed == 0 {
            break;
        }
        total_removed += removed;
        *plots = generate(graph, terrain, config);
    }
    // The iteration cap can exit right after a regenerate; the surviving
    // plots must still pass the buildability gate.
    plots.retain(|p| plot_is_buildable(p, config));
    total_removed
}
