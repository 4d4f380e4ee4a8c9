//! A hand-built 4-node square loop: the smallest map with one enclosed face.

use parcel::algorithms::plots;
use parcel::config::GenerationConfig;
use parcel::geometry::polygon::polygon_area;
use parcel::graph::RoadGraph;
use parcel::model::PlotKind;
use parcel::terrain::Flatland;
use parcel::Vec2;

fn square_graph() -> RoadGraph {
    let mut g = RoadGraph::new();
    let n0 = g.add_node(Vec2::new(0.0, 0.0));
    let n1 = g.add_node(Vec2::new(10.0, 0.0));
    let n2 = g.add_node(Vec2::new(10.0, 10.0));
    let n3 = g.add_node(Vec2::new(0.0, 10.0));
    g.add_edge(n0, n1, false);
    g.add_edge(n1, n2, false);
    g.add_edge(n2, n3, false);
    g.add_edge(n3, n0, false);
    g
}

fn setup() -> (RoadGraph, Flatland, GenerationConfig) {
    let config = GenerationConfig::default();
    (square_graph(), Flatland::new(Vec2::new(5.0, 5.0), 1000.0), config)
}

#[test]
fn square_loop_yields_one_enclosed_plot() {
    let (graph, terrain, config) = setup();
    let plots = plots::generate(&graph, &terrain, &config);
    let enclosed: Vec<_> = plots
        .iter()
        .filter(|p| p.kind == PlotKind::Enclosed)
        .collect();
    assert_eq!(enclosed.len(), 1);

    let plot = enclosed[0];
    // The 10x10 face shrunk by the 2-unit sidewalk: still a quadrilateral,
    // strictly smaller than the face, strictly bigger than nothing.
    assert_eq!(plot.polygon.len(), 4);
    let area = polygon_area(&plot.polygon);
    assert!(area > 0.0 && area < 100.0, "area {area}");
    assert!(!plot.frontage.is_empty());
    assert_eq!(plot.claimed.len(), 4);
}

#[test]
fn square_loop_outside_grows_strips() {
    let (graph, terrain, config) = setup();
    let plots = plots::generate(&graph, &terrain, &config);
    // The outward-facing half-edges are free for filament extrusion.
    assert!(plots.iter().any(|p| p.kind == PlotKind::Strip));
}

#[test]
fn cleanup_on_stable_map_removes_nothing() {
    let (mut graph, terrain, config) = setup();
    let mut plots = plots::generate(&graph, &terrain, &config);
    let first = plots::cleanup(&mut graph, &terrain, &config, &mut plots);
    assert_eq!(first, 0, "square loop has no spurs or empty loops");
    let second = plots::cleanup(&mut graph, &terrain, &config, &mut plots);
    assert_eq!(second, 0);
    assert_eq!(graph.edge_count(), 4);
}

#[test]
fn chained_spurs_need_multiple_sweeps() {
    let (mut graph, terrain, config) = setup();
    // A fork hanging off the loop: pruning the two leaf edges leaves the
    // fork node itself as a fresh spur, so repair takes more than one
    // iteration.
    let fork = graph.add_node(Vec2::new(20.0, 0.0));
    let leaf_a = graph.add_node(Vec2::new(24.0, 3.0));
    let leaf_b = graph.add_node(Vec2::new(24.0, -3.0));
    graph.add_edge(1, fork, false); // node 1 is the (10, 0) corner
    graph.add_edge(fork, leaf_a, false);
    graph.add_edge(fork, leaf_b, false);

    let mut plots = plots::generate(&graph, &terrain, &config);
    let removed = plots::cleanup(&mut graph, &terrain, &config, &mut plots);
    assert_eq!(removed, 3, "two leaf edges, then the exposed fork edge");
    assert!(graph.node(fork).is_none());
    assert_eq!(graph.edge_count(), 4);
    for plot in &plots {
        assert!(plot.area >= config.min_building_area);
    }
}

#[test]
fn spur_edge_is_pruned() {
    let (mut graph, terrain, config) = setup();
    // Hang a dead-end segment off one corner of the loop.
    let tip = graph.add_node(Vec2::new(-8.0, 0.0));
    graph.add_edge(0, tip, false);
    let mut plots = plots::generate(&graph, &terrain, &config);
    let removed = plots::cleanup(&mut graph, &terrain, &config, &mut plots);
    assert!(removed >= 1);
    assert!(graph.node(tip).is_none(), "isolated spur node survives");
    assert_eq!(graph.edge_count(), 4);
}
