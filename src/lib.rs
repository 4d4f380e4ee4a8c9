//! Procedural city generation: a tick-driven road-growth automaton, planar
//! plot extraction over the resulting road graph, and recursive building
//! subdivision inside the plots.
//!
//! [`CityMap`] is the facade a driver (renderer, CLI, test) talks to. The
//! intended loop is: `step()` until the agent set empties or long enough,
//! `generate_blocks()`, optionally `cleanup()`, then the chunked
//! `start_building_generation()` / `step_building_generation()` pair.
//! All randomness flows from one seeded generator, so the same seed and the
//! same call sequence reproduce an identical map.

pub mod config;
pub mod graph;
pub mod model;
pub mod terrain;

pub mod geometry {
    pub mod intersect;
    pub mod math;
    pub mod polygon;
    pub mod tolerance;
}

pub mod algorithms {
    pub mod buildings;
    pub mod faces;
    pub mod growth;
    pub mod plots;
    pub mod spatial;
    pub mod strips;
}

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use crate::algorithms::buildings::{subdivide_plot, RoadSegment, BUILDING_HASH_CELL};
use crate::algorithms::growth::GrowthAutomaton;
use crate::algorithms::plots;
use crate::algorithms::spatial::SpatialHash;
use crate::config::GenerationConfig;
use crate::graph::RoadGraph;
use crate::model::{Agent, Building, Edge, Node, Plot};
use crate::terrain::Terrain;

pub use crate::config::{CityLimit, GrowthStrategy};
pub use crate::model::Vec2;

pub struct CityMap {
    config: GenerationConfig,
    terrain: Box<dyn Terrain>,
    rng: ChaCha8Rng,
    graph: RoadGraph,
    automaton: GrowthAutomaton,
    plots: Vec<Plot>,
    buildings: Vec<Building>,
    courtyards: Vec<Building>,
    building_hash: SpatialHash,
    /// Index of the next plot to subdivide; `None` when no run is active.
    building_cursor: Option<usize>,
    next_building_id: u32,
}

impl CityMap {
    pub fn new(config: GenerationConfig, terrain: Box<dyn Terrain>) -> Self {
        CityMap::with_seed(config, terrain, 0)
    }

    /// Same as [`CityMap::new`] but with an explicit RNG seed; the same seed
    /// and call sequence reproduce the same map.
    pub fn with_seed(config: GenerationConfig, terrain: Box<dyn Terrain>, seed: u64) -> Self {
        let mut map = CityMap {
            config,
            terrain,
            rng: ChaCha8Rng::seed_from_u64(seed),
            graph: RoadGraph::new(),
            automaton: GrowthAutomaton::new(),
            plots: Vec::new(),
            buildings: Vec::new(),
            courtyards: Vec::new(),
            building_hash: SpatialHash::new(BUILDING_HASH_CELL),
            building_cursor: None,
            next_building_id: 0,
        };
        map.reset_roads();
        map
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Discard the whole map and respawn the initial agents.
    pub fn reset_roads(&mut self) {
        self.graph.clear();
        self.clear_blocks();
        self.automaton.seed(&mut self.graph, &self.config);
    }

    /// Advance road growth by one tick.
    pub fn step(&mut self) {
        self.automaton.step(
            &mut self.graph,
            self.terrain.as_ref(),
            &self.config,
            &mut self.rng,
        );
    }

    pub fn active_agent_count(&self) -> usize {
        self.automaton.agents().len()
    }

    /// Run plot extraction to completion over the current road graph.
    /// Replaces any previous plots and invalidates buildings.
    pub fn generate_blocks(&mut self) {
        self.clear_buildings();
        self.plots = plots::generate(&self.graph, self.terrain.as_ref(), &self.config);
        debug!("generated {} plots", self.plots.len());
    }

    /// Repair the road graph (spurs, unbuildable plots, empty loops) and
    /// regenerate plots until stable. Returns the number of edges removed;
    /// zero means the map was already stable.
    pub fn cleanup(&mut self) -> usize {
        self.clear_buildings();
        plots::cleanup(
            &mut self.graph,
            self.terrain.as_ref(),
            &self.config,
            &mut self.plots,
        )
    }

    pub fn clear_blocks(&mut self) {
        self.plots.clear();
        self.clear_buildings();
    }

    pub fn clear_buildings(&mut self) {
        self.buildings.clear();
        self.courtyards.clear();
        self.building_hash.clear();
        self.building_cursor = None;
        self.next_building_id = 0;
    }

    /// Begin a chunked building-subdivision run over the current plots.
    pub fn start_building_generation(&mut self) {
        self.clear_buildings();
        self.building_cursor = Some(0);
    }

    /// Subdivide the next batch of plots. Returns `true` while more plots
    /// remain, `false` once the run is complete (or none is active).
    pub fn step_building_generation(&mut self) -> bool {
        let cursor = match self.building_cursor {
            Some(c) => c,
            None => return false,
        };
        let end = (cursor + self.config.building_batch.max(1)).min(self.plots.len());
        for i in cursor..end {
            let roads = frontage_segments(&self.graph, &self.plots[i]);
            subdivide_plot(
                &self.plots[i],
                &roads,
                &self.config,
                &mut self.rng,
                &mut self.building_hash,
                &mut self.buildings,
                &mut self.courtyards,
                &mut self.next_building_id,
            );
        }
        if end >= self.plots.len() {
            self.building_cursor = None;
            debug!(
                "building generation done: {} buildings, {} courtyards",
                self.buildings.len(),
                self.courtyards.len()
            );
            false
        } else {
            self.building_cursor = Some(end);
            true
        }
    }

    // Read-only snapshots for a rendering layer.

    pub fn nodes(&self) -> impl Iterator<Item = (u32, &Node)> + '_ {
        self.graph.node_ids().filter_map(|id| {
            self.graph.node(id).map(|n| (id, n))
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = (u32, &Edge)> + '_ {
        self.graph.edges_iter()
    }

    pub fn bridge_edges(&self) -> Vec<u32> {
        self.graph
            .edges_iter()
            .filter(|(_, e)| e.bridge)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn agents(&self) -> &[Agent] {
        self.automaton.agents()
    }

    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn courtyards(&self) -> &[Building] {
        &self.courtyards
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// Whole-map snapshot for serialization or a JS rendering layer.
    pub fn to_json_value(&self) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = self
            .nodes()
            .map(|(id, n)| json!({ "id": id, "x": n.pos.x, "y": n.pos.y }))
            .collect();
        let edges: Vec<serde_json::Value> = self
            .edges()
            .map(|(id, e)| json!({ "id": id, "a": e.a, "b": e.b, "bridge": e.bridge }))
            .collect();
        json!({
            "nodes": nodes,
            "edges": edges,
            "plots": self.plots,
            "buildings": self.buildings,
            "courtyards": self.courtyards,
        })
    }
}

/// Resolve a plot's frontage edge ids to positioned road segments.
fn frontage_segments(graph: &RoadGraph, plot: &Plot) -> Vec<RoadSegment> {
    plot.frontage
        .iter()
        .filter_map(|&eid| {
            let e = graph.edge(eid)?;
            let a = graph.pos(e.a)?;
            let b = graph.pos(e.b)?;
            Some(RoadSegment { edge_id: eid, a, b })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Flatland;

    fn city() -> CityMap {
        let config = GenerationConfig::default();
        let terrain = Flatland::new(config.center(), config.city_radius());
        CityMap::with_seed(config, Box::new(terrain), 99)
    }

    #[test]
    fn full_pipeline_produces_buildings() {
        let mut map = city();
        for _ in 0..300 {
            map.step();
        }
        map.generate_blocks();
        assert!(!map.plots().is_empty());
        map.start_building_generation();
        while map.step_building_generation() {}
        assert!(!map.buildings().is_empty());
    }

    #[test]
    fn clear_blocks_also_drops_buildings() {
        let mut map = city();
        for _ in 0..200 {
            map.step();
        }
        map.generate_blocks();
        map.start_building_generation();
        while map.step_building_generation() {}
        map.clear_blocks();
        assert!(map.plots().is_empty());
        assert!(map.buildings().is_empty());
        assert!(map.courtyards().is_empty());
    }

    #[test]
    fn json_snapshot_has_all_sections() {
        let mut map = city();
        for _ in 0..100 {
            map.step();
        }
        map.generate_blocks();
        let v = map.to_json_value();
        for key in ["nodes", "edges", "plots", "buildings", "courtyards"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert!(!v["nodes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn step_building_generation_without_start_is_a_no_op() {
        let mut map = city();
        assert!(!map.step_building_generation());
        assert!(map.buildings().is_empty());
    }
}
