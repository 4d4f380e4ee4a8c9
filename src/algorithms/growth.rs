//! Agent-based road growth.
//!
//! Each tick every active agent steers by its strategy, walks one segment,
//! and either merges into a nearby node, dies, or emits a new node and edge.
//! Rivers are handled by a follow-shoreline mode and probabilistic bridges;
//! interior holes the frontier has grown past are reseeded by a periodic
//! gap-fill sweep.

use std::f32::consts::{FRAC_PI_2, TAU};

use log::debug;
use rand::Rng;

use crate::config::{CityLimit, GenerationConfig, GrowthStrategy};
use crate::graph::RoadGraph;
use crate::model::{Agent, AgentRole, Vec2};
use crate::terrain::Terrain;

/// Max heading perturbation per tick for organic growth, radians.
const ORGANIC_WOBBLE: f32 = 0.15;

/// Per-tick death probability of radial ring agents.
const RING_DEATH_PROB: f32 = 0.02;

/// Per-tick stop probability factor under a soft city limit.
const SOFT_STOP_SCALE: f32 = 0.3;

/// Shoreline-hugging heading nudge, radians.
const RIVER_NUDGE: f32 = 0.2;

/// Turn applied when both riverside probes are wet, radians.
const RIVER_SHARP_TURN: f32 = 1.6;

/// Snap-merge radius as a fraction of segment length.
const MERGE_RADIUS_GRID: f32 = 0.45;
const MERGE_RADIUS_LOOSE: f32 = 0.75;

/// Chance a branch roll emits a second agent on the opposite side.
const DOUBLE_BRANCH_PROB: f32 = 0.3;

const GAP_FILL_INTERVAL: u64 = 20;
const GAP_FILL_MIN_NODES: usize = 50;
const GAP_FILL_SAMPLES: usize = 5;
const GAP_FILL_DIRS: usize = 8;
const GAP_FILL_MIN_HITS: usize = 6;

/// Outcome of one agent's tick.
enum Fate {
    Alive,
    Dead,
}

pub struct GrowthAutomaton {
    agents: Vec<Agent>,
    tick: u64,
}

impl Default for GrowthAutomaton {
    fn default() -> Self {
        GrowthAutomaton::new()
    }
}

impl GrowthAutomaton {
    pub fn new() -> Self {
        GrowthAutomaton {
            agents: Vec::new(),
            tick: 0,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Clear all agent state and spawn the initial set at the world center.
    pub fn seed(&mut self, graph: &mut RoadGraph, config: &GenerationConfig) {
        self.agents.clear();
        self.tick = 0;
        let center = config.center();
        let origin = graph.add_node(center);

        match config.strategy {
            GrowthStrategy::Organic => {
                for i in 0..6 {
                    let heading = i as f32 * TAU / 6.0;
                    self.agents
                        .push(Agent::new(center, heading, origin, AgentRole::Plain));
                }
            }
            GrowthStrategy::Grid => {
                for i in 0..4 {
                    let heading = i as f32 * FRAC_PI_2;
                    self.agents
                        .push(Agent::new(center, heading, origin, AgentRole::Plain));
                }
            }
            GrowthStrategy::Radial => {
                let spokes = 5usize;
                for i in 0..spokes {
                    let heading = i as f32 * TAU / spokes as f32;
                    self.agents
                        .push(Agent::new(center, heading, origin, AgentRole::Spoke));
                }
                // Ring agents start on an inner circle, each from its own
                // node; spokes and rings knit together by snap-merging.
                let ring_r = 2.0 * config.segment_length;
                for i in 0..spokes {
                    let a = (i as f32 + 0.5) * TAU / spokes as f32;
                    let pos = center + Vec2::from_angle(a) * ring_r;
                    let node = graph.add_node(pos);
                    self.agents
                        .push(Agent::new(pos, a + FRAC_PI_2, node, AgentRole::Ring));
                }
            }
        }
        debug!(
            "seeded {} agents ({:?})",
            self.agents.len(),
            config.strategy
        );
    }

    /// Advance every active agent by one tick.
    pub fn step(
        &mut self,
        graph: &mut RoadGraph,
        terrain: &dyn Terrain,
        config: &GenerationConfig,
        rng: &mut impl Rng,
    ) {
        self.tick += 1;
        let mut agents = std::mem::take(&mut self.agents);
        let mut spawned: Vec<Agent> = Vec::new();

        // Stable processing order keeps seeded runs reproducible.
        agents.retain_mut(|agent| {
            match step_agent(agent, graph, terrain, config, rng, &mut spawned) {
                Fate::Alive => true,
                Fate::Dead => false,
            }
        });
        agents.extend(spawned);
        self.agents = agents;

        if self.tick % GAP_FILL_INTERVAL == 0 && graph.node_count() >= GAP_FILL_MIN_NODES {
            self.gap_fill(graph, terrain, config, rng);
        }
    }

    /// Reseed interior points the frontier has grown past: far from any node
    /// yet surrounded by the network in most directions.
    fn gap_fill(
        &mut self,
        graph: &mut RoadGraph,
        terrain: &dyn Terrain,
        config: &GenerationConfig,
        rng: &mut impl Rng,
    ) {
        let center = config.center();
        let city_r = config.city_radius();
        let seg = config.segment_length;
        let reach = 4.0 * seg;

        for _ in 0..GAP_FILL_SAMPLES {
            let r = city_r * rng.gen::<f32>().sqrt();
            let p = center + Vec2::from_angle(rng.gen::<f32>() * TAU) * r;
            if terrain.is_point_in_water(p) {
                continue;
            }
            let nearest = match graph.nearest_node(p) {
                Some(n) => n,
                None => continue,
            };
            let near_pos = match graph.pos(nearest) {
                Some(q) => q,
                None => continue,
            };
            if near_pos.distance(p) <= 2.5 * seg {
                continue;
            }

            // Directional coverage: bucket nearby nodes into 8 sectors.
            let mut sectors = [false; GAP_FILL_DIRS];
            for nid in graph.node_ids() {
                let q = match graph.pos(nid) {
                    Some(q) => q,
                    None => continue,
                };
                let off = q - p;
                if off.length() > reach {
                    continue;
                }
                let frac = (off.angle() + TAU) % TAU / TAU;
                let bucket = ((frac * GAP_FILL_DIRS as f32) as usize) % GAP_FILL_DIRS;
                sectors[bucket] = true;
            }
            let hits = sectors.iter().filter(|s| **s).count();
            if hits < GAP_FILL_MIN_HITS {
                continue;
            }

            let node = graph.add_node(p);
            graph.add_edge(node, nearest, false);
            let jitter = match config.strategy {
                GrowthStrategy::Grid => 0.0,
                _ => rng.gen::<f32>() * FRAC_PI_2,
            };
            for i in 0..4 {
                let heading = i as f32 * FRAC_PI_2 + jitter;
                self.agents
                    .push(Agent::new(p, heading, node, AgentRole::Plain));
            }
            debug!("gap-fill node {node} at ({:.1}, {:.1})", p.x, p.y);
        }
    }
}

fn step_agent(
    agent: &mut Agent,
    graph: &mut RoadGraph,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    rng: &mut impl Rng,
    spawned: &mut Vec<Agent>,
) -> Fate {
    // Ring agents wind down on their own, independent of everything else.
    if agent.role == AgentRole::Ring && rng.gen::<f32>() < RING_DEATH_PROB {
        return Fate::Dead;
    }

    steer(agent, config, rng);
    if agent.following_river {
        steer_along_river(agent, terrain, config, rng);
    }

    let seg = config.segment_length;
    let next = agent.pos + Vec2::from_angle(agent.heading) * seg;
    if !config.in_bounds(next) {
        return Fate::Dead;
    }

    if !terrain.is_point_inside_city(next) {
        match config.city_limit {
            CityLimit::Hard => {
                let p_exit = 0.5f32.powi(agent.exits_taken as i32 + 1);
                if rng.gen::<f32>() < p_exit {
                    agent.exits_taken += 1;
                } else {
                    return Fate::Dead;
                }
            }
            CityLimit::Soft => {
                let density = terrain.urban_density(next);
                if rng.gen::<f32>() < (1.0 - density) * SOFT_STOP_SCALE {
                    return Fate::Dead;
                }
            }
        }
    }

    let next_wet = terrain.is_point_in_water(next);
    if next_wet && !terrain.is_point_in_water(agent.pos) {
        if agent.following_river {
            // Shore-hugging failed to keep the agent dry.
            return Fate::Dead;
        }
        return match try_bridge(agent, graph, terrain, config, rng) {
            BridgeOutcome::Crossed => Fate::Alive,
            BridgeOutcome::FollowRiver => {
                agent.following_river = true;
                Fate::Alive
            }
        };
    }

    // Snap-merge: joining an existing node closes a loop and ends the agent.
    let merge_radius = seg
        * match config.strategy {
            GrowthStrategy::Grid => MERGE_RADIUS_GRID,
            _ => MERGE_RADIUS_LOOSE,
        };
    if let Some(target) = graph.nearest_node_within(next, merge_radius, Some(agent.from_node)) {
        graph.add_edge(agent.from_node, target, false);
        return Fate::Dead;
    }

    let node = graph.add_node(next);
    graph.add_edge(agent.from_node, node, false);
    agent.pos = next;
    agent.from_node = node;
    agent.steps_since_branch += 1;

    maybe_branch(agent, node, terrain, config, rng, spawned);
    Fate::Alive
}

/// Per-strategy heading rule; river mode may override afterwards.
fn steer(agent: &mut Agent, config: &GenerationConfig, rng: &mut impl Rng) {
    match (config.strategy, agent.role) {
        (GrowthStrategy::Radial, AgentRole::Spoke) => {
            let out = agent.pos - config.center();
            if out.length() > config.segment_length * 0.5 {
                agent.heading = out.angle();
            }
        }
        (GrowthStrategy::Radial, AgentRole::Ring) => {
            let out = agent.pos - config.center();
            let tangent = out.perp().normalized_or(Vec2::from_angle(agent.heading));
            let fwd = Vec2::from_angle(agent.heading);
            // Keep travelling the same way around the center.
            agent.heading = if tangent.dot(fwd) >= 0.0 {
                tangent.angle()
            } else {
                (tangent * -1.0).angle()
            };
        }
        (GrowthStrategy::Grid, _) => {} // heading only changes at branches
        _ => {
            agent.heading += (rng.gen::<f32>() - 0.5) * 2.0 * ORGANIC_WOBBLE;
        }
    }
}

/// Shoreline probe: two points offset a segment length to either side.
fn steer_along_river(
    agent: &mut Agent,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    rng: &mut impl Rng,
) {
    let seg = config.segment_length;
    let left = agent.pos + Vec2::from_angle(agent.heading + FRAC_PI_2) * seg;
    let right = agent.pos + Vec2::from_angle(agent.heading - FRAC_PI_2) * seg;
    let left_wet = terrain.is_point_in_water(left);
    let right_wet = terrain.is_point_in_water(right);
    match (left_wet, right_wet) {
        (false, false) => agent.following_river = false,
        (true, true) => {
            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            agent.heading += sign * RIVER_SHARP_TURN;
        }
        (true, false) => agent.heading -= RIVER_NUDGE,
        (false, true) => agent.heading += RIVER_NUDGE,
    }
}

enum BridgeOutcome {
    Crossed,
    FollowRiver,
}

/// Direction into the water from the local gradient of distance-to-water,
/// so crossings run perpendicular to the shoreline. Flat distance fields
/// (no water anywhere) fall back to `fallback`.
fn toward_water(p: Vec2, terrain: &dyn Terrain, fallback: Vec2) -> Vec2 {
    let h = 1.0;
    let gx = terrain.distance_to_water(p + Vec2::new(h, 0.0))
        - terrain.distance_to_water(p - Vec2::new(h, 0.0));
    let gy = terrain.distance_to_water(p + Vec2::new(0.0, h))
        - terrain.distance_to_water(p - Vec2::new(0.0, h));
    (Vec2::new(gx, gy) * -1.0).normalized_or(fallback)
}

/// Probe across the water perpendicular to the shoreline; place a bridge
/// edge to a dry landing node if the crossing is narrow enough and the
/// spacing roll passes. The landing only counts after at least one wet
/// probe, so a dry sample on the near shore can never become a "crossing".
fn try_bridge(
    agent: &mut Agent,
    graph: &mut RoadGraph,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    rng: &mut impl Rng,
) -> BridgeOutcome {
    let seg = config.segment_length;
    let heading_dir = Vec2::from_angle(agent.heading);
    let mut dir = toward_water(agent.pos, terrain, heading_dir);
    if dir.dot(heading_dir) < 0.0 {
        // Gradient pointing behind the agent: cross the way it was going.
        dir = heading_dir;
    }

    let step = 0.5 * seg;
    let mut landing: Option<Vec2> = None;
    let mut seen_wet = false;
    let mut s = step;
    while s <= config.bridge_max_width {
        let p = agent.pos + dir * s;
        if !config.in_bounds(p) {
            break;
        }
        if terrain.is_point_in_water(p) {
            seen_wet = true;
        } else if seen_wet {
            // First dry probe past the far shore; step a little further so
            // the landing node is comfortably on land.
            let candidate = agent.pos + dir * (s + step);
            landing = if config.in_bounds(candidate) && !terrain.is_point_in_water(candidate) {
                Some(candidate)
            } else {
                Some(p)
            };
            break;
        }
        s += step;
    }

    let landing = match landing {
        Some(p) => p,
        None => return BridgeOutcome::FollowRiver, // too wide, or no water hit
    };

    // Spacing: probability ramps from 0 at an existing bridge to 1 at
    // bridge_spacing away.
    let mut nearest_bridge = f32::INFINITY;
    for (_, e) in graph.edges_iter() {
        if !e.bridge {
            continue;
        }
        if let (Some(a), Some(b)) = (graph.pos(e.a), graph.pos(e.b)) {
            let mid = (a + b) * 0.5;
            nearest_bridge = nearest_bridge.min(mid.distance(agent.pos));
        }
    }
    let p_bridge = if nearest_bridge.is_finite() {
        (nearest_bridge / config.bridge_spacing).clamp(0.0, 1.0)
    } else {
        1.0
    };
    if rng.gen::<f32>() >= p_bridge {
        return BridgeOutcome::FollowRiver;
    }

    let merge_radius = seg * MERGE_RADIUS_LOOSE;
    let merge = graph.nearest_node_within(landing, merge_radius, Some(agent.from_node));
    let target = merge.and_then(|n| graph.pos(n)).unwrap_or(landing);
    // A snap-merge can pull the landing sideways; the span must still cross
    // the water or it is a road, not a bridge.
    let crosses = (1..8).any(|i| {
        let t = i as f32 / 8.0;
        terrain.is_point_in_water(agent.pos + (target - agent.pos) * t)
    });
    if !crosses {
        return BridgeOutcome::FollowRiver;
    }

    let node = match merge {
        Some(n) => n,
        None => graph.add_node(landing),
    };
    graph.add_edge(agent.from_node, node, true);
    debug!("bridge from node {} to node {node}", agent.from_node);
    agent.pos = graph.pos(node).unwrap_or(landing);
    agent.heading = dir.angle();
    agent.from_node = node;
    agent.following_river = false;
    agent.steps_since_branch += 1;
    BridgeOutcome::Crossed
}

/// Branch roll: probability accumulates with steps since the last branch
/// and scales with local density.
fn maybe_branch(
    agent: &mut Agent,
    node: u32,
    terrain: &dyn Terrain,
    config: &GenerationConfig,
    rng: &mut impl Rng,
    spawned: &mut Vec<Agent>,
) {
    let p = config.branch_probability.clamp(0.0, 1.0);
    let accumulated = 1.0 - (1.0 - p).powi(agent.steps_since_branch as i32);
    let density = terrain.urban_density(agent.pos);
    if rng.gen::<f32>() >= accumulated * density {
        return;
    }
    agent.steps_since_branch = 0;

    let organic = config.strategy == GrowthStrategy::Organic;
    let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
    let mut turn = FRAC_PI_2;
    if organic {
        turn += (rng.gen::<f32>() - 0.5) * 0.6;
    }
    spawned.push(Agent::new(
        agent.pos,
        agent.heading + sign * turn,
        node,
        AgentRole::Plain,
    ));
    if rng.gen::<f32>() < DOUBLE_BRANCH_PROB {
        let mut turn = FRAC_PI_2;
        if organic {
            turn += (rng.gen::<f32>() - 0.5) * 0.6;
        }
        spawned.push(Agent::new(
            agent.pos,
            agent.heading - sign * turn,
            node,
            AgentRole::Plain,
        ));
    }
}
