use serde::{Deserialize, Serialize};

use crate::model::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthStrategy {
    Organic,
    Grid,
    Radial,
}

/// How the city boundary is enforced on growth agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CityLimit {
    /// Agents leaving the city get a geometrically decaying chance of one
    /// last continuation, then die.
    Hard,
    /// Termination probability scales with how empty the area is.
    Soft,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub world_width: f32,
    pub world_height: f32,
    pub strategy: GrowthStrategy,
    /// Per-step base branch probability; accumulates as `1 - (1-p)^steps`.
    pub branch_probability: f32,
    pub segment_length: f32,
    /// City radius as a fraction of the half world extent.
    pub city_size_fraction: f32,
    pub city_limit: CityLimit,
    pub min_building_area: f32,
    pub max_building_area: f32,
    /// Minimum oriented-bounding-box width for plots (sliver rejection).
    pub min_edge_length: f32,
    pub min_interior_angle_deg: f32,
    /// Lot-width randomization in [0, 1]; 0 gives uniform subdivision.
    pub building_irregularity: f32,
    /// Depth lots are trimmed to from their frontage road.
    pub lot_depth: f32,
    /// Gap between road centerline and plot front edge.
    pub sidewalk: f32,
    pub bridge_max_width: f32,
    /// Bridge probability decays to zero within this distance of another bridge.
    pub bridge_spacing: f32,
    /// Plots subdivided per `step_building_generation` call.
    pub building_batch: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            world_width: 500.0,
            world_height: 500.0,
            strategy: GrowthStrategy::Organic,
            branch_probability: 0.05,
            segment_length: 10.0,
            city_size_fraction: 0.7,
            city_limit: CityLimit::Soft,
            min_building_area: 30.0,
            max_building_area: 150.0,
            min_edge_length: 4.0,
            min_interior_angle_deg: 20.0,
            building_irregularity: 0.4,
            lot_depth: 18.0,
            sidewalk: 2.0,
            bridge_max_width: 60.0,
            bridge_spacing: 80.0,
            building_batch: 8,
        }
    }
}

impl GenerationConfig {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.world_width * 0.5, self.world_height * 0.5)
    }

    pub fn world_area(&self) -> f32 {
        self.world_width * self.world_height
    }

    pub fn city_radius(&self) -> f32 {
        0.5 * self.world_width.min(self.world_height) * self.city_size_fraction
    }

    pub fn in_bounds(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.world_width && p.y <= self.world_height
    }
}
