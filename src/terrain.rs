//! External-collaborator predicates for water and city extent.
//!
//! The real water-body and boundary/density generators live outside this
//! crate; the pipeline only sees this trait. Two small implementations are
//! provided so the pipeline runs standalone and in tests.

use crate::model::Vec2;

pub trait Terrain {
    fn is_point_in_water(&self, p: Vec2) -> bool;
    /// Distance to the nearest water body; large when there is none.
    fn distance_to_water(&self, p: Vec2) -> f32;
    fn is_point_inside_city(&self, p: Vec2) -> bool;
    /// Local urban density in [0, 1].
    fn urban_density(&self, p: Vec2) -> f32;
}

/// Dry world with a circular city and radial density falloff.
#[derive(Clone, Copy, Debug)]
pub struct Flatland {
    pub center: Vec2,
    pub city_radius: f32,
}

impl Flatland {
    pub fn new(center: Vec2, city_radius: f32) -> Self {
        Flatland {
            center,
            city_radius,
        }
    }
}

impl Terrain for Flatland {
    fn is_point_in_water(&self, _p: Vec2) -> bool {
        false
    }

    fn distance_to_water(&self, _p: Vec2) -> f32 {
        f32::MAX
    }

    fn is_point_inside_city(&self, p: Vec2) -> bool {
        p.distance(self.center) <= self.city_radius
    }

    fn urban_density(&self, p: Vec2) -> f32 {
        let d = p.distance(self.center) / self.city_radius.max(1.0);
        (1.0 - d * d).clamp(0.0, 1.0)
    }
}

/// A horizontal river band across the world, circular city otherwise.
#[derive(Clone, Copy, Debug)]
pub struct BandRiver {
    pub center: Vec2,
    pub city_radius: f32,
    pub river_y: f32,
    pub half_width: f32,
}

impl BandRiver {
    pub fn new(center: Vec2, city_radius: f32, river_y: f32, half_width: f32) -> Self {
        BandRiver {
            center,
            city_radius,
            river_y,
            half_width,
        }
    }
}

impl Terrain for BandRiver {
    fn is_point_in_water(&self, p: Vec2) -> bool {
        (p.y - self.river_y).abs() <= self.half_width
    }

    fn distance_to_water(&self, p: Vec2) -> f32 {
        ((p.y - self.river_y).abs() - self.half_width).max(0.0)
    }

    fn is_point_inside_city(&self, p: Vec2) -> bool {
        p.distance(self.center) <= self.city_radius
    }

    fn urban_density(&self, p: Vec2) -> f32 {
        if self.is_point_in_water(p) {
            return 0.0;
        }
        let d = p.distance(self.center) / self.city_radius.max(1.0);
        (1.0 - d * d).clamp(0.0, 1.0)
    }
}
