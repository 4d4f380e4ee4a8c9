use serde::{Deserialize, Serialize};

use crate::geometry::tolerance::EPS_LEN;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn dot(self, o: Vec2) -> f32 {
        self.x * o.x + self.y * o.y
    }

    #[inline]
    pub fn cross(self, o: Vec2) -> f32 {
        self.x * o.y - self.y * o.x
    }

    /// Counter-clockwise perpendicular (left normal for a direction vector).
    #[inline]
    pub fn perp(self) -> Vec2 {
        Vec2 {
            x: -self.y,
            y: self.x,
        }
    }

    #[inline]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    #[inline]
    pub fn from_angle(a: f32) -> Vec2 {
        Vec2 {
            x: a.cos(),
            y: a.sin(),
        }
    }

    #[inline]
    pub fn distance(self, o: Vec2) -> f32 {
        (self - o).length()
    }

    /// Unit vector, or `fallback` when the input is degenerate.
    pub fn normalized_or(self, fallback: Vec2) -> Vec2 {
        let len = self.length();
        if len > EPS_LEN {
            Vec2 {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            fallback
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

/// Directed half-edge key `u -> v`: the left-hand side of the road segment
/// from node `u` to node `v`. The key space is directional so the two sides
/// of one physical edge can back two independent plots.
pub type HalfEdgeKey = (u32, u32);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub pos: Vec2,
    /// Neighbor node ids in insertion order; adjacency is symmetric.
    pub neighbors: Vec<u32>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub a: u32,
    pub b: u32,
    pub bridge: bool,
}

impl Edge {
    /// The endpoint opposite to `n`, if `n` is an endpoint at all.
    pub fn other(&self, n: u32) -> Option<u32> {
        if self.a == n {
            Some(self.b)
        } else if self.b == n {
            Some(self.a)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentRole {
    Plain,
    /// Radial growth: travels outward along the center-to-position direction.
    Spoke,
    /// Radial growth: travels tangential to the center-to-position direction.
    Ring,
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub pos: Vec2,
    pub heading: f32,
    /// Node this agent last emitted from.
    pub from_node: u32,
    pub steps_since_branch: u32,
    pub role: AgentRole,
    pub following_river: bool,
    /// Count of "one last exit" continuations taken past a hard city limit.
    pub exits_taken: u32,
}

impl Agent {
    pub fn new(pos: Vec2, heading: f32, from_node: u32, role: AgentRole) -> Self {
        Agent {
            pos,
            heading,
            from_node,
            steps_since_branch: 0,
            role,
            following_river: false,
            exits_taken: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlotKind {
    /// Urban-core plot traced from an enclosed planar face.
    Enclosed,
    /// Suburban plot extruded from a chain of road segments.
    Strip,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plot {
    pub id: u32,
    /// Simple polygon, counter-clockwise.
    pub polygon: Vec<Vec2>,
    pub kind: PlotKind,
    pub area: f32,
    /// Road edge ids this plot fronts onto.
    pub frontage: Vec<u32>,
    /// Directed half-edge keys claimed by this plot.
    pub claimed: Vec<HalfEdgeKey>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Building {
    pub id: u32,
    pub polygon: Vec<Vec2>,
    pub centroid: Vec2,
    /// Courtyards skip the collision gate and are reported separately.
    pub courtyard: bool,
}
