//! Road network storage: an id-arena of nodes and edges with symmetric
//! adjacency. Ids are stable (index into the arena); removed slots stay
//! `None` so ids held by plots or agents never dangle into another element.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node, Vec2};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoadGraph {
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) edges: Vec<Option<Edge>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        RoadGraph::default()
    }

    pub fn add_node(&mut self, pos: Vec2) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Some(Node {
            pos,
            neighbors: Vec::new(),
        }));
        id
    }

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.get(id as usize).and_then(|n| n.as_ref())
    }

    pub fn pos(&self, id: u32) -> Option<Vec2> {
        self.node(id).map(|n| n.pos)
    }

    pub fn degree(&self, id: u32) -> usize {
        self.node(id).map(|n| n.neighbors.len()).unwrap_or(0)
    }

    pub fn edge(&self, id: u32) -> Option<&Edge> {
        self.edges.get(id as usize).and_then(|e| e.as_ref())
    }

    /// Edge id for the unordered pair, if connected.
    pub fn find_edge(&self, a: u32, b: u32) -> Option<u32> {
        for (eid, e) in self.edges.iter().enumerate() {
            if let Some(e) = e {
                if (e.a == a && e.b == b) || (e.a == b && e.b == a) {
                    return Some(eid as u32);
                }
            }
        }
        None
    }

    /// Connect two nodes. Refuses self-loops, missing endpoints, and
    /// duplicate unordered pairs; adjacency stays symmetric.
    pub fn add_edge(&mut self, a: u32, b: u32, bridge: bool) -> Option<u32> {
        if a == b {
            return None;
        }
        if self.node(a).is_none() || self.node(b).is_none() {
            return None;
        }
        if self.node(a).map(|n| n.neighbors.contains(&b)) == Some(true) {
            return None;
        }
        let id = self.edges.len() as u32;
        self.edges.push(Some(Edge { a, b, bridge }));
        if let Some(Some(n)) = self.nodes.get_mut(a as usize) {
            n.neighbors.push(b);
        }
        if let Some(Some(n)) = self.nodes.get_mut(b as usize) {
            n.neighbors.push(a);
        }
        Some(id)
    }

    pub fn remove_edge(&mut self, id: u32) -> bool {
        let (a, b) = match self.edge(id) {
            Some(e) => (e.a, e.b),
            None => return false,
        };
        self.edges[id as usize] = None;
        if let Some(Some(n)) = self.nodes.get_mut(a as usize) {
            n.neighbors.retain(|&x| x != b);
        }
        if let Some(Some(n)) = self.nodes.get_mut(b as usize) {
            n.neighbors.retain(|&x| x != a);
        }
        true
    }

    /// Remove a node and every incident edge.
    pub fn remove_node(&mut self, id: u32) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        let incident: Vec<u32> = self
            .edges
            .iter()
            .enumerate()
            .filter_map(|(eid, e)| {
                e.as_ref()
                    .filter(|e| e.a == id || e.b == id)
                    .map(|_| eid as u32)
            })
            .collect();
        for eid in incident {
            self.remove_edge(eid);
        }
        self.nodes[id as usize] = None;
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| i as u32))
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| i as u32))
    }

    pub fn edges_iter(&self) -> impl Iterator<Item = (u32, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (i as u32, e)))
    }

    /// Nearest live node to `p` within `radius`, excluding `exclude`.
    pub fn nearest_node_within(&self, p: Vec2, radius: f32, exclude: Option<u32>) -> Option<u32> {
        let r2 = radius * radius;
        let mut best: Option<(u32, f32)> = None;
        for (i, n) in self.nodes.iter().enumerate() {
            let n = match n {
                Some(n) => n,
                None => continue,
            };
            if exclude == Some(i as u32) {
                continue;
            }
            let d2 = (n.pos - p).length_sq();
            if d2 <= r2 && best.map(|(_, bd)| d2 < bd).unwrap_or(true) {
                best = Some((i as u32, d2));
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn nearest_node(&self, p: Vec2) -> Option<u32> {
        self.nearest_node_within(p, f32::INFINITY, None)
    }

    /// Per-node neighbor lists sorted by outgoing angle, the view face
    /// tracing walks. Built once per extraction pass.
    pub fn angle_sorted_adjacency(&self) -> HashMap<u32, Vec<u32>> {
        let mut adj = HashMap::new();
        for (i, n) in self.nodes.iter().enumerate() {
            let n = match n {
                Some(n) => n,
                None => continue,
            };
            let mut list: Vec<(u32, f32)> = n
                .neighbors
                .iter()
                .filter_map(|&nb| self.pos(nb).map(|p| (nb, (p - n.pos).angle())))
                .collect();
            list.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.0.cmp(&b.0)));
            adj.insert(i as u32, list.into_iter().map(|(id, _)| id).collect());
        }
        adj
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_symmetric() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0));
        let b = g.add_node(Vec2::new(10.0, 0.0));
        g.add_edge(a, b, false).unwrap();
        assert!(g.node(a).unwrap().neighbors.contains(&b));
        assert!(g.node(b).unwrap().neighbors.contains(&a));
    }

    #[test]
    fn duplicate_and_self_edges_rejected() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0));
        let b = g.add_node(Vec2::new(10.0, 0.0));
        assert!(g.add_edge(a, b, false).is_some());
        assert!(g.add_edge(b, a, false).is_none());
        assert!(g.add_edge(a, a, false).is_none());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn remove_node_cleans_incident_edges() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0));
        let b = g.add_node(Vec2::new(10.0, 0.0));
        let c = g.add_node(Vec2::new(20.0, 0.0));
        g.add_edge(a, b, false).unwrap();
        g.add_edge(b, c, false).unwrap();
        assert!(g.remove_node(b));
        assert_eq!(g.edge_count(), 0);
        assert!(g.node(a).unwrap().neighbors.is_empty());
        assert!(g.node(c).unwrap().neighbors.is_empty());
    }

    #[test]
    fn angle_sorted_adjacency_orders_ccw() {
        let mut g = RoadGraph::new();
        let c = g.add_node(Vec2::new(0.0, 0.0));
        let right = g.add_node(Vec2::new(10.0, 0.0));
        let up = g.add_node(Vec2::new(0.0, 10.0));
        let left = g.add_node(Vec2::new(-10.0, 0.0));
        g.add_edge(c, up, false);
        g.add_edge(c, left, false);
        g.add_edge(c, right, false);
        let adj = g.angle_sorted_adjacency();
        // Ascending angle: right (0), up (pi/2), left (pi).
        assert_eq!(adj[&c], vec![right, up, left]);
    }
}
