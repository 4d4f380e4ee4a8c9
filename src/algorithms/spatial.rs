//! Uniform-grid spatial hash used to bound building collision checks.

use std::collections::HashMap;

pub type Aabb = (f32, f32, f32, f32); // minx, miny, maxx, maxy

#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell: f32,
    cells: HashMap<(i32, i32), Vec<u32>>,
}

#[inline]
fn cell_ix(cell: f32, x: f32) -> i32 {
    (x / cell).floor() as i32
}

impl SpatialHash {
    pub fn new(cell: f32) -> Self {
        SpatialHash {
            cell: cell.max(1.0),
            cells: HashMap::new(),
        }
    }

    fn span(&self, bbox: Aabb) -> (i32, i32, i32, i32) {
        (
            cell_ix(self.cell, bbox.0),
            cell_ix(self.cell, bbox.1),
            cell_ix(self.cell, bbox.2),
            cell_ix(self.cell, bbox.3),
        )
    }

    /// Register `id` under every cell its bounding box spans.
    pub fn insert(&mut self, id: u32, bbox: Aabb) {
        let (ix0, iy0, ix1, iy1) = self.span(bbox);
        for ix in ix0..=ix1 {
            for iy in iy0..=iy1 {
                self.cells.entry((ix, iy)).or_default().push(id);
            }
        }
    }

    /// Ids sharing any cell with `bbox`, deduplicated.
    pub fn query(&self, bbox: Aabb) -> Vec<u32> {
        let (ix0, iy0, ix1, iy1) = self.span(bbox);
        let mut out: Vec<u32> = Vec::new();
        for ix in ix0..=ix1 {
            for iy in iy0..=iy1 {
                if let Some(list) = self.cells.get(&(ix, iy)) {
                    out.extend_from_slice(list);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_query_nearby() {
        let mut h = SpatialHash::new(10.0);
        h.insert(1, (0.0, 0.0, 5.0, 5.0));
        h.insert(2, (100.0, 100.0, 105.0, 105.0));
        let near = h.query((2.0, 2.0, 8.0, 8.0));
        assert_eq!(near, vec![1]);
        let far = h.query((90.0, 90.0, 120.0, 120.0));
        assert_eq!(far, vec![2]);
    }

    #[test]
    fn spanning_box_found_from_every_cell() {
        let mut h = SpatialHash::new(10.0);
        h.insert(7, (0.0, 0.0, 35.0, 5.0));
        assert_eq!(h.query((30.0, 0.0, 31.0, 1.0)), vec![7]);
        assert_eq!(h.query((1.0, 1.0, 2.0, 2.0)), vec![7]);
    }
}
