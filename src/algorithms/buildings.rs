//! Building subdivision: recursive half-plane lot partition, depth trimming
//! from the frontage road, and collision-gated footprint placement.

use log::trace;
use rand::Rng;

use crate::algorithms::spatial::SpatialHash;
use crate::config::GenerationConfig;
use crate::geometry::math::dist_point_to_seg;
use crate::geometry::polygon::{
    bbox_intersects, oriented_bbox, point_in_polygon, polygon_area, polygon_bbox,
    polygon_centroid, remove_collinear, split_polygon,
};
use crate::geometry::tolerance::MAX_SUBDIVIDE_DEPTH;
use crate::model::{Building, Plot, PlotKind, Vec2};

/// Frontage road segment of a plot, resolved to world positions.
#[derive(Clone, Copy, Debug)]
pub struct RoadSegment {
    pub edge_id: u32,
    pub a: Vec2,
    pub b: Vec2,
}

/// Fragments below this fraction of the minimum building area are dropped.
const TINY_AREA_FRACTION: f32 = 0.1;

/// Vertex deviation tolerance when straightening trimmed lot outlines.
const LOT_SIMPLIFY_TOL: f32 = 0.4;

/// Grid cell size of the building collision hash.
pub const BUILDING_HASH_CELL: f32 = 25.0;

fn frontage_tolerance(config: &GenerationConfig) -> f32 {
    config.sidewalk + 2.0
}

/// Recursive half-plane partition of a plot polygon into lots.
///
/// Splits perpendicular to nearby street frontage when a road is close
/// (maximizing the number of lots that face it), otherwise across the long
/// OBB axis to keep fragments square-ish. Split offsets are randomized by
/// the irregularity factor, so lot widths vary along a street.
pub fn smart_subdivide(
    polygon: &[Vec2],
    roads: &[RoadSegment],
    config: &GenerationConfig,
    rng: &mut impl Rng,
) -> Vec<Vec<Vec2>> {
    let mut out = Vec::new();
    subdivide_rec(polygon, roads, config, rng, 0, &mut out);
    out
}

fn subdivide_rec(
    polygon: &[Vec2],
    roads: &[RoadSegment],
    config: &GenerationConfig,
    rng: &mut impl Rng,
    depth: usize,
    out: &mut Vec<Vec<Vec2>>,
) {
    let area = polygon_area(polygon);
    if area < TINY_AREA_FRACTION * config.min_building_area {
        return;
    }
    if area < 1.5 * config.max_building_area || depth >= MAX_SUBDIVIDE_DEPTH {
        out.push(polygon.to_vec());
        return;
    }

    let obb = oriented_bbox(polygon);
    let near_road = roads
        .iter()
        .map(|r| (dist_point_to_seg(obb.center, r.a, r.b), r))
        .filter(|(d, _)| *d <= obb.length)
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    // Splitting with the normal parallel to the road direction cuts
    // perpendicular to the frontage; without a road, cut across the long
    // axis.
    let normal = match near_road {
        Some((_, r)) => (r.b - r.a).normalized_or(obb.axis),
        None => obb.axis,
    };
    let offset = (rng.gen::<f32>() - 0.5) * config.building_irregularity * obb.length * 0.5;
    let point = obb.center + normal * offset;

    let (pos_half, neg_half) = split_polygon(polygon, point, normal);
    let pos_area = polygon_area(&pos_half);
    let neg_area = polygon_area(&neg_half);
    let floor = TINY_AREA_FRACTION * config.min_building_area;
    if pos_area < floor || neg_area < floor {
        // The split line missed the polygon; recursing again would loop.
        out.push(polygon.to_vec());
        return;
    }
    subdivide_rec(&pos_half, roads, config, rng, depth + 1, out);
    subdivide_rec(&neg_half, roads, config, rng, depth + 1, out);
}

/// Road segments whose distance to any lot vertex is within tolerance,
/// bounding-box pre-filtered.
fn touching_segments<'a>(
    lot: &[Vec2],
    roads: &'a [RoadSegment],
    tol: f32,
) -> Vec<&'a RoadSegment> {
    let bbox = polygon_bbox(lot);
    let padded = (bbox.0 - tol, bbox.1 - tol, bbox.2 + tol, bbox.3 + tol);
    roads
        .iter()
        .filter(|r| {
            let rb = (
                r.a.x.min(r.b.x),
                r.a.y.min(r.b.y),
                r.a.x.max(r.b.x),
                r.a.y.max(r.b.y),
            );
            bbox_intersects(padded, rb)
        })
        .filter(|r| {
            lot.iter()
                .any(|v| dist_point_to_seg(*v, r.a, r.b) <= tol)
        })
        .collect()
}

/// Trim a lot to `lot_depth` from each touching road's centerline, keeping
/// the road side and collecting far halves as scrap.
fn trim_lot_depth(
    lot: Vec<Vec2>,
    touching: &[&RoadSegment],
    config: &GenerationConfig,
    scraps: &mut Vec<Vec<Vec2>>,
) -> Vec<Vec2> {
    let mut lot = lot;
    let floor = TINY_AREA_FRACTION * config.min_building_area;
    let centroid = polygon_centroid(&lot);

    let mut ordered: Vec<&&RoadSegment> = touching.iter().collect();
    ordered.sort_by(|x, y| {
        let dx = ((x.a + x.b) * 0.5).distance(centroid);
        let dy = ((y.a + y.b) * 0.5).distance(centroid);
        dx.partial_cmp(&dy).unwrap()
    });

    for seg in ordered {
        if lot.len() < 3 {
            break;
        }
        let mid = (seg.a + seg.b) * 0.5;
        let dir = (seg.b - seg.a).normalized_or(Vec2::new(1.0, 0.0));
        let mut normal = dir.perp();
        let lot_centroid = polygon_centroid(&lot);
        if (lot_centroid - mid).dot(normal) < 0.0 {
            normal = normal * -1.0;
        }
        let cut = mid + normal * config.lot_depth;
        // Positive side of the cut is away from the road.
        let (far, near) = split_polygon(&lot, cut, normal);
        if polygon_area(&near) < floor {
            continue; // cut would consume the lot; skip this road
        }
        if polygon_area(&far) >= floor {
            scraps.push(far);
        }
        lot = near;
    }
    lot
}

/// Vertex-in-polygon containment in either direction, AABB pre-filtered.
fn footprints_collide(a: &[Vec2], b: &[Vec2]) -> bool {
    if !bbox_intersects(polygon_bbox(a), polygon_bbox(b)) {
        return false;
    }
    a.iter().any(|v| point_in_polygon(*v, b)) || b.iter().any(|v| point_in_polygon(*v, a))
}

/// Subdivide one plot into building footprints and courtyards.
///
/// `accepted` and `hash` carry placement state across plots: the hash maps
/// grid cells to indices into `accepted`, and every accepted footprint is
/// tested against hash-neighbors before insertion.
#[allow(clippy::too_many_arguments)]
pub fn subdivide_plot(
    plot: &Plot,
    roads: &[RoadSegment],
    config: &GenerationConfig,
    rng: &mut impl Rng,
    hash: &mut SpatialHash,
    accepted: &mut Vec<Building>,
    courtyards: &mut Vec<Building>,
    next_id: &mut u32,
) {
    let lots = smart_subdivide(&plot.polygon, roads, config, rng);
    let tol = frontage_tolerance(config);
    let mut scraps: Vec<Vec<Vec2>> = Vec::new();

    for lot in lots {
        let touching = touching_segments(&lot, roads, tol);
        let mut distinct: Vec<u32> = touching.iter().map(|r| r.edge_id).collect();
        distinct.sort_unstable();
        distinct.dedup();
        let corner_lot = distinct.len() > 1;
        let lot_area = polygon_area(&lot);

        let lot = if config.lot_depth > 0.0
            && !touching.is_empty()
            && !(corner_lot && lot_area > config.max_building_area)
        {
            trim_lot_depth(lot, &touching, config, &mut scraps)
        } else {
            lot
        };
        let lot = remove_collinear(&lot, LOT_SIMPLIFY_TOL);
        if polygon_area(&lot) < config.min_building_area {
            continue;
        }

        if touching.is_empty() && plot.kind == PlotKind::Enclosed {
            // Interior lot with no street access: courtyard, no collision.
            courtyards.push(Building {
                id: *next_id,
                centroid: polygon_centroid(&lot),
                polygon: lot,
                courtyard: true,
            });
            *next_id += 1;
            continue;
        }

        let bbox = polygon_bbox(&lot);
        let collides = hash
            .query(bbox)
            .into_iter()
            .any(|idx| footprints_collide(&lot, &accepted[idx as usize].polygon));
        if collides {
            trace!("footprint rejected by collision gate in plot {}", plot.id);
            continue;
        }
        let index = accepted.len() as u32;
        accepted.push(Building {
            id: *next_id,
            centroid: polygon_centroid(&lot),
            polygon: lot,
            courtyard: false,
        });
        *next_id += 1;
        hash.insert(index, bbox);
    }

    if plot.kind == PlotKind::Enclosed {
        for scrap in scraps {
            if polygon_area(&scrap) < TINY_AREA_FRACTION * config.min_building_area {
                continue;
            }
            courtyards.push(Building {
                id: *next_id,
                centroid: polygon_centroid(&scrap),
                polygon: scrap,
                courtyard: true,
            });
            *next_id += 1;
        }
    }
}
