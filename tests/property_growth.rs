//! Property tests over randomized growth runs: whatever the seed, strategy,
//! or tick count, the road graph stays structurally sound.

use proptest::prelude::*;
use std::collections::HashSet;

use parcel::config::{CityLimit, GenerationConfig, GrowthStrategy};
use parcel::graph::RoadGraph;
use parcel::terrain::{BandRiver, Flatland, Terrain};
use parcel::CityMap;

fn strategy_from(tag: u8) -> GrowthStrategy {
    match tag % 3 {
        0 => GrowthStrategy::Organic,
        1 => GrowthStrategy::Grid,
        _ => GrowthStrategy::Radial,
    }
}

fn check_graph_invariants(graph: &RoadGraph) {
    // Edge endpoints exist and are distinct; unordered pairs are unique.
    let mut pairs: HashSet<(u32, u32)> = HashSet::new();
    for (eid, e) in graph.edges_iter() {
        assert_ne!(e.a, e.b, "self-loop edge {eid}");
        assert!(graph.node(e.a).is_some(), "edge {eid} endpoint missing");
        assert!(graph.node(e.b).is_some(), "edge {eid} endpoint missing");
        let key = (e.a.min(e.b), e.a.max(e.b));
        assert!(pairs.insert(key), "duplicate edge for pair {key:?}");
    }
    // Neighbor lists are symmetric and free of duplicates.
    for id in graph.node_ids() {
        let node = graph.node(id).unwrap();
        let mut seen = HashSet::new();
        for &nb in &node.neighbors {
            assert!(seen.insert(nb), "node {id} lists neighbor {nb} twice");
            let back = graph.node(nb).expect("dangling neighbor");
            assert!(
                back.neighbors.contains(&id),
                "adjacency {id} -> {nb} not symmetric"
            );
            assert!(
                pairs.contains(&(id.min(nb), id.max(nb))),
                "adjacency {id} -> {nb} has no edge"
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn grown_graph_is_structurally_sound(
        seed in any::<u64>(),
        ticks in 0usize..250,
        strategy_tag in any::<u8>(),
        hard_limit in any::<bool>(),
        river in any::<bool>(),
    ) {
        let config = GenerationConfig {
            strategy: strategy_from(strategy_tag),
            city_limit: if hard_limit { CityLimit::Hard } else { CityLimit::Soft },
            ..GenerationConfig::default()
        };
        let terrain: Box<dyn Terrain> = if river {
            Box::new(BandRiver::new(config.center(), config.city_radius(), 300.0, 6.0))
        } else {
            Box::new(Flatland::new(config.center(), config.city_radius()))
        };
        let mut map = CityMap::with_seed(config, terrain, seed);
        for _ in 0..ticks {
            map.step();
        }
        check_graph_invariants(map.graph());
    }

    #[test]
    fn extraction_never_claims_a_half_edge_twice(
        seed in any::<u64>(),
        ticks in 50usize..200,
    ) {
        let config = GenerationConfig::default();
        let terrain = Flatland::new(config.center(), config.city_radius());
        let mut map = CityMap::with_seed(config, Box::new(terrain), seed);
        for _ in 0..ticks {
            map.step();
        }
        map.generate_blocks();
        let mut claimed = HashSet::new();
        for plot in map.plots() {
            for key in &plot.claimed {
                prop_assert!(
                    claimed.insert(*key),
                    "half-edge {key:?} claimed by two plots"
                );
            }
        }
    }
}
