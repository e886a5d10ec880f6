// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

mod common;

use common::*;
use partition_planner::{
    ChainPartitioner, LatencyLimit, LinearCostModel, PartitionStrategy, TreePartitioner,
};
use proptest::prelude::*;

fn cost_model() -> impl Strategy<Value = LinearCostModel> {
    (0u64..3, 0u64..200, 0u64..4, 0u64..30, 0u64..3).prop_map(
        |(compute_price, invocation_price, transfer_price, invocation_delay, transfer_delay)| {
            LinearCostModel {
                compute_price,
                invocation_price,
                transfer_price,
                invocation_delay,
                transfer_delay,
            }
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_tree_is_optimal(
        nodes in 1usize..10,
        seed in any::<u64>(),
        cap in 8u64..30,
        slack in proptest::option::of(0u64..80),
        model in cost_model(),
    ) {
        let tree = tree(nodes, seed);
        let latency = slack.map(|s| LatencyLimit::every_path(uncut_latency(&tree, &model) + s));
        let l = limits(cap);
        let planner = TreePartitioner::with_oracle(model.clone());
        assert_optimal(
            planner.plan(&tree, &l, latency.as_ref()),
            exhaustive_min(&tree, &model, &l, latency.as_ref()),
            &format!("{}", tree.name),
        );
    }

    #[test]
    fn test_chain_is_optimal(
        nodes in 1usize..12,
        seed in any::<u64>(),
        cap in 8u64..30,
        slack in proptest::option::of(0u64..80),
        model in cost_model(),
    ) {
        let tree = chain(nodes, seed);
        let latency = slack.map(|s| LatencyLimit::every_path(uncut_latency(&tree, &model) + s));
        let l = limits(cap);
        assert_optimal(
            ChainPartitioner::with_oracle(model.clone()).plan(&tree, &l, latency.as_ref()),
            exhaustive_min(&tree, &model, &l, latency.as_ref()),
            &format!("{}", tree.name),
        );
    }

    #[test]
    fn test_partitions_well_formed_and_deterministic(
        nodes in 1usize..60,
        seed in any::<u64>(),
        cap in 8u64..64,
        delegate in any::<bool>(),
    ) {
        let tree = tree(nodes, seed);
        let planner = TreePartitioner::new().with_chain_delegation(delegate);
        let a = planner.plan(&tree, &limits(cap), None).unwrap();
        let b = planner.plan(&tree, &limits(cap), None).unwrap();
        assert_well_formed(&tree, &a);
        prop_assert!(a.peak_memory <= cap);
        prop_assert_eq!(a.blocks(), b.blocks());
        prop_assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn test_relaxing_capacity_never_costs_more(
        nodes in 1usize..40,
        seed in any::<u64>(),
        cap in 8u64..32,
        extra in 0u64..32,
    ) {
        let tree = tree(nodes, seed);
        let tight = TreePartitioner::new().plan(&tree, &limits(cap), None).unwrap();
        let loose = TreePartitioner::new().plan(&tree, &limits(cap + extra), None).unwrap();
        prop_assert!(loose.cost <= tight.cost);
    }
}
