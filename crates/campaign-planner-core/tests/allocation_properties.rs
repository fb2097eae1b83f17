//! Property tests for the allocation engine.

use campaign_planner_core::{
    AllocationEngine, Channel, ChannelMap, CompareRequest, CpmMap, CustomStrategy, PlanRequest,
    PlannerError, ShareMix, StrategyKey, VIDEO_SHARE_PIVOT,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A share mix that sums to exactly 1 by construction.
fn arb_share_mix() -> impl Strategy<Value = ShareMix> {
    (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(a, b)| {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        ChannelMap {
            video: low,
            display: high - low,
            social: 1.0 - high,
        }
    })
}

fn arb_cpm_map() -> impl Strategy<Value = CpmMap> {
    (0.01f64..500.0, 0.01f64..500.0, 0.01f64..500.0).prop_map(|(video, display, social)| {
        ChannelMap {
            video,
            display,
            social,
        }
    })
}

fn arb_strategy_key() -> impl Strategy<Value = StrategyKey> {
    prop_oneof![
        Just(StrategyKey::Balanced),
        Just(StrategyKey::MaxReach),
        Just(StrategyKey::MaxEngagement),
        Just(StrategyKey::Custom),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Exactly one allocation per channel and the total is the exact sum.
    #[test]
    fn total_equals_sum_of_channel_impressions(
        strategy in arb_strategy_key(),
        shares in arb_share_mix(),
        cpms in arb_cpm_map(),
        total_budget in 0.01f64..10_000_000.0,
    ) {
        let engine = AllocationEngine::default();
        let plan = engine.build_plan(strategy, shares, &cpms, total_budget, None).unwrap();

        prop_assert_eq!(plan.allocations.len(), Channel::ALL.len());
        let channels: Vec<Channel> = plan.allocations.iter().map(|a| a.channel_key).collect();
        prop_assert_eq!(channels, Channel::ALL.to_vec());

        let sum: u64 = plan.allocations.iter().map(|a| a.impressions).sum();
        prop_assert_eq!(sum, plan.totals.impressions_total);
    }

    /// Every channel follows `floor(budget / cpm * 1000)`.
    #[test]
    fn impressions_follow_cpm_formula(
        shares in arb_share_mix(),
        cpms in arb_cpm_map(),
        total_budget in 0.01f64..10_000_000.0,
    ) {
        let engine = AllocationEngine::default();
        for allocation in engine.allocate(&shares, &cpms, total_budget).unwrap() {
            let share = *shares.get(allocation.channel_key);
            prop_assert_eq!(allocation.share, share);
            prop_assert_eq!(allocation.budget, total_budget * share);
            prop_assert_eq!(allocation.cpm, *cpms.get(allocation.channel_key));
            let expected = (allocation.budget / allocation.cpm * 1000.0).floor() as u64;
            prop_assert_eq!(allocation.impressions, expected);
        }
    }

    /// Sanity warnings are advisory: they never alter the allocation.
    #[test]
    fn warnings_do_not_change_allocations(
        shares in arb_share_mix(),
        cpms in arb_cpm_map(),
        total_budget in 0.01f64..1_000_000.0,
    ) {
        let engine = AllocationEngine::default();
        let reach = engine
            .build_plan(StrategyKey::MaxReach, shares, &cpms, total_budget, None)
            .unwrap();
        let balanced = engine
            .build_plan(StrategyKey::Balanced, shares, &cpms, total_budget, None)
            .unwrap();

        prop_assert_eq!(&reach.allocations, &balanced.allocations);
        prop_assert!(balanced.warnings.is_empty());
        prop_assert_eq!(reach.warnings.is_empty(), shares.video <= VIDEO_SHARE_PIVOT);
    }

    /// Valid custom mixes are accepted and plans are reproducible.
    #[test]
    fn custom_plans_are_idempotent(
        shares in arb_share_mix(),
        total_budget in 0.01f64..1_000_000.0,
        duration_days in 1u32..365,
    ) {
        let engine = AllocationEngine::default();
        let request = PlanRequest::new(total_budget, duration_days, StrategyKey::Custom)
            .with_custom_mix(shares.into());

        let first = engine.create_plan(&request).unwrap();
        let second = engine.create_plan(&request).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Comparison length is always presets plus custom strategies.
    #[test]
    fn compare_length_matches_inputs(
        mixes in prop::collection::vec(arb_share_mix(), 0..10),
        total_budget in 0.01f64..1_000_000.0,
    ) {
        let mut request = CompareRequest::new(total_budget, 30);
        for (index, mix) in mixes.iter().enumerate() {
            let name = format!("mix-{}", index);
            request = request.with_custom_strategy(CustomStrategy::new(name, *mix));
        }

        let plans = AllocationEngine::default().compare(&request).unwrap();
        prop_assert_eq!(plans.len(), 3 + mixes.len());
        for (index, plan) in plans.iter().skip(3).enumerate() {
            prop_assert_eq!(plan.strategy, StrategyKey::Custom);
            let expected = format!("mix-{}", index);
            prop_assert_eq!(plan.strategy_label.as_deref(), Some(expected.as_str()));
        }
    }

    /// Budgets of any size either plan exactly or fail with a typed error.
    #[test]
    fn huge_budgets_never_wrap_or_clamp(
        strategy in arb_strategy_key(),
        shares in arb_share_mix(),
        cpms in arb_cpm_map(),
        total_budget in 1e12f64..1e22,
    ) {
        let engine = AllocationEngine::default();
        match engine.build_plan(strategy, shares, &cpms, total_budget, None) {
            Ok(plan) => {
                let mut sum: u128 = 0;
                for allocation in &plan.allocations {
                    let expected = (allocation.budget / allocation.cpm * 1000.0).floor();
                    prop_assert!(expected < u64::MAX as f64);
                    prop_assert_eq!(allocation.impressions, expected as u64);
                    sum += u128::from(allocation.impressions);
                }
                prop_assert_eq!(sum, u128::from(plan.totals.impressions_total));
            }
            Err(err) => prop_assert!(matches!(err, PlannerError::ImpressionsOutOfRange(_))),
        }
    }
}
