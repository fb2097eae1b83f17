//! Field-level request validation performed before requests reach the engine.
//!
//! The engine re-checks the cross-field share-sum invariant itself; this layer
//! covers per-field bounds and request shape.

use campaign_planner_core::{
    Channel, CompareRequest, CustomStrategy, PartialChannelMap, PlanRequest, ShareMix,
    MIX_TOLERANCE,
};
use std::fmt;

pub const MIN_TOTAL_BUDGET: f64 = 0.01;
pub const MIN_DURATION_DAYS: u32 = 1;
pub const MIN_CPM: f64 = 0.01;
pub const MAX_CUSTOM_STRATEGIES: usize = 10;
pub const MAX_STRATEGY_NAME_LENGTH: usize = 60;

/// Every field violation found in one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<String>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn push(&mut self, message: String) {
        self.0.push(message);
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.0))
        }
    }
}

pub fn validate_plan_request(request: &PlanRequest) -> Result<(), ValidationErrors> {
    let mut violations = Violations::default();
    check_budget_and_duration(request.total_budget, request.duration_days, &mut violations);
    check_cpm_overrides(request.cpm_overrides.as_ref(), &mut violations);
    if let Some(mix) = request.custom_mix.as_ref() {
        check_mix_bounds("customMix", mix, &mut violations);
    }
    violations.finish()
}

pub fn validate_compare_request(request: &CompareRequest) -> Result<(), ValidationErrors> {
    let mut violations = Violations::default();
    check_budget_and_duration(request.total_budget, request.duration_days, &mut violations);
    check_cpm_overrides(request.cpm_overrides.as_ref(), &mut violations);

    if request.custom_strategies.len() > MAX_CUSTOM_STRATEGIES {
        violations.push(format!(
            "customStrategies must contain no more than {} elements",
            MAX_CUSTOM_STRATEGIES
        ));
    }

    for (index, strategy) in request.custom_strategies.iter().enumerate() {
        let field = format!("customStrategies[{}]", index);
        if !is_valid_strategy_name(&strategy.name) {
            violations.push(format!(
                "{}.name must be non-empty and at most {} characters",
                field, MAX_STRATEGY_NAME_LENGTH
            ));
        }
        check_mix_bounds(&format!("{}.mix", field), &strategy.mix, &mut violations);
    }

    violations.finish()
}

/// Non-blank and at most [`MAX_STRATEGY_NAME_LENGTH`] characters once
/// surrounding whitespace is trimmed.
pub fn is_valid_strategy_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_STRATEGY_NAME_LENGTH
}

/// Every share finite, within `[0, 1]`, and summing to 1 within [`MIX_TOLERANCE`].
pub fn is_valid_share_mix(mix: &ShareMix) -> bool {
    mix.iter()
        .all(|(_, share)| share.is_finite() && (0.0..=1.0).contains(share))
        && (mix.total() - 1.0).abs() <= MIX_TOLERANCE
}

pub fn is_valid_custom_strategy(strategy: &CustomStrategy) -> bool {
    is_valid_strategy_name(&strategy.name)
        && strategy.mix.complete().is_some_and(|mix| is_valid_share_mix(&mix))
}

fn check_budget_and_duration(total_budget: f64, duration_days: u32, violations: &mut Violations) {
    if !total_budget.is_finite() || total_budget < MIN_TOTAL_BUDGET {
        violations.push(format!(
            "totalBudget must not be less than {}",
            MIN_TOTAL_BUDGET
        ));
    }
    if duration_days < MIN_DURATION_DAYS {
        violations.push(format!(
            "durationDays must not be less than {}",
            MIN_DURATION_DAYS
        ));
    }
}

fn check_cpm_overrides(overrides: Option<&PartialChannelMap>, violations: &mut Violations) {
    let Some(overrides) = overrides else {
        return;
    };
    for channel in Channel::ALL {
        if let Some(cpm) = overrides.get(channel) {
            if !cpm.is_finite() || cpm < MIN_CPM {
                violations.push(format!(
                    "cpmOverrides.{} must not be less than {}",
                    channel, MIN_CPM
                ));
            }
        }
    }
}

fn check_mix_bounds(field: &str, mix: &PartialChannelMap, violations: &mut Violations) {
    for channel in Channel::ALL {
        if let Some(share) = mix.get(channel) {
            if !share.is_finite() || !(0.0..=1.0).contains(&share) {
                violations.push(format!("{}.{} must be between 0 and 1", field, channel));
            }
        }
    }
}
