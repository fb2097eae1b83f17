use crate::catalog::{ConfigView, PlannerCatalog};
use crate::error::PlannerError;
use crate::request::{CompareRequest, PlanRequest};
use crate::rules::sanity_warnings;
use crate::types::{
    ChannelAllocation, ChannelMap, CpmMap, PartialChannelMap, Plan, PlanTotals, PresetStrategy,
    ShareMix, Strategy, StrategyKey,
};
use std::sync::Arc;
use tracing::debug;

/// 2^64, the first `f64` that does not fit in a `u64`.
const IMPRESSIONS_LIMIT: f64 = u64::MAX as f64;

/// Turns a strategy selection, CPMs, and a total budget into plans.
///
/// Stateless apart from the shared read-only catalog, so one engine can serve
/// any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    catalog: Arc<PlannerCatalog>,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(Arc::new(PlannerCatalog::default()))
    }
}

impl AllocationEngine {
    pub fn new(catalog: Arc<PlannerCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PlannerCatalog {
        &self.catalog
    }

    pub fn config(&self) -> ConfigView {
        self.catalog.config_view()
    }

    /// Resolve the share mix for a strategy key.
    ///
    /// Presets come from the catalog and ignore `custom_mix`. A custom mix must
    /// name every channel with a finite share in `[0, 1]`, and the shares must
    /// sum to 1 within [`crate::MIX_TOLERANCE`].
    pub fn resolve_shares(
        &self,
        strategy: StrategyKey,
        custom_mix: Option<&PartialChannelMap>,
    ) -> Result<ShareMix, PlannerError> {
        let selection = Strategy::select(strategy, custom_mix)?;
        self.shares_for(&selection)
    }

    pub fn shares_for(&self, strategy: &Strategy) -> Result<ShareMix, PlannerError> {
        match strategy {
            Strategy::Preset(preset) => self.catalog.preset(preset.key()),
            Strategy::Custom { mix, .. } => {
                let shares = mix
                    .complete()
                    .ok_or_else(|| PlannerError::IncompleteCustomMix(mix.missing_channels()))?;
                shares.ensure_valid_shares()?;
                Ok(shares)
            }
        }
    }

    /// Catalog defaults with any per-channel overrides applied.
    pub fn resolve_cpms(&self, overrides: Option<&PartialChannelMap>) -> CpmMap {
        let defaults = self.catalog.default_cpms();
        match overrides {
            Some(overrides) => ChannelMap::from_fn(|channel| {
                overrides.get(channel).unwrap_or(*defaults.get(channel))
            }),
            None => defaults,
        }
    }

    /// Per-channel budget and impressions in canonical channel order.
    ///
    /// Impressions are truncated toward zero: `floor(budget / cpm * 1000)`.
    /// A channel whose impressions do not fit in a `u64` is rejected rather
    /// than clamped.
    pub fn allocate(
        &self,
        shares: &ShareMix,
        cpms: &CpmMap,
        total_budget: f64,
    ) -> Result<Vec<ChannelAllocation>, PlannerError> {
        shares
            .iter()
            .map(|(channel, share)| {
                let budget = total_budget * share;
                let cpm = *cpms.get(channel);
                let raw = ((budget / cpm) * 1000.0).floor();
                if raw.is_nan() || raw >= IMPRESSIONS_LIMIT {
                    return Err(PlannerError::ImpressionsOutOfRange(format!(
                        "{} impressions for budget {} at cpm {} exceed {}",
                        channel,
                        budget,
                        cpm,
                        u64::MAX
                    )));
                }
                Ok(ChannelAllocation {
                    channel_key: channel,
                    share: *share,
                    budget,
                    cpm,
                    impressions: raw as u64,
                })
            })
            .collect()
    }

    /// Allocate and attach sanity warnings. Every public operation ends here.
    pub fn build_plan(
        &self,
        strategy: StrategyKey,
        shares: ShareMix,
        cpms: &CpmMap,
        total_budget: f64,
        strategy_label: Option<String>,
    ) -> Result<Plan, PlannerError> {
        let allocations = self.allocate(&shares, cpms, total_budget)?;
        // Sum of the truncated per-channel values, not a re-truncated aggregate.
        let impressions_total = allocations
            .iter()
            .try_fold(0u64, |total, allocation| {
                total.checked_add(allocation.impressions)
            })
            .ok_or_else(|| {
                PlannerError::ImpressionsOutOfRange(format!(
                    "total impressions for budget {} exceed {}",
                    total_budget,
                    u64::MAX
                ))
            })?;
        let warnings = sanity_warnings(strategy, &shares);

        debug!(
            strategy = %strategy,
            label = strategy_label.as_deref().unwrap_or(""),
            impressions_total,
            warnings = warnings.len(),
            "built campaign plan"
        );

        Ok(Plan {
            strategy,
            strategy_label,
            allocations,
            totals: PlanTotals { impressions_total },
            warnings,
        })
    }

    pub fn create_plan(&self, request: &PlanRequest) -> Result<Plan, PlannerError> {
        let shares = self.resolve_shares(request.strategy, request.custom_mix.as_ref())?;
        let cpms = self.resolve_cpms(request.cpm_overrides.as_ref());
        self.build_plan(request.strategy, shares, &cpms, request.total_budget, None)
    }

    /// One plan per preset in [`PresetStrategy::ALL`] order, followed by one
    /// plan per custom strategy in the order supplied.
    pub fn compare(&self, request: &CompareRequest) -> Result<Vec<Plan>, PlannerError> {
        let cpms = self.resolve_cpms(request.cpm_overrides.as_ref());
        let mut plans =
            Vec::with_capacity(PresetStrategy::ALL.len() + request.custom_strategies.len());

        for preset in PresetStrategy::ALL {
            let shares = self.shares_for(&Strategy::Preset(preset))?;
            plans.push(self.build_plan(
                preset.key(),
                shares,
                &cpms,
                request.total_budget,
                None,
            )?);
        }

        for custom in &request.custom_strategies {
            let strategy = Strategy::custom(custom.mix, custom.name.clone());
            let shares = self.shares_for(&strategy)?;
            plans.push(self.build_plan(
                strategy.key(),
                shares,
                &cpms,
                request.total_budget,
                strategy.label().map(str::to_string),
            )?);
        }

        Ok(plans)
    }
}
