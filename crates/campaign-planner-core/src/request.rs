use crate::types::{PartialChannelMap, StrategyKey};
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-strategy plan request.
///
/// `duration_days` is carried for the caller's benefit only; no computation
/// reads it. It decodes from an integer, an integral float such as `30.0`, or
/// a numeric string; fractional days are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlanRequest {
    pub total_budget: f64,
    #[serde(deserialize_with = "whole_days")]
    pub duration_days: u32,
    pub strategy: StrategyKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_mix: Option<PartialChannelMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm_overrides: Option<PartialChannelMap>,
}

impl PlanRequest {
    pub fn new(total_budget: f64, duration_days: u32, strategy: StrategyKey) -> Self {
        Self {
            total_budget,
            duration_days,
            strategy,
            custom_mix: None,
            cpm_overrides: None,
        }
    }

    pub fn with_custom_mix(mut self, mix: PartialChannelMap) -> Self {
        self.custom_mix = Some(mix);
        self
    }

    pub fn with_cpm_overrides(mut self, overrides: PartialChannelMap) -> Self {
        self.cpm_overrides = Some(overrides);
        self
    }
}

/// Caller-defined share mix with a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomStrategy {
    pub name: String,
    pub mix: PartialChannelMap,
}

impl CustomStrategy {
    pub fn new(name: impl Into<String>, mix: impl Into<PartialChannelMap>) -> Self {
        Self {
            name: name.into(),
            mix: mix.into(),
        }
    }
}

/// Side-by-side comparison request: every preset plus any custom strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompareRequest {
    pub total_budget: f64,
    #[serde(deserialize_with = "whole_days")]
    pub duration_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm_overrides: Option<PartialChannelMap>,
    #[serde(default)]
    pub custom_strategies: Vec<CustomStrategy>,
}

impl CompareRequest {
    pub fn new(total_budget: f64, duration_days: u32) -> Self {
        Self {
            total_budget,
            duration_days,
            cpm_overrides: None,
            custom_strategies: Vec::new(),
        }
    }

    pub fn with_custom_strategy(mut self, strategy: CustomStrategy) -> Self {
        self.custom_strategies.push(strategy);
        self
    }

    pub fn with_cpm_overrides(mut self, overrides: PartialChannelMap) -> Self {
        self.cpm_overrides = Some(overrides);
        self
    }
}

fn whole_days<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(WholeDaysVisitor)
}

struct WholeDaysVisitor;

impl<'de> Visitor<'de> for WholeDaysVisitor {
    type Value = u32;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a whole number of days")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<u32, E> {
        u32::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<u32, E> {
        u32::try_from(value).map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<u32, E> {
        if value.is_finite() && value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value) {
            Ok(value as u32)
        } else {
            Err(E::invalid_value(Unexpected::Float(value), &self))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<u32, E> {
        let number: f64 = value
            .trim()
            .parse()
            .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))?;
        self.visit_f64(number)
    }
}
