use crate::error::PlannerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute tolerance for the share-sum invariant (`|sum - 1| <= MIX_TOLERANCE`).
///
/// Shared by field-level request validation and the engine's own check.
pub const MIX_TOLERANCE: f64 = 0.0001;

/// Advertising medium a budget can be allocated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Video,
    Display,
    Social,
}

impl Channel {
    /// Canonical channel order used wherever allocations are listed.
    pub const ALL: [Channel; 3] = [Channel::Video, Channel::Display, Channel::Social];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Display => "display",
            Self::Social => "social",
        }
    }

    fn initial(self) -> char {
        match self {
            Self::Video => 'V',
            Self::Display => 'D',
            Self::Social => 'S',
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelMap<T> {
    pub video: T,
    pub display: T,
    pub social: T,
}

/// Fractional budget share per channel.
pub type ShareMix = ChannelMap<f64>;

/// Cost per thousand impressions per channel.
pub type CpmMap = ChannelMap<f64>;

impl<T> ChannelMap<T> {
    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        Self {
            video: f(Channel::Video),
            display: f(Channel::Display),
            social: f(Channel::Social),
        }
    }

    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Video => &self.video,
            Channel::Display => &self.display,
            Channel::Social => &self.social,
        }
    }

    /// Entries in canonical channel order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> + '_ {
        Channel::ALL
            .into_iter()
            .map(move |channel| (channel, self.get(channel)))
    }
}

impl ChannelMap<f64> {
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, value)| *value).sum()
    }

    /// Check that every share lies in `[0, 1]` and the shares sum to 1.
    pub fn ensure_valid_shares(&self) -> Result<(), PlannerError> {
        for (channel, share) in self.iter() {
            if !(0.0..=1.0).contains(share) {
                return Err(PlannerError::InvalidShareSum(format!(
                    "{} share {} is outside [0, 1]",
                    channel, share
                )));
            }
        }

        let total = self.total();
        if (total - 1.0).abs() > MIX_TOLERANCE {
            return Err(PlannerError::InvalidShareSum(format!(
                "shares must sum to 1.0 (got {})",
                total
            )));
        }

        Ok(())
    }
}

/// Channel map where every entry is optional.
///
/// Used for per-request CPM overrides and for raw custom mixes before they are
/// resolved into a [`ShareMix`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialChannelMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<f64>,
}

impl PartialChannelMap {
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Video => self.video,
            Channel::Display => self.display,
            Channel::Social => self.social,
        }
    }

    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        match channel {
            Channel::Video => self.video = Some(value),
            Channel::Display => self.display = Some(value),
            Channel::Social => self.social = Some(value),
        }
        self
    }

    /// Full share mix when every channel carries a finite value.
    pub fn complete(&self) -> Option<ShareMix> {
        match (self.video, self.display, self.social) {
            (Some(video), Some(display), Some(social))
                if video.is_finite() && display.is_finite() && social.is_finite() =>
            {
                Some(ChannelMap {
                    video,
                    display,
                    social,
                })
            }
            _ => None,
        }
    }

    /// Channels that are absent or carry a non-finite value.
    pub fn missing_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|channel| !self.get(*channel).is_some_and(f64::is_finite))
            .collect()
    }
}

impl From<ShareMix> for PartialChannelMap {
    fn from(mix: ShareMix) -> Self {
        Self {
            video: Some(mix.video),
            display: Some(mix.display),
            social: Some(mix.social),
        }
    }
}

/// Strategy identity as it appears on the wire and in plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKey {
    Balanced,
    MaxReach,
    MaxEngagement,
    Custom,
}

impl StrategyKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::MaxReach => "max_reach",
            Self::MaxEngagement => "max_engagement",
            Self::Custom => "custom",
        }
    }

    /// Human-facing strategy name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::MaxReach => "Max Reach",
            Self::MaxEngagement => "Max Engagement",
            Self::Custom => "Custom",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Balanced => "Even split for steady reach.",
            Self::MaxReach => "Favor channels with lower CPM.",
            Self::MaxEngagement => "Lean into high engagement.",
            Self::Custom => "Define your own mix.",
        }
    }
}

impl fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in preset strategies.
///
/// The derived ordering is the comparison order consumers index into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetStrategy {
    Balanced,
    MaxReach,
    MaxEngagement,
}

impl PresetStrategy {
    pub const ALL: [PresetStrategy; 3] = [
        PresetStrategy::Balanced,
        PresetStrategy::MaxReach,
        PresetStrategy::MaxEngagement,
    ];

    pub fn key(self) -> StrategyKey {
        match self {
            Self::Balanced => StrategyKey::Balanced,
            Self::MaxReach => StrategyKey::MaxReach,
            Self::MaxEngagement => StrategyKey::MaxEngagement,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.key().as_str()
    }
}

impl TryFrom<StrategyKey> for PresetStrategy {
    type Error = PlannerError;

    fn try_from(key: StrategyKey) -> Result<Self, Self::Error> {
        match key {
            StrategyKey::Balanced => Ok(Self::Balanced),
            StrategyKey::MaxReach => Ok(Self::MaxReach),
            StrategyKey::MaxEngagement => Ok(Self::MaxEngagement),
            StrategyKey::Custom => Err(PlannerError::UnknownPreset(key.as_str().to_string())),
        }
    }
}

impl FromStr for PresetStrategy {
    type Err = PlannerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == name)
            .ok_or_else(|| PlannerError::UnknownPreset(name.to_string()))
    }
}

/// Resolved strategy selection.
///
/// Only the custom variant carries a mix, so a preset can never be missing one.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Preset(PresetStrategy),
    Custom {
        mix: PartialChannelMap,
        label: Option<String>,
    },
}

impl Strategy {
    /// Build a selection from a wire key and an optional custom mix.
    ///
    /// Presets ignore the mix entirely; `custom` without one is rejected.
    pub fn select(
        key: StrategyKey,
        custom_mix: Option<&PartialChannelMap>,
    ) -> Result<Self, PlannerError> {
        match key {
            StrategyKey::Custom => {
                let mix = custom_mix.ok_or(PlannerError::MissingCustomMix)?;
                Ok(Self::Custom {
                    mix: *mix,
                    label: None,
                })
            }
            preset => Ok(Self::Preset(PresetStrategy::try_from(preset)?)),
        }
    }

    pub fn custom(mix: PartialChannelMap, label: impl Into<String>) -> Self {
        Self::Custom {
            mix,
            label: Some(label.into()),
        }
    }

    pub fn key(&self) -> StrategyKey {
        match self {
            Self::Preset(preset) => preset.key(),
            Self::Custom { .. } => StrategyKey::Custom,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Preset(_) => None,
            Self::Custom { label, .. } => label.as_deref(),
        }
    }
}

/// Budget and impressions assigned to one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAllocation {
    pub channel_key: Channel,
    pub share: f64,
    pub budget: f64,
    pub cpm: f64,
    pub impressions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotals {
    pub impressions_total: u64,
}

/// Complete computed result for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub strategy: StrategyKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_label: Option<String>,
    pub allocations: Vec<ChannelAllocation>,
    pub totals: PlanTotals,
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn allocation(&self, channel: Channel) -> Option<&ChannelAllocation> {
        self.allocations
            .iter()
            .find(|allocation| allocation.channel_key == channel)
    }

    /// Caller label when present, otherwise the strategy's display name.
    pub fn display_name(&self) -> &str {
        self.strategy_label
            .as_deref()
            .unwrap_or_else(|| self.strategy.display_name())
    }

    /// Compact share summary such as `V:30% D:30% S:40%`.
    pub fn mix_summary(&self) -> String {
        Channel::ALL
            .into_iter()
            .map(|channel| {
                let share = self.allocation(channel).map_or(0.0, |a| a.share);
                format!("{}:{}%", channel.initial(), (share * 100.0).round() as i64)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_names_parse_and_reject_unknown() {
        assert_eq!(
            "max_reach".parse::<PresetStrategy>().unwrap(),
            PresetStrategy::MaxReach
        );
        assert_eq!(
            "custom".parse::<PresetStrategy>(),
            Err(PlannerError::UnknownPreset("custom".to_string()))
        );
        assert!(matches!(
            "aggressive".parse::<PresetStrategy>(),
            Err(PlannerError::UnknownPreset(name)) if name == "aggressive"
        ));
    }

    #[test]
    fn selecting_a_preset_ignores_the_custom_mix() {
        let mix = PartialChannelMap::default().with(Channel::Video, 1.0);
        let strategy = Strategy::select(StrategyKey::Balanced, Some(&mix)).unwrap();
        assert_eq!(strategy, Strategy::Preset(PresetStrategy::Balanced));
        assert_eq!(strategy.label(), None);
    }

    #[test]
    fn selecting_custom_without_mix_is_rejected() {
        assert_eq!(
            Strategy::select(StrategyKey::Custom, None),
            Err(PlannerError::MissingCustomMix)
        );
    }

    #[test]
    fn missing_channels_reports_absent_and_non_finite_values() {
        let mix = PartialChannelMap {
            video: Some(0.5),
            display: Some(f64::NAN),
            social: None,
        };
        assert_eq!(
            mix.missing_channels(),
            vec![Channel::Display, Channel::Social]
        );
    }

    #[test]
    fn share_validation_checks_bounds_and_sum() {
        let valid = ShareMix {
            video: 0.45,
            display: 0.35,
            social: 0.2,
        };
        assert!(valid.ensure_valid_shares().is_ok());

        let over = ShareMix {
            video: 0.5,
            display: 0.3,
            social: 0.3,
        };
        assert!(matches!(
            over.ensure_valid_shares(),
            Err(PlannerError::InvalidShareSum(_))
        ));

        let negative = ShareMix {
            video: 1.2,
            display: -0.2,
            social: 0.0,
        };
        assert!(matches!(
            negative.ensure_valid_shares(),
            Err(PlannerError::InvalidShareSum(_))
        ));
    }

    #[test]
    fn custom_mix_decoding_rejects_unknown_channels() {
        let decoded: Result<PartialChannelMap, _> =
            serde_json::from_str(r#"{"video":0.5,"radio":0.5}"#);
        assert!(decoded.is_err());
    }

    #[test]
    fn plan_serializes_with_camel_case_fields() {
        let plan = Plan {
            strategy: StrategyKey::MaxReach,
            strategy_label: None,
            allocations: vec![ChannelAllocation {
                channel_key: Channel::Video,
                share: 1.0,
                budget: 100.0,
                cpm: 10.0,
                impressions: 10_000,
            }],
            totals: PlanTotals {
                impressions_total: 10_000,
            },
            warnings: vec![],
        };

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["strategy"], "max_reach");
        assert!(value.get("strategyLabel").is_none());
        assert_eq!(value["allocations"][0]["channelKey"], "video");
        assert_eq!(value["totals"]["impressionsTotal"], 10_000);
    }

    #[test]
    fn display_name_prefers_label() {
        let mut plan = Plan {
            strategy: StrategyKey::Custom,
            strategy_label: Some("Spring push".to_string()),
            allocations: vec![],
            totals: PlanTotals {
                impressions_total: 0,
            },
            warnings: vec![],
        };
        assert_eq!(plan.display_name(), "Spring push");

        plan.strategy_label = None;
        assert_eq!(plan.display_name(), "Custom");
    }
}
