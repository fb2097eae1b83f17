use crate::error::{CatalogError, PlannerError};
use crate::types::{Channel, ChannelMap, CpmMap, PresetStrategy, ShareMix, StrategyKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Built-in default CPM per channel.
pub const DEFAULT_CPMS: CpmMap = ChannelMap {
    video: 12.0,
    display: 6.0,
    social: 4.0,
};

/// Share mix for every built-in preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct StrategyPresets {
    pub balanced: ShareMix,
    pub max_reach: ShareMix,
    pub max_engagement: ShareMix,
}

impl StrategyPresets {
    pub fn get(&self, preset: PresetStrategy) -> ShareMix {
        match preset {
            PresetStrategy::Balanced => self.balanced,
            PresetStrategy::MaxReach => self.max_reach,
            PresetStrategy::MaxEngagement => self.max_engagement,
        }
    }
}

impl Default for StrategyPresets {
    fn default() -> Self {
        Self {
            balanced: ChannelMap {
                video: 0.3,
                display: 0.3,
                social: 0.4,
            },
            max_reach: ChannelMap {
                video: 0.15,
                display: 0.35,
                social: 0.5,
            },
            max_engagement: ChannelMap {
                video: 0.55,
                display: 0.25,
                social: 0.2,
            },
        }
    }
}

/// Selectable strategy with its display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOption {
    pub key: StrategyKey,
    pub label: String,
    pub description: String,
}

impl From<StrategyKey> for StrategyOption {
    fn from(key: StrategyKey) -> Self {
        Self {
            key,
            label: key.display_name().to_string(),
            description: key.description().to_string(),
        }
    }
}

/// Configuration discovery payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub channels: Vec<Channel>,
    pub default_cpms: CpmMap,
    pub strategy_presets: BTreeMap<PresetStrategy, ShareMix>,
    pub strategy_options: Vec<StrategyOption>,
}

/// Read-only defaults and presets shared by every request.
///
/// Loaded once at startup and handed to the engine behind an `Arc`. Accessors
/// return owned copies so callers cannot alter the stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlannerCatalog {
    default_cpms: CpmMap,
    strategy_presets: StrategyPresets,
}

impl Default for PlannerCatalog {
    fn default() -> Self {
        Self {
            default_cpms: DEFAULT_CPMS,
            strategy_presets: StrategyPresets::default(),
        }
    }
}

impl PlannerCatalog {
    pub fn new(
        default_cpms: CpmMap,
        strategy_presets: StrategyPresets,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            default_cpms,
            strategy_presets,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog document (`{"defaultCpms": .., "strategyPresets": ..}`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_json_slice(&bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_slice(bytes)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (channel, cpm) in self.default_cpms.iter() {
            if !cpm.is_finite() || *cpm <= 0.0 {
                return Err(CatalogError::Invalid(format!(
                    "default CPM for {} must be a positive number (got {})",
                    channel, cpm
                )));
            }
        }

        for preset in PresetStrategy::ALL {
            self.strategy_presets
                .get(preset)
                .ensure_valid_shares()
                .map_err(|err| {
                    CatalogError::Invalid(format!("preset '{}': {}", preset.as_str(), err))
                })?;
        }

        Ok(())
    }

    pub fn channels(&self) -> Vec<Channel> {
        Channel::ALL.to_vec()
    }

    pub fn default_cpms(&self) -> CpmMap {
        self.default_cpms
    }

    /// Share mix for a preset key; `custom` has no preset.
    pub fn preset(&self, strategy: StrategyKey) -> Result<ShareMix, PlannerError> {
        let preset = PresetStrategy::try_from(strategy)?;
        Ok(self.strategy_presets.get(preset))
    }

    pub fn preset_by_name(&self, name: &str) -> Result<ShareMix, PlannerError> {
        let preset: PresetStrategy = name.parse()?;
        Ok(self.strategy_presets.get(preset))
    }

    pub fn all_presets(&self) -> BTreeMap<PresetStrategy, ShareMix> {
        PresetStrategy::ALL
            .into_iter()
            .map(|preset| (preset, self.strategy_presets.get(preset)))
            .collect()
    }

    pub fn config_view(&self) -> ConfigView {
        ConfigView {
            channels: self.channels(),
            default_cpms: self.default_cpms(),
            strategy_presets: self.all_presets(),
            strategy_options: PresetStrategy::ALL
                .into_iter()
                .map(PresetStrategy::key)
                .chain(std::iter::once(StrategyKey::Custom))
                .map(StrategyOption::from)
                .collect(),
        }
    }
}
