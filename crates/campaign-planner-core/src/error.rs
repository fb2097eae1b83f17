use crate::types::Channel;
use thiserror::Error;

/// Rejected-input errors raised while resolving a plan.
///
/// None of these are transient; the caller gets either a complete plan or one
/// of these kinds, never a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("unknown preset strategy '{0}'")]
    UnknownPreset(String),

    #[error("custom mix is required when strategy is custom")]
    MissingCustomMix,

    #[error(
        "custom mix must include finite video, display, and social shares (missing or invalid: {})",
        join_channels(.0)
    )]
    IncompleteCustomMix(Vec<Channel>),

    #[error("invalid share mix: {0}")]
    InvalidShareSum(String),

    #[error("impressions out of range: {0}")]
    ImpressionsOutOfRange(String),
}

impl PlannerError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPreset(_) => "UNKNOWN_PRESET",
            Self::MissingCustomMix => "MISSING_CUSTOM_MIX",
            Self::IncompleteCustomMix(_) => "INCOMPLETE_CUSTOM_MIX",
            Self::InvalidShareSum(_) => "INVALID_SHARE_SUM",
            Self::ImpressionsOutOfRange(_) => "IMPRESSIONS_OUT_OF_RANGE",
        }
    }
}

fn join_channels(channels: &[Channel]) -> String {
    channels
        .iter()
        .map(|channel| channel.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while loading a planner catalog from disk.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}
