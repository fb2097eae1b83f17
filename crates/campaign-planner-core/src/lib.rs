//! Campaign budget allocation core.
//!
//! This crate splits a total advertising budget across a fixed set of channels
//! according to a preset or caller-supplied share mix, converts each channel's
//! budget into impressions from its CPM, and attaches advisory sanity warnings.
//! Every operation is a pure function of its inputs and the read-only
//! [`PlannerCatalog`].

#![deny(unsafe_code)]

pub mod catalog;
pub mod engine;
pub mod error;
pub mod request;
pub mod rules;
pub mod types;

pub use catalog::{ConfigView, PlannerCatalog, StrategyOption, StrategyPresets, DEFAULT_CPMS};
pub use engine::AllocationEngine;
pub use error::{CatalogError, PlannerError};
pub use request::{CompareRequest, CustomStrategy, PlanRequest};
pub use rules::{sanity_warnings, VIDEO_SHARE_PIVOT};
pub use types::{
    Channel, ChannelAllocation, ChannelMap, CpmMap, PartialChannelMap, Plan, PlanTotals,
    PresetStrategy, ShareMix, Strategy, StrategyKey, MIX_TOLERANCE,
};
