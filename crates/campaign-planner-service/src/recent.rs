use crate::validation::{is_valid_custom_strategy, MAX_CUSTOM_STRATEGIES};
use campaign_planner_core::{CustomStrategy, ShareMix};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_RECENT_CAPACITY: usize = MAX_CUSTOM_STRATEGIES;

#[derive(Debug, Error)]
pub enum RecentStoreError {
    #[error("recent strategy store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("recent strategy store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentStrategy {
    pub name: String,
    pub mix: ShareMix,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreData {
    entries: Vec<RecentStrategy>,
}

/// File-backed list of recently compared custom strategies, newest first.
///
/// Names are unique; remembering an existing name moves it to the front. The
/// file is rewritten after every mutation.
#[derive(Debug)]
pub struct RecentStrategyStore {
    path: PathBuf,
    capacity: usize,
    data: StoreData,
}

impl RecentStrategyStore {
    pub fn load(path: impl Into<PathBuf>, capacity: usize) -> Result<Self, RecentStoreError> {
        let path = path.into();
        let mut data = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.is_empty() {
                StoreData::default()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            StoreData::default()
        };

        let before = data.entries.len();
        data.entries.retain(|entry| {
            is_valid_custom_strategy(&CustomStrategy::new(entry.name.clone(), entry.mix))
        });
        if data.entries.len() != before {
            warn!(
                path = %path.display(),
                dropped = before - data.entries.len(),
                "dropped invalid recent strategies"
            );
        }
        data.entries.truncate(capacity);

        Ok(Self {
            path,
            capacity,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remember strategies in the order given; the last one ends up newest.
    pub fn remember<I>(&mut self, strategies: I) -> Result<(), RecentStoreError>
    where
        I: IntoIterator<Item = (String, ShareMix)>,
    {
        let now = Utc::now();
        for (name, mix) in strategies {
            self.data.entries.retain(|entry| entry.name != name);
            self.data.entries.insert(
                0,
                RecentStrategy {
                    name,
                    mix,
                    saved_at: now,
                },
            );
        }
        self.data.entries.truncate(self.capacity);
        self.persist()
    }

    pub fn list(&self) -> Vec<RecentStrategy> {
        self.data.entries.clone()
    }

    fn persist(&self) -> Result<(), RecentStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec_pretty(&self.data)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}
