//! Guest-mode persistence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::measurements::MeasurementsByWeek;
use crate::progress::CompletionMap;

/// Everything a guest keeps on their own device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestState {
    #[serde(default)]
    pub completed_days: CompletionMap,
    #[serde(default)]
    pub measurements_by_week: MeasurementsByWeek,
}

/// Device-local storage for guest state.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn load(&self) -> Result<GuestState>;
    async fn save(&self, state: &GuestState) -> Result<()>;
}

/// [`LocalStore`] backed by a single JSON file.
///
/// A missing file is an empty state. Each half of the state is decoded on
/// its own, so a corrupt measurements entry does not discard completions.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn decode_or_default<T: Default + serde::de::DeserializeOwned>(
    doc: &mut serde_json::Value,
    key: &str,
) -> T {
    match doc.get_mut(key).map(serde_json::Value::take) {
        None | Some(serde_json::Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(key, error = %e, "discarding unreadable guest state");
            T::default()
        }),
    }
}

#[async_trait]
impl LocalStore for JsonFileStore {
    async fn load(&self) -> Result<GuestState> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(GuestState::default());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read guest state at {}", self.path.display())
                });
            }
        };

        let mut doc: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse guest state at {}", self.path.display()))?;

        Ok(GuestState {
            completed_days: decode_or_default(&mut doc, "completedDays"),
            measurements_by_week: decode_or_default(&mut doc, "measurementsByWeek"),
        })
    }

    async fn save(&self, state: &GuestState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let contents =
            serde_json::to_string_pretty(state).context("failed to serialize guest state")?;
        tokio::fs::write(&self.path, contents)
            .await
            .with_context(|| format!("failed to write guest state at {}", self.path.display()))?;
        Ok(())
    }
}
