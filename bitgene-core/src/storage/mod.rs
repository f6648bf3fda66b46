//! Local storage for a family
//!
//! Persistent store with JSON serialization.
//! Open the store → breed or inspect → save it back.

use crate::family::Family;
use crate::genome::{GenomeError, GenomeLayout};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct FamilyStore {
    pub family: Family,
    #[serde(skip)]
    pub path: PathBuf,
    pub metadata: StoreMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub created_at: DateTime<Utc>,
    pub saved_at: Option<DateTime<Utc>>,
    pub total_bootstraps: u64,
}

impl FamilyStore {
    /// Empty store for `layout`, not yet written to disk
    pub fn create(path: impl AsRef<Path>, layout: GenomeLayout) -> Self {
        Self {
            family: Family::with_layout(layout),
            path: path.as_ref().to_path_buf(),
            metadata: StoreMetadata {
                created_at: Utc::now(),
                saved_at: None,
                total_bootstraps: 0,
            },
        }
    }

    /// Load the store at `path`, or start an empty one if the file is missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::create(path, GenomeLayout::default()));
        }
        let data = std::fs::read_to_string(path)?;
        let mut store: FamilyStore = serde_json::from_str(&data)?;
        store.family.validate()?;
        store.path = path.to_path_buf();
        info!("Loaded {} members from {}", store.family.len(), path.display());
        Ok(store)
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        self.metadata.saved_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&*self)?;
        std::fs::write(&self.path, json)?;
        info!("Saved {} members to {}", self.family.len(), self.path.display());
        Ok(())
    }

    pub fn record_bootstrap(&mut self) {
        self.metadata.total_bootstraps += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "FamilyStore '{}' | {} | {} bootstraps | created {}",
            self.path.display(),
            self.family.summary(),
            self.metadata.total_bootstraps,
            self.metadata.created_at.to_rfc3339()
        )
    }
}

/// Store persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store holds an invalid family: {0}")]
    Invalid(#[from] GenomeError),
}
