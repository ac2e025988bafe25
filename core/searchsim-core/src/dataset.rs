//! Persona datasets: the fixed, ordered result sets a simulation renders.
//!
//! Datasets are authored elsewhere and loaded from JSON:
//!
//! ```json
//! {
//!   "persona": "greg",
//!   "defaultQuery": "Greg Krieger",
//!   "results": [
//!     { "id": "li-1", "title": "...", "url": "...", "snippet": "...", "platform": "LinkedIn" }
//!   ]
//! }
//! ```

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    pub platform: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub persona: String,
    #[serde(default)]
    pub default_query: String,
    pub results: Vec<SimResult>,
}

impl Dataset {
    pub fn new(
        persona: impl Into<String>,
        default_query: impl Into<String>,
        results: Vec<SimResult>,
    ) -> Result<Self> {
        let dataset = Self {
            persona: persona.into(),
            default_query: default_query.into(),
            results,
        };
        dataset.check()?;
        Ok(dataset)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SimError::DatasetNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| SimError::Io {
            context: format!("reading dataset {}", path.display()),
            source,
        })?;
        let dataset: Dataset = serde_json::from_str(&content).map_err(|source| SimError::Json {
            context: format!("parsing dataset {}", path.display()),
            source,
        })?;
        dataset.check()?;
        tracing::debug!(
            persona = %dataset.persona,
            results = dataset.results.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    pub fn find(&self, id: &str) -> Option<&SimResult> {
        self.results.iter().find(|result| result.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Distinct platforms in first-appearance order.
    pub fn platforms(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.results
            .iter()
            .map(|result| result.platform.as_str())
            .filter(|platform| seen.insert(*platform))
            .collect()
    }

    pub fn has_platform(&self, platform: &str) -> bool {
        self.results.iter().any(|result| result.platform == platform)
    }

    fn check(&self) -> Result<()> {
        if self.persona.trim().is_empty() {
            return Err(SimError::InvalidDataset("persona is blank".to_string()));
        }
        let mut ids = HashSet::new();
        for result in &self.results {
            if !ids.insert(result.id.as_str()) {
                return Err(SimError::DuplicateResultId(result.id.clone()));
            }
        }
        Ok(())
    }
}
