//! Revision pin persistence
//!
//! The export phase captures a {url, commit} pair from the live working copy
//! and persists it next to the recipe. Later phases reload it read-only; a
//! pin is never mutated, only superseded by a new export.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Immutable record of where a source tree comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionPin {
    pub url: String,
    pub revision: String,
}

/// On-disk pin file shape. Must round-trip exactly: what export writes is
/// what the source phase reads.
#[derive(Serialize, Deserialize)]
struct PinFile {
    sources: PinSources,
}

#[derive(Serialize, Deserialize)]
struct PinSources {
    commit: String,
    url: String,
}

impl RevisionPin {
    pub fn new(url: impl Into<String>, revision: impl Into<String>) -> Self {
        RevisionPin {
            url: url.into(),
            revision: revision.into(),
        }
    }

    /// Sidecar pin file for a recipe, `<recipe>.pin`.
    pub fn path_for(recipe_path: &Path) -> PathBuf {
        let mut name = recipe_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str(".pin");
        recipe_path.with_file_name(name)
    }

    fn check_non_empty(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::EmptyPin("url"));
        }
        if self.revision.trim().is_empty() {
            return Err(Error::EmptyPin("commit"));
        }
        Ok(())
    }

    /// Persist the pin. Refuses to write a pin with empty fields.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.check_non_empty()?;
        let file = PinFile {
            sources: PinSources {
                commit: self.revision.clone(),
                url: self.url.clone(),
            },
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json)?;
        tracing::debug!("Persisted pin {} @ {} to {:?}", self.url, self.revision, path);
        Ok(())
    }

    /// Load a previously exported pin.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PinNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let file: PinFile = serde_json::from_str(&content)?;
        let pin = RevisionPin {
            url: file.sources.url,
            revision: file.sources.commit,
        };
        pin.check_non_empty()?;
        Ok(pin)
    }
}
