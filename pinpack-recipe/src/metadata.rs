//! Declared package metadata read by the host package manager

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// License information in a recipe - can be a string or struct
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct License {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl<'de> Deserialize<'de> for License {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum LicenseHelper {
            Simple(String),
            Struct { id: String, url: Option<String> },
        }

        match LicenseHelper::deserialize(deserializer)? {
            LicenseHelper::Simple(id) => Ok(License { id, url: None }),
            LicenseHelper::Struct { id, url } => Ok(License { id, url }),
        }
    }
}

/// Plain key/value metadata stamped onto a package.
///
/// `name`, `version` and `license` key the reuse cache and are required;
/// the remaining fields are informational and passed through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub license: License,

    #[serde(default)]
    pub author: Option<String>,

    /// Declared redistribution URL. When present, this overrides the
    /// remote URL detected at export time in the persisted pin.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub homepage: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,
}

impl PackageMetadata {
    /// Reject metadata that cannot key a package identity.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyMetadata("name".into()));
        }
        if self.version.trim().is_empty() {
            return Err(Error::EmptyMetadata("version".into()));
        }
        if self.license.id.trim().is_empty() {
            return Err(Error::EmptyMetadata("license".into()));
        }
        Ok(())
    }
}
