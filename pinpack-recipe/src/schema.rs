//! Versioned manifest adapters
//!
//! Recipe manifests have gone through three schema revisions. Each revision
//! is deserialized by its own adapter and normalized into the single internal
//! [`Recipe`] model here, so schema evolution never leaks into the pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::metadata::PackageMetadata;
use crate::{Error, Result};

pub const DEFAULT_PATTERNS: &[&str] = &["*.h"];
pub const DEFAULT_PREFIX: &str = "include";

/// Where the source comes from. `None` fields mean "auto": resolved from the
/// live working copy at export time instead of being declared in the recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSpec {
    pub url: Option<String>,
    pub revision: Option<String>,
}

/// What gets copied into the package and where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSpec {
    pub patterns: Vec<String>,
    pub prefix: String,
}

impl Default for PackageSpec {
    fn default() -> Self {
        PackageSpec {
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Internal recipe model, stable across manifest schema versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub metadata: PackageMetadata,
    pub source: SourceSpec,
    pub package: PackageSpec,
    pub header_only: bool,
}

impl Recipe {
    /// Parse a manifest, dispatching on its `schema:` version (default 1).
    pub fn from_str(yaml: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;

        let version = match value.get("schema") {
            None => 1,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| Error::Recipe("schema version must be an integer".into()))?
                as u32,
        };

        let recipe = match version {
            1 => serde_yaml::from_value::<RecipeV1>(value)?.into(),
            2 => serde_yaml::from_value::<RecipeV2>(value)?.into(),
            3 => serde_yaml::from_value::<RecipeV3>(value)?.into(),
            other => return Err(Error::UnsupportedSchema(other)),
        };

        Ok(recipe)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let recipe = Self::from_str(&content)?;
        recipe.metadata.validate()?;
        Ok(recipe)
    }
}

/// A pattern list that may be written as a single string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            Patterns::One(p) => vec![p],
            Patterns::Many(ps) => ps,
        }
    }
}

/// `auto` (or empty) collapses to None: resolve at export time.
fn normalize_auto(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && v.trim() != "auto")
}

/// Schema v1: flat metadata plus an optional pattern list. Source location
/// is always resolved from the working copy at export time.
#[derive(Deserialize)]
struct RecipeV1 {
    #[serde(flatten)]
    metadata: PackageMetadata,

    #[serde(default)]
    package: Option<Patterns>,
}

impl From<RecipeV1> for Recipe {
    fn from(raw: RecipeV1) -> Self {
        Recipe {
            metadata: raw.metadata,
            source: SourceSpec::default(),
            package: PackageSpec {
                patterns: raw
                    .package
                    .map(Patterns::into_vec)
                    .unwrap_or_else(|| PackageSpec::default().patterns),
                prefix: DEFAULT_PREFIX.to_string(),
            },
            header_only: true,
        }
    }
}

#[derive(Deserialize)]
struct RawSource {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revision: Option<String>,
}

impl From<RawSource> for SourceSpec {
    fn from(raw: RawSource) -> Self {
        SourceSpec {
            url: normalize_auto(raw.url),
            revision: normalize_auto(raw.revision),
        }
    }
}

/// Schema v2: adds an explicit `source:` section whose fields may be `auto`.
#[derive(Deserialize)]
struct RecipeV2 {
    #[serde(flatten)]
    metadata: PackageMetadata,

    #[serde(default)]
    source: Option<RawSource>,

    #[serde(default)]
    package: Option<Patterns>,
}

impl From<RecipeV2> for Recipe {
    fn from(raw: RecipeV2) -> Self {
        Recipe {
            metadata: raw.metadata,
            source: raw.source.map(SourceSpec::from).unwrap_or_default(),
            package: PackageSpec {
                patterns: raw
                    .package
                    .map(Patterns::into_vec)
                    .unwrap_or_else(|| PackageSpec::default().patterns),
                prefix: DEFAULT_PREFIX.to_string(),
            },
            header_only: true,
        }
    }
}

#[derive(Deserialize)]
struct RawPackage {
    #[serde(default)]
    patterns: Option<Patterns>,
    #[serde(default)]
    prefix: Option<String>,
}

/// Schema v3: structured `package:` section with a configurable prefix and
/// an explicit header-only flag.
#[derive(Deserialize)]
struct RecipeV3 {
    #[serde(flatten)]
    metadata: PackageMetadata,

    #[serde(default)]
    source: Option<RawSource>,

    #[serde(default)]
    package: Option<RawPackage>,

    #[serde(default = "default_header_only")]
    header_only: bool,
}

fn default_header_only() -> bool {
    true
}

impl From<RecipeV3> for Recipe {
    fn from(raw: RecipeV3) -> Self {
        let package = match raw.package {
            Some(p) => PackageSpec {
                patterns: p
                    .patterns
                    .map(Patterns::into_vec)
                    .unwrap_or_else(|| PackageSpec::default().patterns),
                prefix: p.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            },
            None => PackageSpec::default(),
        };

        Recipe {
            metadata: raw.metadata,
            source: raw.source.map(SourceSpec::from).unwrap_or_default(),
            package,
            header_only: raw.header_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: &str = r#"
name: fioc
version: 1.0.0
license: free to use
url: https://github.com/forry/fioc
description: Lightweight C++ IoC implementation
package: "*.h"
"#;

    const V2: &str = r#"
schema: 2
name: fioc
version: 1.0.0
license: free to use
url: https://github.com/forry/fioc
description: Lightweight C++ IoC implementation
topics: [c++, ioc]
source:
  url: auto
  revision: auto
package: ["*.h"]
"#;

    const V3: &str = r#"
schema: 3
name: fioc
version: 1.0.0
license: free to use
url: https://github.com/forry/fioc
description: Lightweight C++ IoC implementation
topics: [c++, ioc]
header_only: true
source:
  url: auto
  revision: auto
package:
  patterns: ["*.h"]
  prefix: include
"#;

    #[test]
    fn test_all_schemas_normalize_identically() {
        let v1 = Recipe::from_str(V1).unwrap();
        let v2 = Recipe::from_str(V2).unwrap();
        let v3 = Recipe::from_str(V3).unwrap();

        assert_eq!(v1.source, v2.source);
        assert_eq!(v2.source, v3.source);
        assert_eq!(v1.package, v2.package);
        assert_eq!(v2.package, v3.package);
        assert_eq!(v1.metadata.name, v3.metadata.name);
        assert!(v1.header_only && v2.header_only && v3.header_only);
    }

    #[test]
    fn test_auto_fields_collapse_to_none() {
        let recipe = Recipe::from_str(V2).unwrap();
        assert!(recipe.source.url.is_none());
        assert!(recipe.source.revision.is_none());
    }

    #[test]
    fn test_explicit_source_is_kept() {
        let recipe = Recipe::from_str(
            r#"
schema: 2
name: fioc
version: 1.0.0
license: MIT
source:
  url: https://example.com/lib.git
  revision: abc123
"#,
        )
        .unwrap();
        assert_eq!(recipe.source.url.as_deref(), Some("https://example.com/lib.git"));
        assert_eq!(recipe.source.revision.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_v3_custom_prefix() {
        let recipe = Recipe::from_str(
            r#"
schema: 3
name: fioc
version: 1.0.0
license: MIT
package:
  patterns: ["*.h", "*.hpp"]
  prefix: headers
"#,
        )
        .unwrap();
        assert_eq!(recipe.package.prefix, "headers");
        assert_eq!(recipe.package.patterns, vec!["*.h", "*.hpp"]);
    }

    #[test]
    fn test_unknown_schema_rejected() {
        let err = Recipe::from_str("schema: 4\nname: x\nversion: 1\nlicense: MIT")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema(4)));
    }

    #[test]
    fn test_missing_patterns_default_to_headers() {
        let recipe = Recipe::from_str("name: x\nversion: '1'\nlicense: MIT").unwrap();
        assert_eq!(recipe.package.patterns, vec!["*.h"]);
        assert_eq!(recipe.package.prefix, "include");
    }
}
