//! pinpack-recipe: recipe manifests for pinned header-only packages
//!
//! This crate provides:
//! - The internal recipe model shared by every pipeline phase
//! - Versioned manifest adapters (schema v1/v2/v3)
//! - Revision pin persistence (the exported {url, commit} record)
//! - Package identity computation for reuse decisions

pub mod error;
pub mod identity;
pub mod metadata;
pub mod pin;
pub mod schema;

pub use error::{Error, Result};
pub use identity::{compute_identity, BuildProfile};
pub use metadata::{License, PackageMetadata};
pub use pin::RevisionPin;
pub use schema::{PackageSpec, Recipe, SourceSpec};
