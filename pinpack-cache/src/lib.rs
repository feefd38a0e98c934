//! pinpack-cache: package reuse cache keyed by package identity
//!
//! This crate provides:
//! - SQLite-backed record of packaged artifacts
//! - Reuse decisions (reuse an existing package vs. repackage)
//! - Package status management

pub mod db;
pub mod error;
pub mod models;
pub mod schema;

pub use db::CacheDatabase;
pub use error::{Error, Result};
pub use models::*;
