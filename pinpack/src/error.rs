use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Recipe error: {0}")]
    Recipe(#[from] pinpack_recipe::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] pinpack_cache::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Cannot resolve revision in {dir:?}: {reason}")]
    UnresolvedRevision { dir: PathBuf, reason: String },

    #[error("Failed to clone {url} into {target:?}: {reason}")]
    Clone {
        url: String,
        target: PathBuf,
        reason: String,
    },

    #[error("Failed to checkout {revision} of {url}: {reason}")]
    Checkout {
        revision: String,
        url: String,
        reason: String,
    },

    #[error("Failed to copy {path:?}: {reason}")]
    Copy { path: PathBuf, reason: String },

    #[error("No files matched {patterns:?} under {root:?}")]
    EmptyPackage {
        patterns: Vec<String>,
        root: PathBuf,
    },

    #[error("git is unavailable, install git to continue")]
    GitMissing,
}

pub type Result<T> = std::result::Result<T, Error>;
