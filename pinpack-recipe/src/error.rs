use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required metadata field is empty: {0}")]
    EmptyMetadata(String),

    #[error("Unsupported recipe schema version: {0}")]
    UnsupportedSchema(u32),

    #[error("No pin found at {0}, run export first")]
    PinNotFound(PathBuf),

    #[error("Persisted pin has an empty {0} field")]
    EmptyPin(&'static str),

    #[error("Recipe error: {0}")]
    Recipe(String),
}

pub type Result<T> = std::result::Result<T, Error>;
