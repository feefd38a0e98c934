use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No package cached under identity {0}")]
    PackageNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
