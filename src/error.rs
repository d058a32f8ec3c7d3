use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read feed '{path}': {source}")]
    FeedRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed feed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid price '{raw}': expected a number followed by an optional unit")]
    InvalidPrice { raw: String },

    #[error("Metrics error: {message}")]
    Metrics { message: String },
}

pub type Result<T> = std::result::Result<T, ImportError>;
