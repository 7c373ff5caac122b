use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("could not read rendered page: {0}")]
    Snapshot(String),

    #[error("browser session already released")]
    Released,
}

#[derive(Debug, Error)]
#[error("invalid selector `{css}`: {reason}")]
pub struct SelectorError {
    pub css: String,
    pub reason: String,
}

/// Why a single query could not be turned into a record or a clean miss.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("panicked while fetching: {0}")]
    Panicked(String),
}

/// A failure outside any single item. The run still writes what it has.
#[derive(Debug, Error)]
pub enum RunFatal {
    #[error("browser session failed: {0}")]
    Session(#[from] BrowserError),

    #[error("run aborted by panic: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to serialize run record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read basket file {path}: {source}")]
    BasketFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse basket file: {0}")]
    BasketFileParse(#[from] serde_yaml::Error),

    #[error("basket is empty")]
    EmptyBasket,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
