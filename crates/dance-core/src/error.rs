use std::path::PathBuf;

use dance_types::AssetKind;

/// An asset could not be resolved for a dance.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {kind} for dance {dance_id}: {cause:#}")]
pub struct FetchError {
    pub dance_id: String,
    pub kind: AssetKind,
    pub cause: anyhow::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("read catalog {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse catalog {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate dance id {0}")]
    DuplicateId(String),
}
