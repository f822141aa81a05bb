use bridge_traits::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

use crate::metadata::MetadataError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to prepare output directory {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to scan output directory {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to fetch remote notes: {0}")]
    Source(#[source] BridgeError),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
