use crate::{Transaction, UtxoPool};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to access: {}. Reason: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot encoding: {0}")]
    Encoding(#[from] bincode::Error),
}

/// An API to store values outside of the process, e.g. the pool between two epochs or a batch
/// of candidate transactions.
pub trait SnapshotEncoding: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    fn decode(buffer: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(buffer)?)
    }

    fn write_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        fs::write(path, self.encode()?).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_from_file(path: &Path) -> Result<Self, SnapshotError> {
        let buffer = fs::read(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&buffer)
    }
}

impl SnapshotEncoding for UtxoPool {}

impl SnapshotEncoding for Vec<Transaction> {}
