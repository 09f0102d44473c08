//! Contract source loading
//!
//! Reads a single Solidity file from disk. The contract name is taken from
//! the file stem, so `contracts/Carpooling.sol` is expected to declare
//! `contract Carpooling`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source loading errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Contract source not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Cannot derive a contract name from {}", .0.display())]
    InvalidName(PathBuf),
    #[error("IO error reading {}: {source}", path.display())]
    IoError { path: PathBuf, source: io::Error },
}

/// Raw text of one Solidity file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSource {
    path: PathBuf,
    name: String,
    content: String,
}

impl ContractSource {
    /// Build a source from in-memory text
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self, SourceError> {
        let path = path.into();
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| SourceError::InvalidName(path.clone()))?
            .to_string();

        Ok(Self {
            path,
            name,
            content: content.into(),
        })
    }

    /// Path the source was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key used for this file in the compiler's `sources` map
    pub fn key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Expected top-level contract name
    pub fn contract_name(&self) -> &str {
        &self.name
    }

    /// Full source text
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Read the full text of the file at `path`
pub fn load(path: impl AsRef<Path>) -> Result<ContractSource, SourceError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
        _ => SourceError::IoError {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    log::debug!("Read {} bytes from {}", content.len(), path.display());
    ContractSource::new(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Carpooling.sol");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "contract Carpooling {{}}").unwrap();

        let source = load(&path).unwrap();
        assert_eq!(source.contract_name(), "Carpooling");
        assert!(source.content().contains("contract Carpooling"));
        assert_eq!(source.path(), path.as_path());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("Missing.sol")).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_directory_is_not_readable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, SourceError::IoError { .. }));
    }

    #[test]
    fn test_key_keeps_relative_path() {
        let source = ContractSource::new("./contracts/Carpooling.sol", "").unwrap();
        assert_eq!(source.key(), "./contracts/Carpooling.sol");
        assert_eq!(source.contract_name(), "Carpooling");
    }
}
