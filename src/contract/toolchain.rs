//! Solidity compiler toolchain management
//!
//! Installs release builds of `solc` into a local cache directory. Installing
//! a version that is already cached is a no-op, so callers can invoke
//! [`SolcInstaller::install`] before every compilation.

use crate::contract::compiler::CompilerError;
use crate::crypto::{sha256_hex, verify_sha256};
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default compiler version
pub const DEFAULT_SOLC_VERSION: &str = "0.8.0";

/// Host serving the official solc release builds
pub const SOLC_BINARIES_URL: &str = "https://binaries.soliditylang.org";

/// Download timeout for the release list and binaries
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Release list published per platform (`<platform>/list.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseList {
    pub builds: Vec<BuildInfo>,
    /// version -> file name
    pub releases: HashMap<String, String>,
}

/// One build entry of the release list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub path: String,
    pub version: String,
    #[serde(default)]
    pub long_version: Option<String>,
    pub sha256: String,
}

impl ReleaseList {
    /// Find the release build for `version`
    pub fn resolve(&self, version: &Version) -> Result<&BuildInfo, CompilerError> {
        let key = version.to_string();
        let file = self
            .releases
            .get(&key)
            .ok_or_else(|| CompilerError::VersionUnavailable(key.clone()))?;

        self.builds
            .iter()
            .find(|build| &build.path == file)
            .ok_or(CompilerError::VersionUnavailable(key))
    }
}

/// Platform directory name on the binaries host
pub fn platform() -> Result<&'static str, CompilerError> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => Ok("linux-amd64"),
        ("macos", _) => Ok("macosx-amd64"),
        ("windows", "x86_64") => Ok("windows-amd64"),
        (os, arch) => Err(CompilerError::UnsupportedPlatform(format!("{}-{}", os, arch))),
    }
}

/// Default cache directory: `$HOME/.carpool/solc`, or `.carpool/solc` when
/// no home directory is set
pub fn default_cache_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".carpool")
        .join("solc")
}

/// Installs and locates cached solc builds
#[derive(Debug, Clone)]
pub struct SolcInstaller {
    cache_dir: PathBuf,
    base_url: String,
}

impl SolcInstaller {
    /// Create an installer caching into `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            base_url: SOLC_BINARIES_URL.to_string(),
        }
    }

    /// Use a mirror of the binaries host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the binary for `version` lives once installed
    pub fn binary_path(&self, version: &Version) -> PathBuf {
        let name = if cfg!(windows) {
            format!("solc-{}.exe", version)
        } else {
            format!("solc-{}", version)
        };
        self.cache_dir.join(version.to_string()).join(name)
    }

    pub fn is_installed(&self, version: &Version) -> bool {
        self.binary_path(version).is_file()
    }

    /// Versions present in the cache, sorted ascending
    pub fn installed_versions(&self) -> Vec<Version> {
        let mut versions: Vec<Version> = fs::read_dir(&self.cache_dir)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| entry.file_name().to_str().and_then(|n| Version::parse(n).ok()))
            .filter(|version| self.is_installed(version))
            .collect();
        versions.sort();
        versions
    }

    /// Make sure `version` is installed and return its binary path
    pub fn install(&self, version: &Version) -> Result<PathBuf, CompilerError> {
        let binary = self.binary_path(version);
        if binary.is_file() {
            log::debug!("solc {} already installed at {}", version, binary.display());
            return Ok(binary);
        }

        log::info!("Installing solc {}...", version);
        let platform = platform()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        let list_url = format!("{}/{}/list.json", self.base_url, platform);
        let list: ReleaseList = client.get(&list_url).send()?.error_for_status()?.json()?;
        let build = list.resolve(version)?;

        let binary_url = format!("{}/{}/{}", self.base_url, platform, build.path);
        log::debug!("Downloading {}", binary_url);
        let bytes = client.get(&binary_url).send()?.error_for_status()?.bytes()?;

        self.store(version, build, &bytes)
    }

    /// Verify a downloaded build and write it into the cache
    fn store(
        &self,
        version: &Version,
        build: &BuildInfo,
        bytes: &[u8],
    ) -> Result<PathBuf, CompilerError> {
        if !verify_sha256(bytes, &build.sha256) {
            return Err(CompilerError::ChecksumMismatch {
                version: version.to_string(),
                expected: build.sha256.clone(),
                actual: sha256_hex(bytes),
            });
        }

        let binary = self.binary_path(version);
        let dir = binary
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cache_dir.clone());
        fs::create_dir_all(&dir)?;

        // Write to temporary file first
        let temp_path = dir.join(format!("solc-{}.download", version));
        fs::write(&temp_path, bytes)?;
        make_executable(&temp_path)?;

        // Atomic rename
        fs::rename(&temp_path, &binary)?;

        log::info!("Installed solc {} at {}", version, binary.display());
        Ok(binary)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_JSON: &str = r#"{
        "builds": [
            {
                "path": "solc-linux-amd64-v0.7.6+commit.7338295f",
                "version": "0.7.6",
                "longVersion": "0.7.6+commit.7338295f",
                "sha256": "0x0000000000000000000000000000000000000000000000000000000000000000"
            },
            {
                "path": "solc-linux-amd64-v0.8.0+commit.c7dfd78e",
                "version": "0.8.0",
                "longVersion": "0.8.0+commit.c7dfd78e",
                "sha256": "0xb94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
            }
        ],
        "releases": {
            "0.8.0": "solc-linux-amd64-v0.8.0+commit.c7dfd78e",
            "0.7.6": "solc-linux-amd64-v0.7.6+commit.7338295f"
        },
        "latestRelease": "0.8.0"
    }"#;

    #[test]
    fn test_resolve_release() {
        let list: ReleaseList = serde_json::from_str(LIST_JSON).unwrap();
        let build = list.resolve(&Version::new(0, 8, 0)).unwrap();
        assert_eq!(build.path, "solc-linux-amd64-v0.8.0+commit.c7dfd78e");
        assert_eq!(build.long_version.as_deref(), Some("0.8.0+commit.c7dfd78e"));
    }

    #[test]
    fn test_resolve_unknown_version() {
        let list: ReleaseList = serde_json::from_str(LIST_JSON).unwrap();
        let err = list.resolve(&Version::new(0, 9, 99)).unwrap_err();
        assert!(matches!(err, CompilerError::VersionUnavailable(v) if v == "0.9.99"));
    }

    #[test]
    fn test_install_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let installer = SolcInstaller::new(dir.path()).with_base_url("http://127.0.0.1:9");
        let version = Version::new(0, 8, 0);

        let binary = installer.binary_path(&version);
        fs::create_dir_all(binary.parent().unwrap()).unwrap();
        fs::write(&binary, b"#!/bin/sh\n").unwrap();

        // The base URL is unreachable, so this only succeeds from the cache
        assert_eq!(installer.install(&version).unwrap(), binary);
        assert!(installer.is_installed(&version));
        assert_eq!(installer.installed_versions(), vec![version]);
    }

    #[test]
    fn test_store_verifies_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let installer = SolcInstaller::new(dir.path());
        let list: ReleaseList = serde_json::from_str(LIST_JSON).unwrap();
        let version = Version::new(0, 8, 0);
        let build = list.resolve(&version).unwrap();

        let err = installer.store(&version, build, b"tampered").unwrap_err();
        assert!(matches!(err, CompilerError::ChecksumMismatch { .. }));
        assert!(!installer.is_installed(&version));

        let path = installer.store(&version, build, b"hello world").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
        assert!(installer.is_installed(&version));
    }

    #[test]
    fn test_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let installer = SolcInstaller::new(dir.path().join("missing"));
        assert!(installer.installed_versions().is_empty());
    }
}
