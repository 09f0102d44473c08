//! `solc` process runner
//!
//! Feeds a standard-JSON input to `solc --standard-json` over stdin and
//! parses the JSON it prints on stdout.

use crate::contract::compiler::{CompilerError, SolidityCompiler};
use crate::contract::standard_json::{StandardJsonInput, StandardJsonOutput};
use crate::contract::toolchain::SolcInstaller;
use semver::Version;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Where the solc binary comes from
#[derive(Debug, Clone)]
enum SolcBinary {
    /// An explicit binary, used as is
    Path(PathBuf),
    /// A cached release build, installed on first use
    Managed {
        installer: SolcInstaller,
        version: Version,
    },
}

/// The native Solidity compiler
#[derive(Debug, Clone)]
pub struct Solc {
    binary: SolcBinary,
}

impl Solc {
    /// Use the binary at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            binary: SolcBinary::Path(path.into()),
        }
    }

    /// Use release `version`, installing it through `installer` when needed
    pub fn managed(installer: SolcInstaller, version: Version) -> Self {
        Self {
            binary: SolcBinary::Managed { installer, version },
        }
    }

    /// Resolve the binary, installing it first for managed versions
    pub fn binary(&self) -> Result<PathBuf, CompilerError> {
        match &self.binary {
            SolcBinary::Path(path) => Ok(path.clone()),
            SolcBinary::Managed { installer, version } => installer.install(version),
        }
    }

    /// Run `solc --standard-json` on the given binary
    fn run(binary: &Path, input: &StandardJsonInput) -> Result<StandardJsonOutput, CompilerError> {
        let mut child = Command::new(binary)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CompilerError::Spawn {
                binary: binary.to_path_buf(),
                source: e,
            })?;

        // solc reads all of stdin before writing, so the pipe is closed
        // before waiting on the output. A process that exits early closes
        // its end first; its own status and stderr are reported then.
        let payload = serde_json::to_vec(input)?;
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(CompilerError::ProcessFailed(format!(
                "{} exited with {}: {}",
                binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written?;

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl SolidityCompiler for Solc {
    fn compile(&self, input: &StandardJsonInput) -> Result<StandardJsonOutput, CompilerError> {
        let binary = self.binary()?;
        log::debug!("Compiling with {}", binary.display());
        Self::run(&binary, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::compiler::compile_contract;
    use crate::contract::compiler::fixtures::CARPOOLING_FUNCTIONS;
    use crate::source::ContractSource;

    const CARPOOLING_SOL: &str = include_str!("../../contracts/Carpooling.sol");

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let solc = Solc::at(dir.path().join("no-such-solc"));
        let input = StandardJsonInput::new("A.sol", "contract A {}");

        let err = solc.compile(&input).unwrap_err();
        assert!(matches!(err, CompilerError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_early_exit_reports_process_failure() {
        // `false` exits without reading its input
        let solc = Solc::at("false");
        let input = StandardJsonInput::new("A.sol", "a".repeat(1 << 20));

        let err = solc.compile(&input).unwrap_err();
        assert!(
            matches!(err, CompilerError::ProcessFailed(ref message) if message.contains("false")),
            "unexpected error: {err}"
        );
    }

    #[test]
    #[ignore = "downloads solc 0.8.0"]
    fn test_compile_carpooling_with_solc() {
        let dir = tempfile::tempdir().unwrap();
        let solc = Solc::managed(SolcInstaller::new(dir.path()), Version::new(0, 8, 0));
        let source = ContractSource::new("./contracts/Carpooling.sol", CARPOOLING_SOL).unwrap();

        let artifact = compile_contract(&solc, &source).unwrap();
        assert_eq!(artifact.name(), "Carpooling");
        assert!(!artifact.bytecode().is_empty());
        assert_eq!(artifact.function_signatures(), CARPOOLING_FUNCTIONS);
        for event in ["RideCreated", "RideJoined", "RideClosed"] {
            assert!(artifact.abi().event(event).is_some(), "missing event {event}");
        }
        assert!(artifact.abi().constructor().is_some());
    }

    #[test]
    #[ignore = "downloads solc 0.8.0"]
    fn test_compile_syntax_error_with_solc() {
        let dir = tempfile::tempdir().unwrap();
        let solc = Solc::managed(SolcInstaller::new(dir.path()), Version::new(0, 8, 0));
        let source =
            ContractSource::new("./contracts/Carpooling.sol", "contract Carpooling { uint x }")
                .unwrap();

        let err = compile_contract(&solc, &source).unwrap_err();
        assert!(matches!(err, CompilerError::Diagnostics(_)));
    }
}
