//! The `solc --standard-json` input and output shapes
//!
//! Only the parts the deployer reads are modelled. Unknown fields in the
//! compiler output are ignored.

use alloy_json_abi::JsonAbi;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source language tag understood by solc
pub const LANGUAGE_SOLIDITY: &str = "Solidity";

/// Artifacts requested for every contract in every file
pub const OUTPUT_SELECTION: [&str; 4] = ["abi", "metadata", "evm.bytecode", "evm.sourceMap"];

/// The `solc --standard-json` input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardJsonInput {
    pub language: String,
    pub sources: BTreeMap<String, SourceInput>,
    pub settings: Settings,
}

/// One entry of the input `sources` map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInput {
    pub content: String,
}

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// file -> contract -> artifact names
    pub output_selection: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl StandardJsonInput {
    /// Input for a single Solidity file, selecting ABI, metadata, bytecode
    /// and source map for all contracts
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            path.into(),
            SourceInput {
                content: content.into(),
            },
        );

        Self {
            language: LANGUAGE_SOLIDITY.to_string(),
            sources,
            settings: Settings::default(),
        }
    }

    /// Whether the requested artifacts are enough to deploy a contract
    pub fn selects_deployables(&self) -> bool {
        self.settings.output_selection.values().any(|contracts| {
            contracts.values().any(|artifacts| {
                let has = |name: &str| artifacts.iter().any(|a| a == name || a == "*");
                has("abi") && (has("evm.bytecode") || has("evm.bytecode.object") || has("evm"))
            })
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        let artifacts = OUTPUT_SELECTION.iter().map(|s| s.to_string()).collect();
        let mut contracts = BTreeMap::new();
        contracts.insert("*".to_string(), artifacts);
        let mut output_selection = BTreeMap::new();
        output_selection.insert("*".to_string(), contracts);
        Self { output_selection }
    }
}

/// The `solc --standard-json` output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandardJsonOutput {
    /// Errors and warnings, in compiler order
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    /// file -> contract name -> contract artifacts
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, ContractOutput>>,
}

impl StandardJsonOutput {
    /// Diagnostics with `error` severity
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().filter(|d| d.is_error())
    }

    /// Diagnostics with any other severity
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().filter(|d| !d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// A compiler error or warning
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub component: Option<String>,
    pub message: String,
    #[serde(default)]
    pub formatted_message: Option<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity.eq_ignore_ascii_case("error")
    }

    /// The compiler's own rendering when present, else `Type: message`
    pub fn render(&self) -> String {
        match &self.formatted_message {
            Some(formatted) => formatted.trim_end().to_string(),
            None if self.kind.is_empty() => self.message.clone(),
            None => format!("{}: {}", self.kind, self.message),
        }
    }
}

/// Artifacts for one contract
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractOutput {
    #[serde(default)]
    pub abi: Option<JsonAbi>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub evm: Option<EvmOutput>,
}

impl ContractOutput {
    /// Hex bytecode object, if it was selected
    pub fn bytecode_object(&self) -> Option<&str> {
        self.evm
            .as_ref()
            .and_then(|evm| evm.bytecode.as_ref())
            .map(|bytecode| bytecode.object.as_str())
    }
}

/// EVM section of a contract's artifacts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvmOutput {
    #[serde(default)]
    pub bytecode: Option<BytecodeOutput>,
}

/// Creation bytecode
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BytecodeOutput {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub source_map: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_shape() {
        let input = StandardJsonInput::new("./contracts/Carpooling.sol", "contract Carpooling {}");
        let json = serde_json::to_value(&input).unwrap();

        assert_eq!(json["language"], "Solidity");
        assert_eq!(
            json["sources"]["./contracts/Carpooling.sol"]["content"],
            "contract Carpooling {}"
        );
        assert_eq!(
            json["settings"]["outputSelection"]["*"]["*"],
            serde_json::json!(["abi", "metadata", "evm.bytecode", "evm.sourceMap"])
        );
        assert!(input.selects_deployables());
    }

    #[test]
    fn test_selection_without_bytecode() {
        let mut input = StandardJsonInput::new("A.sol", "");
        input
            .settings
            .output_selection
            .get_mut("*")
            .unwrap()
            .insert("*".to_string(), vec!["abi".to_string()]);
        assert!(!input.selects_deployables());
    }

    #[test]
    fn test_diagnostic_split() {
        let output: StandardJsonOutput = serde_json::from_str(
            r#"{
                "errors": [
                    {"severity": "warning", "type": "Warning", "component": "general",
                     "message": "Unused local variable."},
                    {"severity": "error", "type": "ParserError", "component": "general",
                     "message": "Expected ';' but got '}'",
                     "formattedMessage": "ParserError: Expected ';' but got '}'\n --> A.sol:3:1:\n"}
                ]
            }"#,
        )
        .unwrap();

        assert!(output.has_errors());
        assert_eq!(output.warnings().count(), 1);
        let error = output.errors().next().unwrap();
        assert!(error.render().starts_with("ParserError: Expected ';'"));
        assert!(!error.render().ends_with('\n'));
        assert_eq!(
            output.warnings().next().unwrap().render(),
            "Warning: Unused local variable."
        );
    }
}
