use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::error::ModelError;
use crate::domain::model::{Contract, SourceModel};
use crate::ports::SourceModelLoader;

/// One facts document as written by the analysis front-end.
#[derive(Debug, Default, Deserialize)]
pub struct FactsDocument {
    #[serde(default)]
    pub contracts: Vec<Contract>,
}

impl FactsDocument {
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(text)?)
    }

    pub fn read(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("toml") => Self::from_toml(&text),
            _ => Err(ModelError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Loads facts files (`.json` or `.toml`) and merges them, in argument order,
/// into one source model.
pub struct FactsLoader;

impl SourceModelLoader for FactsLoader {
    fn load(&self, paths: &[PathBuf]) -> Result<SourceModel, ModelError> {
        let mut contracts = Vec::new();
        for path in paths {
            let document = FactsDocument::read(path)?;
            debug!(path = %path.display(), contracts = document.contracts.len(), "read facts");
            contracts.extend(document.contracts);
        }

        let model = SourceModel::new(contracts)?;
        info!(
            files = paths.len(),
            contracts = model.contracts().len(),
            functions = model.function_count(),
            "loaded source model"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ContractKind, Visibility};
    use tempfile::tempdir;

    const JSON: &str = r#"{
        "contracts": [{
            "name": "Vault",
            "kind": "abstract",
            "file": "contracts/Vault.sol",
            "functions": [{
                "name": "deposit",
                "params": [{ "type": "uint256", "name": "amount" }],
                "visibility": "external",
                "virtual": true,
                "source": "function deposit(uint256 amount) external virtual { _credit(amount); }",
                "calls": [{ "callee": "_credit", "args": 1, "position": 52 }]
            }]
        }]
    }"#;

    #[test]
    fn test_json_defaults_and_fields() {
        let doc = FactsDocument::from_json(JSON).unwrap();
        let vault = &doc.contracts[0];
        assert_eq!(vault.kind, ContractKind::Abstract);
        assert!(vault.parents.is_empty());

        let deposit = &vault.functions[0];
        assert_eq!(deposit.visibility, Visibility::External);
        assert!(deposit.is_virtual);
        assert!(deposit.returns.is_empty());
        assert_eq!(deposit.calls[0].qualifier, None);
        assert_eq!(deposit.calls[0].args, Some(1));
    }

    #[test]
    fn test_loader_merges_files_and_sets_owner() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("vault.json");
        let second = dir.path().join("bank.toml");
        fs::write(&first, JSON).unwrap();
        fs::write(
            &second,
            "[[contracts]]\nname = \"Bank\"\nparents = [\"Vault\"]\n\n[[contracts.functions]]\nname = \"_credit\"\nvisibility = \"internal\"\n",
        )
        .unwrap();

        let model = FactsLoader.load(&[first, second]).unwrap();
        assert_eq!(model.contracts().len(), 2);
        let credit = model.contract("Bank").unwrap().functions_named("_credit").next().unwrap();
        assert_eq!(credit.contract, "Bank");
        assert_eq!(model.linearization("Bank").as_slice(), ["Bank", "Vault"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("facts.yaml");
        fs::write(&path, "contracts: []").unwrap();
        assert!(matches!(
            FactsLoader.load(&[path]),
            Err(ModelError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_duplicate_contract_across_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        fs::write(&a, JSON).unwrap();
        fs::write(&b, JSON).unwrap();
        assert!(matches!(
            FactsLoader.load(&[a, b]),
            Err(ModelError::DuplicateContract { .. })
        ));
    }
}
