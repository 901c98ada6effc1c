//! Entry Point Resolution
//!
//! Turns the user's (contract, function, optional parameter types) into one
//! concrete function. This is the only resolution whose failure is fatal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::error::TraceError;
use crate::domain::model::{Function, SourceModel};
use crate::domain::resolver::Resolver;

/// A requested trace entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub contract: String,
    pub function: String,
    /// Exact parameter-type list used to pick one overload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_types: Option<Vec<String>>,
}

impl EntryPoint {
    pub fn new(contract: &str, function: &str) -> Self {
        Self {
            contract: contract.to_string(),
            function: function.to_string(),
            param_types: None,
        }
    }

    /// Select an overload by exact parameter types. Blank items are
    /// dropped, so `[""]` selects the zero-parameter overload.
    pub fn with_params<S: AsRef<str>>(mut self, params: &[S]) -> Self {
        self.param_types = Some(
            params
                .iter()
                .map(|p| p.as_ref().trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        );
        self
    }

    /// Resolve against `model`: the contract's linearization first, then
    /// library contracts when nothing in the hierarchy matches.
    pub fn resolve<'m>(&self, model: &'m SourceModel) -> Result<&'m Function, TraceError> {
        if model.contract(&self.contract).is_none() {
            return Err(TraceError::ContractNotFound {
                contract: self.contract.clone(),
            });
        }

        let resolver = Resolver::new(model);
        let order = model.linearization(&self.contract);
        let mut candidates = resolver.scan(order.iter().map(String::as_str), &self.function);
        if candidates.is_empty() {
            debug!(function = %self.function, "entry not in hierarchy, searching libraries");
            candidates = resolver.scan(model.libraries().map(|c| c.name.as_str()), &self.function);
        }

        if let Some(wanted) = &self.param_types {
            candidates.retain(|f| &f.param_types() == wanted);
        }

        match candidates.as_slice() {
            [] => Err(TraceError::FunctionNotFound {
                contract: self.contract.clone(),
                function: self.function.clone(),
            }),
            [only] => Ok(*only),
            _ => Err(TraceError::AmbiguousEntry {
                contract: self.contract.clone(),
                function: self.function.clone(),
                candidates: candidates.iter().map(|f| f.id()).collect(),
            }),
        }
    }
}

impl std::fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.contract, self.function)?;
        if let Some(params) = &self.param_types {
            write!(f, "({})", params.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Contract, ContractKind, FunctionId, Param};

    fn func(name: &str, params: &[&str]) -> Function {
        Function::new(name, params.iter().map(|t| Param::new(t, "")).collect())
    }

    fn model() -> SourceModel {
        let mut math = Contract::new("SafeMath", &[], vec![func("add", &["uint256", "uint256"])]);
        math.kind = ContractKind::Library;
        SourceModel::new(vec![
            Contract::new("Token", &[], vec![func("transfer", &["address", "uint256"])]),
            Contract::new(
                "GameToken",
                &["Token"],
                vec![func("reward", &["address"]), func("reward", &["address", "uint256"])],
            ),
            math,
        ])
        .unwrap()
    }

    #[test]
    fn test_entry_found_in_base() {
        let model = model();
        let f = EntryPoint::new("GameToken", "transfer").resolve(&model).unwrap();
        assert_eq!(f.id(), FunctionId::new("Token", "transfer", &["address", "uint256"]));
    }

    #[test]
    fn test_unknown_contract() {
        let model = model();
        let err = EntryPoint::new("Nope", "transfer").resolve(&model).unwrap_err();
        assert_eq!(err, TraceError::ContractNotFound { contract: "Nope".to_string() });
    }

    #[test]
    fn test_unknown_function() {
        let model = model();
        let err = EntryPoint::new("Token", "reward").resolve(&model).unwrap_err();
        assert!(matches!(err, TraceError::FunctionNotFound { .. }));
    }

    #[test]
    fn test_overloaded_entry_needs_params() {
        let model = model();
        let err = EntryPoint::new("GameToken", "reward").resolve(&model).unwrap_err();
        match err {
            TraceError::AmbiguousEntry { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected {:?}", other),
        }

        let f = EntryPoint::new("GameToken", "reward")
            .with_params(&["address", " uint256"])
            .resolve(&model)
            .unwrap();
        assert_eq!(f.arity(), 2);
    }

    #[test]
    fn test_blank_params_select_zero_arg_overload() {
        let model = SourceModel::new(vec![Contract::new(
            "A",
            &[],
            vec![func("foo", &[]), func("foo", &["uint256"])],
        )])
        .unwrap();

        let entry = EntryPoint::new("A", "foo").with_params(&[""]);
        assert_eq!(entry.param_types, Some(vec![]));
        let f = entry.resolve(&model).unwrap();
        assert_eq!(f.id(), FunctionId::new("A", "foo", &[]));
    }

    #[test]
    fn test_library_fallback() {
        let model = model();
        let f = EntryPoint::new("Token", "add").resolve(&model).unwrap();
        assert_eq!(f.contract, "SafeMath");
    }
}
