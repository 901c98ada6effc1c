//! Call-site resolution.
//!
//! Maps a call written inside a function body to the function it targets,
//! scanning the caller's linearized inheritance order. The first contract in
//! the order that declares a given parameter-type list wins, which gives
//! override semantics without explicit override markers.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::domain::model::{Call, Function, FunctionId, SourceModel};

/// Outcome of resolving one call site. Resolution never fails; every call
/// site maps to exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedCallTarget {
    Resolved { target: FunctionId },
    /// Qualifier points outside the known contract set.
    External { name: String },
    /// More than one overload survives disambiguation.
    Ambiguous {
        name: String,
        candidates: Vec<FunctionId>,
    },
    /// No declaration with that identifier anywhere in scope.
    Unresolved { name: String },
}

impl ResolvedCallTarget {
    pub fn resolved(&self) -> Option<&FunctionId> {
        match self {
            ResolvedCallTarget::Resolved { target } => Some(target),
            _ => None,
        }
    }
}

pub struct Resolver<'m> {
    model: &'m SourceModel,
}

impl<'m> Resolver<'m> {
    pub fn new(model: &'m SourceModel) -> Self {
        Self { model }
    }

    /// Resolve `call`, written inside a function of `caller_contract`.
    pub fn resolve(&self, caller_contract: &str, call: &Call) -> ResolvedCallTarget {
        let (scope, skip) = match call.qualifier.as_deref() {
            None | Some("this") => (caller_contract, 0),
            Some("super") => (caller_contract, 1),
            Some(q) if self.model.contract(q).is_some() => (q, 0),
            Some(q) => {
                let name = format!("{}.{}", q, call.callee);
                debug!(call = %name, "external call target");
                return ResolvedCallTarget::External { name };
            }
        };

        let order = self.model.linearization(scope);
        let candidates = self.scan(order.iter().skip(skip).map(String::as_str), &call.callee);
        let outcome = Self::narrow(&call.callee, candidates, call.args);
        debug!(caller = caller_contract, call = %call.display_name(), ?outcome, "resolved call site");
        outcome
    }

    /// Collect functions named `name` across `order`. A parameter-type list
    /// already seen in a more derived contract shadows later declarations.
    pub fn scan<'a, I>(&self, order: I, name: &str) -> Vec<&'m Function>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut found = Vec::new();
        for contract in order {
            let Some(contract) = self.model.contract(contract) else {
                continue;
            };
            for function in contract.functions_named(name) {
                if seen.insert(function.param_types()) {
                    found.push(function);
                }
            }
        }
        found
    }

    fn narrow(name: &str, candidates: Vec<&Function>, args: Option<usize>) -> ResolvedCallTarget {
        if candidates.is_empty() {
            return ResolvedCallTarget::Unresolved {
                name: name.to_string(),
            };
        }

        // Front-ends may count a bound receiver as an argument, so an arity
        // that matches nothing falls back to the full candidate list.
        let by_arity: Vec<&Function> = match args {
            Some(n) => candidates.iter().copied().filter(|f| f.arity() == n).collect(),
            None => Vec::new(),
        };
        let mut pool = if by_arity.is_empty() { candidates } else { by_arity };

        // Candidates arrive in scan order; the most derived declaring
        // contract shadows matches further up the hierarchy.
        if let Some(first) = pool.first().map(|f| f.contract.clone()) {
            pool.retain(|f| f.contract == first);
        }

        match pool.as_slice() {
            [only] => ResolvedCallTarget::Resolved { target: only.id() },
            _ => ResolvedCallTarget::Ambiguous {
                name: name.to_string(),
                candidates: pool.iter().map(|f| f.id()).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Contract, Param};

    fn func(name: &str, params: &[&str]) -> Function {
        Function::new(
            name,
            params.iter().map(|t| Param::new(t, "")).collect(),
        )
    }

    fn token_model() -> SourceModel {
        SourceModel::new(vec![
            Contract::new(
                "Token",
                &[],
                vec![
                    func("_mint", &["address", "uint256"]),
                    func("_transfer", &["address", "address", "uint256"]),
                ],
            ),
            Contract::new(
                "GameToken",
                &["Token"],
                vec![
                    func("isAdmin", &["address"]),
                    func("rewardPlayer", &["address", "uint256"]),
                    func("_transfer", &["address", "address", "uint256"]),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_inherited_function_resolves_to_base() {
        let model = token_model();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("GameToken", &Call::new("_mint").with_args(2));
        assert_eq!(
            target.resolved(),
            Some(&FunctionId::new("Token", "_mint", &["address", "uint256"]))
        );

        let target = resolver.resolve("GameToken", &Call::new("isAdmin").with_args(1));
        assert_eq!(
            target.resolved(),
            Some(&FunctionId::new("GameToken", "isAdmin", &["address"]))
        );
    }

    #[test]
    fn test_most_derived_override_wins() {
        let model = token_model();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("GameToken", &Call::new("_transfer"));
        assert_eq!(target.resolved().unwrap().contract, "GameToken");

        // from inside Token the base version is the only one in scope
        let target = resolver.resolve("Token", &Call::new("_transfer"));
        assert_eq!(target.resolved().unwrap().contract, "Token");
    }

    #[test]
    fn test_super_skips_own_contract() {
        let model = token_model();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("GameToken", &Call::new("_transfer").qualified("super"));
        assert_eq!(target.resolved().unwrap().contract, "Token");
    }

    #[test]
    fn test_known_contract_qualifier_scans_that_contract() {
        let model = token_model();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("GameToken", &Call::new("_transfer").qualified("Token"));
        assert_eq!(target.resolved().unwrap().contract, "Token");
    }

    #[test]
    fn test_unknown_qualifier_is_external() {
        let model = token_model();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("GameToken", &Call::new("transfer").qualified("IERC20"));
        assert_eq!(
            target,
            ResolvedCallTarget::External {
                name: "IERC20.transfer".to_string()
            }
        );
    }

    #[test]
    fn test_missing_identifier_is_unresolved() {
        let model = token_model();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("GameToken", &Call::new("burn"));
        assert_eq!(
            target,
            ResolvedCallTarget::Unresolved {
                name: "burn".to_string()
            }
        );
    }

    #[test]
    fn test_arity_selects_overload() {
        let model = SourceModel::new(vec![Contract::new(
            "Overloaded",
            &[],
            vec![func("foo", &["uint256"]), func("foo", &["uint256", "uint256"])],
        )])
        .unwrap();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("Overloaded", &Call::new("foo").with_args(1));
        assert_eq!(
            target.resolved(),
            Some(&FunctionId::new("Overloaded", "foo", &["uint256"]))
        );
    }

    #[test]
    fn test_same_arity_overloads_are_ambiguous() {
        let model = SourceModel::new(vec![Contract::new(
            "Overloaded",
            &[],
            vec![func("foo", &["uint256"]), func("foo", &["address"])],
        )])
        .unwrap();
        let resolver = Resolver::new(&model);

        match resolver.resolve("Overloaded", &Call::new("foo").with_args(1)) {
            ResolvedCallTarget::Ambiguous { name, candidates } => {
                assert_eq!(name, "foo");
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].param_types, vec!["uint256"]);
            }
            other => panic!("expected ambiguous, got {:?}", other),
        }

        // without an argument count nothing narrows either
        assert!(matches!(
            resolver.resolve("Overloaded", &Call::new("foo")),
            ResolvedCallTarget::Ambiguous { .. }
        ));
    }

    #[test]
    fn test_same_arity_across_contracts_prefers_most_derived() {
        let model = SourceModel::new(vec![
            Contract::new("Base", &[], vec![func("foo", &["uint256"])]),
            Contract::new("Derived", &["Base"], vec![func("foo", &["int256"])]),
        ])
        .unwrap();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("Derived", &Call::new("foo").with_args(1));
        assert_eq!(
            target,
            ResolvedCallTarget::Resolved {
                target: FunctionId::new("Derived", "foo", &["int256"])
            }
        );

        // arity still reaches a base overload the derived contract lacks
        let model = SourceModel::new(vec![
            Contract::new("Base", &[], vec![func("foo", &["uint256", "uint256"])]),
            Contract::new("Derived", &["Base"], vec![func("foo", &["int256"])]),
        ])
        .unwrap();
        let resolver = Resolver::new(&model);
        let target = resolver.resolve("Derived", &Call::new("foo").with_args(2));
        assert_eq!(target.resolved().unwrap().contract, "Base");
    }

    #[test]
    fn test_arity_mismatch_falls_back_to_single_candidate() {
        let model = token_model();
        let resolver = Resolver::new(&model);

        let target = resolver.resolve("GameToken", &Call::new("isAdmin").with_args(2));
        assert!(target.resolved().is_some());
    }
}
