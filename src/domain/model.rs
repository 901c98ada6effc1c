//! Source Model
//!
//! Normalized facts about contracts, functions and call sites, as reported
//! by the analysis front-end. Read-only once built.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::domain::error::ModelError;

/// What sort of unit a contract declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    #[default]
    Contract,
    Abstract,
    Interface,
    Library,
}

impl ContractKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Contract => "contract",
            ContractKind::Abstract => "abstract",
            ContractKind::Interface => "interface",
            ContractKind::Library => "library",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Internal,
    External,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::External => "external",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter or return slot: type plus optional name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Param {
    pub fn new(ty: &str, name: &str) -> Self {
        Self {
            ty: ty.to_string(),
            name: if name.is_empty() { None } else { Some(name.to_string()) },
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", self.ty, name),
            None => f.write_str(&self.ty),
        }
    }
}

/// A call site inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Callee identifier as written.
    pub callee: String,
    /// Explicit qualifier: `super`, `this`, a contract name, or an
    /// external reference the front-end could not tie to a known contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// Number of arguments at the call site, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<usize>,
    /// Byte offset of the call in the source. Ordering only.
    #[serde(default)]
    pub position: usize,
}

impl Call {
    pub fn new(callee: &str) -> Self {
        Self {
            callee: callee.to_string(),
            qualifier: None,
            args: None,
            position: 0,
        }
    }

    pub fn qualified(mut self, qualifier: &str) -> Self {
        self.qualifier = Some(qualifier.to_string());
        self
    }

    pub fn with_args(mut self, args: usize) -> Self {
        self.args = Some(args);
        self
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// The call as written, e.g. `super._transfer` or `_mint`.
    pub fn display_name(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", q, self.callee),
            None => self.callee.clone(),
        }
    }
}

/// Identity of a function: (owning contract, identifier, parameter types).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId {
    pub contract: String,
    pub name: String,
    pub param_types: Vec<String>,
}

impl FunctionId {
    pub fn new(contract: &str, name: &str, param_types: &[&str]) -> Self {
        Self {
            contract: contract.to_string(),
            name: name.to_string(),
            param_types: param_types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.contract, self.name, self.param_types.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Owning contract. Filled in by [`SourceModel::new`].
    #[serde(default)]
    pub contract: String,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub returns: Vec<Param>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    /// Raw source text of the whole function.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub calls: Vec<Call>,
}

impl Function {
    pub fn new(name: &str, params: Vec<Param>) -> Self {
        Self {
            contract: String::new(),
            name: name.to_string(),
            params,
            returns: Vec::new(),
            visibility: Visibility::default(),
            is_virtual: false,
            source: String::new(),
            calls: Vec::new(),
        }
    }

    pub fn id(&self) -> FunctionId {
        FunctionId {
            contract: self.contract.clone(),
            name: self.name.clone(),
            param_types: self.param_types(),
        }
    }

    pub fn param_types(&self) -> Vec<String> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Human-readable signature: `name(type name, ...) returns (type name)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        let mut sig = format!("{}({})", self.name, params.join(", "));
        if !self.returns.is_empty() {
            let returns: Vec<String> = self.returns.iter().map(|p| p.to_string()).collect();
            sig.push_str(&format!(" returns ({})", returns.join(", ")));
        }
        sig
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub name: String,
    #[serde(default)]
    pub kind: ContractKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Direct parents in declaration order.
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub functions: Vec<Function>,
}

impl Contract {
    pub fn new(name: &str, parents: &[&str], functions: Vec<Function>) -> Self {
        Self {
            name: name.to_string(),
            kind: ContractKind::default(),
            file: None,
            parents: parents.iter().map(|p| p.to_string()).collect(),
            functions,
        }
    }

    /// Locally declared functions named `name`, in declaration order.
    pub fn functions_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Function> + 'n
    where
        'a: 'n,
    {
        self.functions.iter().filter(move |f| f.name == name)
    }
}

/// Whole-program facts for one invocation.
#[derive(Debug)]
pub struct SourceModel {
    contracts: Vec<Contract>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<FunctionId, (usize, usize)>,
    linearizations: DashMap<String, Arc<Vec<String>>>,
}

impl SourceModel {
    /// Build a model, enforcing unique contract names and unique function
    /// identities per contract.
    pub fn new(mut contracts: Vec<Contract>) -> Result<Self, ModelError> {
        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();

        for (ci, contract) in contracts.iter_mut().enumerate() {
            if by_name.insert(contract.name.clone(), ci).is_some() {
                return Err(ModelError::DuplicateContract {
                    name: contract.name.clone(),
                });
            }
            for (fi, function) in contract.functions.iter_mut().enumerate() {
                function.contract = contract.name.clone();
                let id = function.id();
                if by_id.contains_key(&id) {
                    return Err(ModelError::DuplicateFunction { id });
                }
                by_id.insert(id, (ci, fi));
            }
        }

        Ok(Self {
            contracts,
            by_name,
            by_id,
            linearizations: DashMap::new(),
        })
    }

    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    pub fn contract(&self, name: &str) -> Option<&Contract> {
        self.by_name.get(name).map(|&i| &self.contracts[i])
    }

    pub fn function(&self, id: &FunctionId) -> Option<&Function> {
        self.by_id
            .get(id)
            .map(|&(ci, fi)| &self.contracts[ci].functions[fi])
    }

    /// Every declared function, in model order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.contracts.iter().flat_map(|c| c.functions.iter())
    }

    pub fn function_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Contract> {
        self.contracts
            .iter()
            .filter(|c| c.kind == ContractKind::Library)
    }

    /// Resolution order for `contract`: itself, then each parent followed by
    /// that parent's ancestors, first occurrence kept. Memoized; empty for
    /// unknown contracts.
    pub fn linearization(&self, contract: &str) -> Arc<Vec<String>> {
        if let Some(order) = self.linearizations.get(contract) {
            return Arc::clone(order.value());
        }
        let order = Arc::new(self.linearize(contract));
        self.linearizations
            .entry(contract.to_string())
            .or_insert(order)
            .value()
            .clone()
    }

    fn linearize(&self, contract: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        if self.contract(contract).is_some() {
            self.visit_bases(contract, &mut seen, &mut order);
        }
        order
    }

    fn visit_bases(&self, name: &str, seen: &mut HashSet<String>, order: &mut Vec<String>) {
        if !seen.insert(name.to_string()) {
            return;
        }
        let Some(contract) = self.contract(name) else {
            warn!(parent = name, "skipping parent contract missing from source model");
            return;
        };
        order.push(name.to_string());
        for parent in &contract.parents {
            self.visit_bases(parent, seen, order);
        }
    }
}
