// Call graph structures for fun-trace.
// Maps every declared function to its resolved call sites.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

use crate::domain::model::{Call, Function, FunctionId, SourceModel};
use crate::domain::resolver::{ResolvedCallTarget, Resolver};

/// One call site together with what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEdge {
    pub call: Call,
    pub target: ResolvedCallTarget,
}

/// Language built-ins that never count as call sites (`require`, `abi.*`...).
/// A trailing `*` makes an entry a prefix match.
#[derive(Debug, Clone, Default)]
pub struct BuiltinFilter {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl BuiltinFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut filter = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match pattern.strip_suffix('*') {
                Some(prefix) => filter.prefixes.push(prefix.to_string()),
                None => filter.exact.push(pattern.to_string()),
            }
        }
        filter
    }

    pub fn is_builtin(&self, call: &Call) -> bool {
        let written = call.display_name();
        self.matches(&written) || self.matches(&call.callee)
    }

    fn matches(&self, name: &str) -> bool {
        self.exact.iter().any(|e| e == name)
            || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// The call graph itself. Every function of the model is a key.
#[derive(Debug, Default)]
pub struct CallGraph {
    edges: BTreeMap<FunctionId, Vec<CallEdge>>,
}

impl CallGraph {
    /// Resolve every call site of every function, eagerly.
    pub fn build(model: &SourceModel, builtins: &BuiltinFilter) -> Self {
        let resolver = Resolver::new(model);
        let functions: Vec<&Function> = model.functions().collect();

        let resolved: Vec<(FunctionId, Vec<CallEdge>)> = functions
            .par_iter()
            .map(|function| (function.id(), Self::resolve_calls(&resolver, function, builtins)))
            .collect();

        let graph = CallGraph {
            edges: resolved.into_iter().collect(),
        };
        info!(
            functions = graph.len(),
            edges = graph.edge_count(),
            "built call graph"
        );
        graph
    }

    fn resolve_calls(resolver: &Resolver<'_>, function: &Function, builtins: &BuiltinFilter) -> Vec<CallEdge> {
        let mut calls: Vec<&Call> = function.calls.iter().collect();
        // stable: equal positions keep front-end order
        calls.sort_by_key(|call| call.position);

        calls
            .into_iter()
            .filter_map(|call| {
                let target = resolver.resolve(&function.contract, call);
                // A user declaration named like a built-in (`revertIfPaused`) stays.
                let declared = matches!(
                    target,
                    ResolvedCallTarget::Resolved { .. } | ResolvedCallTarget::Ambiguous { .. }
                );
                if !declared && builtins.is_builtin(call) {
                    return None;
                }
                Some(CallEdge {
                    call: call.clone(),
                    target,
                })
            })
            .collect()
    }

    /// Resolved call sites of `id` in source order. Empty for functions
    /// without calls.
    pub fn callees(&self, id: &FunctionId) -> &[CallEdge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &FunctionId) -> bool {
        self.edges.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FunctionId, &[CallEdge])> {
        self.edges.iter().map(|(id, edges)| (id, edges.as_slice()))
    }
}
