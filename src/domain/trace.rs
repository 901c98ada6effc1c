//! Trace Data Structure
//!
//! Depth-ordered execution trace from one entry function.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

use crate::domain::callgraph::CallGraph;
use crate::domain::model::{Call, FunctionId};
use crate::domain::resolver::ResolvedCallTarget;

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What a trace entry stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceNodeKind {
    /// A function whose calls are expanded beneath it
    Function { id: FunctionId },
    /// Already on the active call path; not expanded again
    Revisit { id: FunctionId },
    /// Would exceed the depth ceiling; not expanded
    DepthExceeded { id: FunctionId },
    External { name: String },
    Unresolved { name: String },
    Ambiguous {
        name: String,
        candidates: Vec<FunctionId>,
    },
}

impl TraceNodeKind {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, TraceNodeKind::Function { .. })
    }

    /// Function this entry refers to, if it refers to exactly one.
    pub fn function(&self) -> Option<&FunctionId> {
        match self {
            TraceNodeKind::Function { id }
            | TraceNodeKind::Revisit { id }
            | TraceNodeKind::DepthExceeded { id } => Some(id),
            _ => None,
        }
    }
}

/// A single entry in the trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceNode {
    /// Nesting depth; the entry function is 0
    pub depth: usize,
    /// Call site that led here (none for the root)
    pub via: Option<Call>,
    pub kind: TraceNodeKind,
}

/// Ordered, depth-tagged walk of the call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub entry: FunctionId,
    pub max_depth: usize,
    pub nodes: Vec<TraceNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    pub expanded: usize,
    pub distinct_functions: usize,
    pub revisits: usize,
    pub depth_exceeded: usize,
    pub external: usize,
    pub unresolved: usize,
    pub ambiguous: usize,
    pub deepest: usize,
}

impl Trace {
    pub fn stats(&self) -> TraceStats {
        let mut stats = TraceStats::default();
        let mut distinct = BTreeSet::new();
        for node in &self.nodes {
            stats.deepest = stats.deepest.max(node.depth);
            match &node.kind {
                TraceNodeKind::Function { id } => {
                    stats.expanded += 1;
                    distinct.insert(id);
                }
                TraceNodeKind::Revisit { .. } => stats.revisits += 1,
                TraceNodeKind::DepthExceeded { .. } => stats.depth_exceeded += 1,
                TraceNodeKind::External { .. } => stats.external += 1,
                TraceNodeKind::Unresolved { .. } => stats.unresolved += 1,
                TraceNodeKind::Ambiguous { .. } => stats.ambiguous += 1,
            }
        }
        stats.distinct_functions = distinct.len();
        stats
    }
}

/// Depth-first walker over a built call graph.
pub struct TraceWalker<'g> {
    graph: &'g CallGraph,
    max_depth: usize,
}

impl<'g> TraceWalker<'g> {
    pub fn new(graph: &'g CallGraph) -> Self {
        Self {
            graph,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk from `entry`, pre-order, call sites in source order.
    pub fn walk(&self, entry: &FunctionId) -> Trace {
        let mut nodes = vec![TraceNode {
            depth: 0,
            via: None,
            kind: TraceNodeKind::Function { id: entry.clone() },
        }];

        // Only the active path, so diamonds expand at every occurrence.
        let mut path = HashSet::new();
        path.insert(entry.clone());
        self.expand(entry, 0, &mut path, &mut nodes);

        let trace = Trace {
            entry: entry.clone(),
            max_depth: self.max_depth,
            nodes,
        };
        info!(entry = %entry, nodes = trace.nodes.len(), "trace complete");
        trace
    }

    fn expand(
        &self,
        id: &FunctionId,
        depth: usize,
        path: &mut HashSet<FunctionId>,
        nodes: &mut Vec<TraceNode>,
    ) {
        let child_depth = depth + 1;

        for edge in self.graph.callees(id) {
            let kind = match &edge.target {
                ResolvedCallTarget::Resolved { target } => {
                    if path.contains(target) {
                        TraceNodeKind::Revisit { id: target.clone() }
                    } else if child_depth > self.max_depth {
                        TraceNodeKind::DepthExceeded { id: target.clone() }
                    } else {
                        nodes.push(TraceNode {
                            depth: child_depth,
                            via: Some(edge.call.clone()),
                            kind: TraceNodeKind::Function { id: target.clone() },
                        });
                        path.insert(target.clone());
                        self.expand(target, child_depth, path, nodes);
                        path.remove(target);
                        continue;
                    }
                }
                ResolvedCallTarget::External { name } => TraceNodeKind::External { name: name.clone() },
                ResolvedCallTarget::Unresolved { name } => {
                    TraceNodeKind::Unresolved { name: name.clone() }
                }
                ResolvedCallTarget::Ambiguous { name, candidates } => TraceNodeKind::Ambiguous {
                    name: name.clone(),
                    candidates: candidates.clone(),
                },
            };

            nodes.push(TraceNode {
                depth: child_depth,
                via: Some(edge.call.clone()),
                kind,
            });
        }
    }
}
