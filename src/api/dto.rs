use serde::{Deserialize, Serialize};

use crate::domain::error::RenderError;
use crate::domain::model::{Call, SourceModel};
use crate::domain::trace::{Trace, TraceNodeKind, TraceStats};
use crate::ports::TraceRenderer;

#[derive(Debug, Serialize, Deserialize)]
pub struct TraceDto {
    pub entry: String,
    pub max_depth: usize,
    pub nodes: Vec<NodeDto>,
    pub stats: TraceStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub depth: usize,
    /// function | revisit | depth_exceeded | external | unresolved | ambiguous
    pub kind: String,
    /// Function id, or the call-site name for unresolved targets
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<Call>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TraceDto {
    pub fn from_trace(model: &SourceModel, trace: &Trace) -> Self {
        let nodes = trace
            .nodes
            .iter()
            .map(|node| {
                let (kind, target, candidates) = match &node.kind {
                    TraceNodeKind::Function { id } => ("function", id.to_string(), vec![]),
                    TraceNodeKind::Revisit { id } => ("revisit", id.to_string(), vec![]),
                    TraceNodeKind::DepthExceeded { id } => ("depth_exceeded", id.to_string(), vec![]),
                    TraceNodeKind::External { name } => ("external", name.clone(), vec![]),
                    TraceNodeKind::Unresolved { name } => ("unresolved", name.clone(), vec![]),
                    TraceNodeKind::Ambiguous { name, candidates } => (
                        "ambiguous",
                        name.clone(),
                        candidates.iter().map(|c| c.to_string()).collect(),
                    ),
                };

                let function = node.kind.function().and_then(|id| model.function(id));
                let file = node
                    .kind
                    .function()
                    .and_then(|id| model.contract(&id.contract))
                    .and_then(|c| c.file.clone());
                // only expanded functions carry their body
                let source = match node.kind {
                    TraceNodeKind::Function { .. } => function.map(|f| f.source.clone()),
                    _ => None,
                };

                NodeDto {
                    depth: node.depth,
                    kind: kind.to_string(),
                    target,
                    signature: function.map(|f| f.signature()),
                    file,
                    call: node.via.clone(),
                    candidates,
                    source,
                }
            })
            .collect();

        TraceDto {
            entry: trace.entry.to_string(),
            max_depth: trace.max_depth,
            nodes,
            stats: trace.stats(),
        }
    }
}

/// Renders a trace as pretty-printed JSON.
pub struct JsonRenderer;

impl TraceRenderer for JsonRenderer {
    fn render(&self, model: &SourceModel, trace: &Trace) -> Result<String, RenderError> {
        let dto = TraceDto::from_trace(model, trace);
        let mut text = serde_json::to_string_pretty(&dto)?;
        text.push('\n');
        Ok(text)
    }
}
