//! Snippet Renderer
//!
//! Renders a Trace as nested, indented source snippets.

use crate::config::{Placeholders, RenderConfig};
use crate::domain::error::RenderError;
use crate::domain::model::{FunctionId, SourceModel};
use crate::domain::trace::{Trace, TraceNode, TraceNodeKind};
use crate::ports::TraceRenderer;

const HEADING: &str = "Function call hierarchy:";
const RULE_WIDTH: usize = 40;

pub struct SnippetRenderer {
    options: RenderConfig,
}

impl Default for SnippetRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl SnippetRenderer {
    pub fn new(options: RenderConfig) -> Self {
        Self { options }
    }

    /// Convert a Trace to text.
    pub fn to_text(&self, model: &SourceModel, trace: &Trace) -> String {
        let mut lines = Vec::new();
        lines.push(HEADING.to_string());
        lines.push("=".repeat(HEADING.len()));

        for node in &trace.nodes {
            match &node.kind {
                TraceNodeKind::Function { id } => self.push_function(&mut lines, model, node, id),
                _ => lines.push(self.leaf_line(node)),
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn indent(&self, depth: usize) -> String {
        " ".repeat(self.options.indent_width * depth)
    }

    fn arrow(depth: usize) -> &'static str {
        if depth > 0 {
            "-> "
        } else {
            ""
        }
    }

    fn push_function(&self, lines: &mut Vec<String>, model: &SourceModel, node: &TraceNode, id: &FunctionId) {
        let indent = self.indent(node.depth);
        lines.push(format!("{}{}{}", indent, Self::arrow(node.depth), Self::title(model, id)));

        let detail = self.indent(node.depth + 1);
        if self.options.show_file {
            if let Some(file) = model.contract(&id.contract).and_then(|c| c.file.as_deref()) {
                lines.push(format!("{}File: {}", detail, file));
            }
        }

        let source = model.function(id).map(|f| f.source.trim()).unwrap_or_default();
        if !source.is_empty() {
            let rule = format!("{}{}", detail, "-".repeat(RULE_WIDTH));
            lines.push(format!("{}Code snippet:", detail));
            lines.push(rule.clone());
            for line in source.lines() {
                if line.trim().is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("{}{}", detail, line.trim_end()));
                }
            }
            lines.push(rule);
        }
        lines.push(String::new());
    }

    /// `-> [label] Contract.name(types)` for functions that are not
    /// expanded, `-> [label] name: reason` for targets without a body.
    fn leaf_line(&self, node: &TraceNode) -> String {
        let text: &Placeholders = &self.options.placeholders;
        let written = node.via.as_ref().map(|c| c.display_name());

        let body = match &node.kind {
            TraceNodeKind::Revisit { id } => format!("[{}] {}", text.revisit, id),
            TraceNodeKind::DepthExceeded { id } => format!("[{}] {}", text.depth_exceeded, id),
            TraceNodeKind::External { name } => {
                format!("[{}] {}: {}", text.external, name, text.external_reason)
            }
            TraceNodeKind::Unresolved { name } => format!(
                "[{}] {}: {}",
                text.unresolved,
                written.unwrap_or_else(|| name.clone()),
                text.unresolved_reason
            ),
            TraceNodeKind::Ambiguous { name, candidates } => {
                let listed: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
                format!(
                    "[{}] {}: {} {}",
                    text.ambiguous,
                    written.unwrap_or_else(|| name.clone()),
                    text.ambiguous_reason,
                    listed.join(", ")
                )
            }
            TraceNodeKind::Function { id } => id.to_string(),
        };

        format!("{}{}{}", self.indent(node.depth), Self::arrow(node.depth), body)
    }

    /// `Contract.signature`, falling back to the bare id.
    fn title(model: &SourceModel, id: &FunctionId) -> String {
        match model.function(id) {
            Some(function) => format!("{}.{}", id.contract, function.signature()),
            None => id.to_string(),
        }
    }
}

impl TraceRenderer for SnippetRenderer {
    fn render(&self, model: &SourceModel, trace: &Trace) -> Result<String, RenderError> {
        Ok(self.to_text(model, trace))
    }
}
