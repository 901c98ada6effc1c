//! Error types for loading a source model and resolving trace entries.

use thiserror::Error;

use crate::domain::model::FunctionId;

/// Errors raised while building a [`SourceModel`](crate::domain::model::SourceModel).
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("duplicate contract `{name}` in source model")]
    DuplicateContract { name: String },

    #[error("duplicate function `{id}` in source model")]
    DuplicateFunction { id: FunctionId },

    #[error("unsupported facts format for {path} (expected .json or .toml)")]
    UnsupportedFormat { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Fatal errors for a single trace request. Everything that goes wrong
/// after the entry point is resolved becomes a leaf in the trace instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("contract `{contract}` not found")]
    ContractNotFound { contract: String },

    #[error("function `{function}` not found in `{contract}` or its bases")]
    FunctionNotFound { contract: String, function: String },

    #[error("function `{function}` is ambiguous in `{contract}`: candidates {}", join_ids(.candidates))]
    AmbiguousEntry {
        contract: String,
        function: String,
        candidates: Vec<FunctionId>,
    },
}

/// Errors raised while turning a trace into output text.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn join_ids(ids: &[FunctionId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
