use std::path::{Path, PathBuf};

use crate::domain::error::{ModelError, RenderError};
use crate::domain::model::SourceModel;
use crate::domain::trace::Trace;

pub mod snippet_renderer;

/// Front-end boundary: turns facts files into a source model.
pub trait SourceModelLoader {
    fn load(&self, paths: &[PathBuf]) -> Result<SourceModel, ModelError>;
}

pub trait TraceRenderer: Sync {
    fn render(&self, model: &SourceModel, trace: &Trace) -> Result<String, RenderError>;
}

pub trait OutputExporter {
    /// Write `content` to `destination`, or stdout when none is given.
    fn export(&self, content: &str, destination: Option<&Path>) -> std::io::Result<()>;
}
