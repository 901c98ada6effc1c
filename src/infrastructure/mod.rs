// Infrastructure implementations for fun-trace.

use std::io::Write;
use std::path::Path;

use crate::ports::OutputExporter;

pub mod concurrency;
pub mod facts_loader;

pub use facts_loader::FactsLoader;

/// Writes rendered output to a file, or to stdout when no path is given.
pub struct FileExporter;

impl OutputExporter for FileExporter {
    fn export(&self, content: &str, destination: Option<&Path>) -> std::io::Result<()> {
        match destination {
            Some(path) => std::fs::write(path, content),
            None => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(content.as_bytes())?;
                handle.flush()
            }
        }
    }
}
