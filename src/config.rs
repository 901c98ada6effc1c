//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::trace::DEFAULT_MAX_DEPTH;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "FUN_TRACE_CONFIG";

/// Global configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trace: TraceConfig,
    pub render: RenderConfig,
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Depth ceiling for a single branch
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Spaces per depth level
    pub indent_width: usize,
    /// Print the `File:` line when the contract has one
    pub show_file: bool,
    pub placeholders: Placeholders,
}

/// Text used for leaf markers in rendered output. The plain fields are the
/// bracketed labels; `*_reason` follows the call-site name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub revisit: String,
    pub depth_exceeded: String,
    pub external: String,
    pub external_reason: String,
    pub unresolved: String,
    pub unresolved_reason: String,
    pub ambiguous: String,
    pub ambiguous_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Built-in callees dropped before resolution; trailing `*` = prefix
    pub builtins: Vec<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            show_file: true,
            placeholders: Placeholders::default(),
        }
    }
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            revisit: "recursive call".to_string(),
            depth_exceeded: "max depth reached".to_string(),
            external: "external call".to_string(),
            external_reason: "no source available".to_string(),
            unresolved: "unresolved".to_string(),
            unresolved_reason: "no matching declaration".to_string(),
            ambiguous: "ambiguous overload".to_string(),
            ambiguous_reason: "candidates".to_string(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            builtins: [
                "require",
                "assert",
                "revert*",
                "keccak256",
                "sha256",
                "ripemd160",
                "ecrecover",
                "addmod",
                "mulmod",
                "gasleft",
                "blockhash",
                "selfdestruct",
                "abi.*",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Load from `path`, else from `$FUN_TRACE_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }
}
