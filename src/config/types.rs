use serde::{Deserialize, Serialize};

use crate::trace::history::DEFAULT_HISTORY_CAPACITY;

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub devtools: DevtoolsConfig,
}

/// Settings for the store itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Human-readable name shown by trace inspectors.
    #[serde(default = "default_store_name")]
    pub name: String,
}

/// Trace/inspection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevtoolsConfig {
    /// When false, no sink receives anything (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Output format for the inspector sink (default: console).
    #[serde(default)]
    pub format: TraceFormat,
    /// Where the inspector sink writes (default: stderr).
    #[serde(default)]
    pub destination: TraceDestination,
    /// Trace file path; `~/` is expanded. Used by `file` and `both`.
    #[serde(default = "default_file_path")]
    pub file_path: String,
    /// Entries kept by the in-memory history sink (default: 256).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    #[default]
    Console,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceDestination {
    #[default]
    Stderr,
    File,
    Both,
}

impl TraceDestination {
    pub fn writes_file(self) -> bool {
        matches!(self, TraceDestination::File | TraceDestination::Both)
    }

    pub fn writes_stderr(self) -> bool {
        matches!(self, TraceDestination::Stderr | TraceDestination::Both)
    }
}

fn default_store_name() -> String {
    "flowstore".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_file_path() -> String {
    "~/.local/state/flowstore/trace.log".to_string()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            name: default_store_name(),
        }
    }
}

impl Default for DevtoolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            format: TraceFormat::default(),
            destination: TraceDestination::default(),
            file_path: default_file_path(),
            history_capacity: default_history_capacity(),
        }
    }
}
