//! Engine configuration

use crate::error::{FakeError, Result};
use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How assertion failures are rendered
    pub diagnostics: DiagnosticsConfig,
    /// Built-in dispatch behaviour
    pub dispatch: DispatchConfig,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep defaults.
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document)
            .map_err(|err| FakeError::configuration(format!("engine config: {}", err)))
    }
}

/// Assertion failure rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Calls listed in a failure message before the rest is summarised
    pub max_listed_calls: usize,
    /// Prefix each listed call with its position in the history
    pub include_sequence_numbers: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_listed_calls: 50,
            include_sequence_numbers: true,
        }
    }
}

/// Dispatch behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Remember property setter values and serve them from getters
    pub property_behavior: bool,
    /// Emit a `trace!` event for every intercepted call
    pub trace_calls: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            property_behavior: true,
            trace_calls: true,
        }
    }
}
