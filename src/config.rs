use crate::{diag::DEFAULT_TARGET, error::ConfigError};
use serde::{Deserialize, Serialize};

/// Settings for the diagnostic-only output of a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticCfg {
    /// `log` target used by the default [`LogSink`](crate::diag::LogSink).
    pub target: String,
    /// Report the whole cause chain instead of the first cause only.
    pub full_chain: bool,
}

impl Default for DiagnosticCfg {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_owned(),
            full_chain: false,
        }
    }
}

impl DiagnosticCfg {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
