//! Global configuration model for a Maestro invocation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaestroConfig {
    /// Path of the root deployment document.
    pub document: PathBuf,
    /// Stop after the validation phase instead of running tasks.
    pub validate_only: bool,
    /// Forces live (`Some(true)`) or test (`Some(false)`) mode, overriding
    /// the document's `LIVE_MODE` variable.
    pub live: Option<bool>,
}

impl Default for MaestroConfig {
    fn default() -> Self {
        Self {
            document: PathBuf::from(crate::constants::DEFAULT_DOCUMENT),
            validate_only: false,
            live: None,
        }
    }
}
