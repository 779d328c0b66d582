use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration. Everything is optional; a missing config
/// file means all defaults.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to a JSON model registry file. When absent, the registry
    /// shipped in the binary is used.
    #[serde(default)]
    pub registry: Option<PathBuf>,

    /// Directory for evidence records and certificates
    /// (default: ~/.config/trustchain/records)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}
