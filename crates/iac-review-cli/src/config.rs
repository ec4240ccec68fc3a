use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use iac_review_core::scanner::terrascan::DEFAULT_SCANNER_PROGRAM;
use iac_review_core::{LlmProfile, StorageProfile};
use serde::Deserialize;

const SCANNER_ENV: &str = "IAC_REVIEW_SCANNER";

/// `[scanner]` section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScannerProfile {
    pub program: Option<String>,
}

/// Contents of the optional `--config` file (TOML, YAML, or JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmProfile,
    pub scanner: ScannerProfile,
    pub storage: StorageProfile,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .with_context(|| format!("failed to load configuration from {}", path.display()))
    }

    /// Scanner executable: `IAC_REVIEW_SCANNER`, then the file, then `terrascan`.
    pub fn scanner_program(&self, vars: &HashMap<String, String>) -> String {
        [vars.get(SCANNER_ENV), self.scanner.program.as_ref()]
            .into_iter()
            .flatten()
            .map(|p| p.trim())
            .find(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SCANNER_PROGRAM)
            .to_string()
    }
}
