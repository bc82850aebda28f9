//! Startup configuration.
//!
//! Devgate reads a single YAML file once at startup:
//!
//! ```yaml
//! server:
//!   listen: 127.0.0.1:3000
//! static:
//!   root: ./dist
//! proxy:
//!   /api:
//!     target: http://localhost:8080
//!     change_origin: true
//!     secure: false
//! ```
//!
//! The file is the whole configuration surface; nothing is re-read after the
//! process has started.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,

    /// Document root served when no proxy rule matches. Optional: without it
    /// unmatched requests get a 404.
    #[serde(default, rename = "static")]
    pub static_files: Option<StaticConfig>,

    /// Path prefix -> forwarding rule. The YAML mapping guarantees prefix
    /// uniqueness; duplicate keys are rejected while the file is parsed.
    #[serde(default)]
    pub proxy: BTreeMap<String, RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds, e.g. "127.0.0.1:3000".
    pub listen: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    pub root: PathBuf,

    /// File served for directory paths.
    #[serde(default = "default_index")]
    pub index: String,
}

/// One forwarding rule as written in the config file. Validation beyond the
/// field types happens when the rule table is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Backend origin, e.g. "http://localhost:8080".
    pub target: String,

    /// Rewrite the outbound Host header to the target's host.
    #[serde(default)]
    pub change_origin: bool,

    /// Validate the backend's TLS certificate. Off is useful for backends
    /// running with self-signed development certificates.
    #[serde(default = "default_secure")]
    pub secure: bool,
}

fn default_index() -> String {
    "index.html".to_string()
}

fn default_secure() -> bool {
    true
}

impl Config {
    /// Load and validate the configuration file. Any problem here aborts
    /// startup; there is no fallback configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    // Structural validation only; per-rule validation happens when the rule
    // table is built from `proxy`.
    fn validate(&self) -> Result<()> {
        if self.server.listen.is_empty() {
            bail!("server.listen must not be empty");
        }

        Ok(())
    }
}
