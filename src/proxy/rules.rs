//! Proxy rule table.
//!
//! Built once from configuration at startup and shared read-only across
//! connection tasks. Matching is plain string prefix comparison on the
//! request path; the query string never participates.

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use url::Url;

use crate::config::RuleConfig;

/// One validated forwarding rule.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    pub path_prefix: String,
    pub target: Url,
    pub change_origin: bool,
    pub secure: bool,
}

impl ProxyRule {
    fn new(prefix: &str, cfg: &RuleConfig) -> Result<Self> {
        if !prefix.starts_with('/') {
            bail!("proxy prefix {prefix:?} must start with '/'");
        }

        let target = Url::parse(&cfg.target)
            .with_context(|| format!("invalid target URL for prefix {prefix:?}"))?;

        match target.scheme() {
            "http" | "https" => {}
            other => bail!("target for prefix {prefix:?} has unsupported scheme {other:?}"),
        }

        if target.host_str().is_none() {
            bail!("target for prefix {prefix:?} is missing a host");
        }

        // The original path is forwarded unchanged, so a path on the target
        // would silently never be used. Reject it instead.
        if target.path() != "/" || target.query().is_some() || target.fragment().is_some() {
            bail!("target for prefix {prefix:?} must be a bare origin, without path or query");
        }

        Ok(Self {
            path_prefix: prefix.to_string(),
            target,
            change_origin: cfg.change_origin,
            secure: cfg.secure,
        })
    }

    pub fn host(&self) -> &str {
        // Validated at construction
        self.target.host_str().unwrap_or_default()
    }

    /// Port to connect to: the explicit one, or the scheme default.
    pub fn port(&self) -> u16 {
        self.target.port().unwrap_or(match self.target.scheme() {
            "https" => 443,
            _ => 80,
        })
    }

    pub fn is_tls(&self) -> bool {
        self.target.scheme() == "https"
    }

    /// Value for the outbound Host header when `change_origin` is set:
    /// host, plus the port only when it was explicit in the target.
    pub fn host_header(&self) -> String {
        match self.target.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }
}

/// All rules, ordered so lookup is a deterministic longest-prefix match.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<ProxyRule>,
}

impl RuleTable {
    /// Validates every configured rule. Prefix uniqueness is already
    /// guaranteed by the config mapping.
    pub fn new(configs: &BTreeMap<String, RuleConfig>) -> Result<Self> {
        let mut rules = Vec::with_capacity(configs.len());

        for (prefix, cfg) in configs {
            rules.push(ProxyRule::new(prefix, cfg)?);
        }

        // Longest prefix first, so "/api/v2" beats "/api" regardless of
        // declaration order.
        rules.sort_by(|a, b| b.path_prefix.len().cmp(&a.path_prefix.len()));

        Ok(Self { rules })
    }

    /// Finds the rule for a request path, or None when the request belongs to
    /// the static middleware. `path` must not include the query string.
    pub fn find(&self, path: &str) -> Option<&ProxyRule> {
        self.rules.iter().find(|r| path.starts_with(&r.path_prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
