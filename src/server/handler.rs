//! Per-request dispatch.
//!
//! The handler owns everything a connection task needs: the immutable rule
//! table, the forwarder, and the static file fallback. One instance is built
//! at startup and shared via `Arc` by every connection.

use anyhow::Result;

use crate::config::Config;
use crate::files::StaticFiles;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::proxy::rules::RuleTable;
use crate::proxy::upstream::Forwarder;

pub struct RequestHandler {
    rules: RuleTable,
    forwarder: Forwarder,
    statics: Option<StaticFiles>,
}

impl RequestHandler {
    pub fn new(cfg: &Config) -> Result<Self> {
        let rules = RuleTable::new(&cfg.proxy)?;
        let statics = cfg.static_files.as_ref().map(StaticFiles::new);

        if rules.is_empty() && statics.is_none() {
            tracing::warn!("no proxy rules and no static root configured; everything will 404");
        } else {
            tracing::info!(
                rules = rules.len(),
                static_root = statics.is_some(),
                "request routing configured"
            );
        }

        Ok(Self {
            rules,
            forwarder: Forwarder::default(),
            statics,
        })
    }

    /// Routes one request: matched prefix → forward upstream, otherwise the
    /// static middleware. Never fails; errors become gateway responses.
    pub async fn handle(&self, req: &Request) -> Response {
        if let Some(rule) = self.rules.find(req.path()) {
            return match self.forwarder.forward(req, rule).await {
                Ok(response) => {
                    tracing::info!(
                        target = %rule.target,
                        method = req.method.as_str(),
                        path = %req.target,
                        status = response.status.as_u16(),
                        "request forwarded"
                    );
                    response
                }
                Err(err) => {
                    tracing::warn!(
                        target = %rule.target,
                        method = req.method.as_str(),
                        path = %req.target,
                        error = %err,
                        "forwarding failed"
                    );
                    err.to_response()
                }
            };
        }

        match &self.statics {
            Some(statics) => statics.serve(req).await,
            None => Response::not_found(),
        }
    }
}
