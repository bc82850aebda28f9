//! Reverse proxy functionality
//!
//! The rule table maps request path prefixes to backend origins; the
//! forwarder carries a single matched request to its backend and relays the
//! response, over plain TCP or TLS depending on the target scheme.

pub mod rules;
pub mod tls;
pub mod upstream;

pub use rules::{ProxyRule, RuleTable};
pub use upstream::{ForwardError, Forwarder};
