//! Devgate - Development Reverse Proxy
//!
//! A small HTTP server for local front-end development: requests whose path
//! matches a configured prefix are forwarded to a backend origin, everything
//! else is served from a static document root.

pub mod config;
pub mod files;
pub mod http;
pub mod proxy;
pub mod server;
