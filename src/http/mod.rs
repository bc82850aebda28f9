//! HTTP protocol implementation.
//!
//! A minimal HTTP/1.1 layer with keep-alive support, shared by the client
//! side of the listener and the upstream side of the forwarder.
//!
//! # Architecture
//!
//! - **`connection`**: per-client connection handler implementing the
//!   request-response state machine
//! - **`parser`**: parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation and helpers
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type lookup based on file extensions
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Proxy rule lookup, forward or serve file
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
