//! Upstream connection and request forwarding
//!
//! Carries one matched request to its backend and reads the response back.
//! The upstream leg is always a fresh connection closed after the exchange;
//! keep-alive only exists on the client side.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::proxy::rules::ProxyRule;
use crate::proxy::tls::TlsClient;

const BUFFER_SIZE: usize = 8192;
const MAX_RESPONSE_HEADER_BYTES: usize = 64 * 1024;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a forward failed, and therefore which gateway status the client sees.
#[derive(Debug)]
pub enum ForwardError {
    /// TCP connect to the target failed
    Connect(io::Error),
    ConnectTimeout,
    /// TLS handshake failed; with `secure: true` this includes certificate
    /// validation failures
    Tls(io::Error),
    ExchangeTimeout,
    /// I/O error while talking to a connected backend
    Io(io::Error),
    /// Backend answered with something that is not parseable HTTP
    Upstream(String),
}

impl std::fmt::Display for ForwardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardError::Connect(e) => write!(f, "failed to connect to backend: {e}"),
            ForwardError::ConnectTimeout => write!(f, "timed out connecting to backend"),
            ForwardError::Tls(e) => write!(f, "TLS handshake with backend failed: {e}"),
            ForwardError::ExchangeTimeout => write!(f, "timed out waiting for backend response"),
            ForwardError::Io(e) => write!(f, "backend connection error: {e}"),
            ForwardError::Upstream(msg) => write!(f, "invalid backend response: {msg}"),
        }
    }
}

impl std::error::Error for ForwardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForwardError::Connect(e) | ForwardError::Tls(e) | ForwardError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl ForwardError {
    /// The gateway-style response surfaced to the client.
    pub fn to_response(&self) -> Response {
        match self {
            ForwardError::ConnectTimeout | ForwardError::ExchangeTimeout => {
                Response::gateway_timeout("The backend server did not respond in time.")
            }
            _ => Response::bad_gateway("Failed to reach the backend server."),
        }
    }
}

/// Forwards requests to backend origins.
pub struct Forwarder {
    tls: TlsClient,
    connect_timeout: Duration,
    exchange_timeout: Duration,
}

impl Forwarder {
    pub fn new(connect_timeout: Duration, exchange_timeout: Duration) -> Self {
        Self {
            tls: TlsClient::new(),
            connect_timeout,
            exchange_timeout,
        }
    }

    /// Forward one request to the rule's target and return the backend's
    /// response, ready to relay.
    pub async fn forward(&self, req: &Request, rule: &ProxyRule) -> Result<Response, ForwardError> {
        tracing::debug!(
            target = %rule.target,
            method = req.method.as_str(),
            path = %req.target,
            "forwarding request"
        );

        let tcp = timeout(
            self.connect_timeout,
            TcpStream::connect((rule.host(), rule.port())),
        )
        .await
        .map_err(|_| ForwardError::ConnectTimeout)?
        .map_err(ForwardError::Connect)?;

        let outbound = encode_request(req, rule);

        let exchange = async {
            if rule.is_tls() {
                let mut stream = self
                    .tls
                    .connect(rule, tcp)
                    .await
                    .map_err(ForwardError::Tls)?;
                self.exchange(&mut stream, &outbound).await
            } else {
                let mut stream = tcp;
                self.exchange(&mut stream, &outbound).await
            }
        };

        timeout(self.exchange_timeout, exchange)
            .await
            .map_err(|_| ForwardError::ExchangeTimeout)?
    }

    async fn exchange<S>(&self, stream: &mut S, outbound: &[u8]) -> Result<Response, ForwardError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream.write_all(outbound).await.map_err(ForwardError::Io)?;
        stream.flush().await.map_err(ForwardError::Io)?;

        self.read_response(stream).await
    }

    /// Reads status line, headers and body from the backend.
    async fn read_response<S>(&self, stream: &mut S) -> Result<Response, ForwardError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

        loop {
            let n = stream.read_buf(&mut buffer).await.map_err(ForwardError::Io)?;

            if n == 0 {
                return Err(ForwardError::Upstream(
                    "connection closed before response headers".to_string(),
                ));
            }

            if let Some(headers_end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = buffer.split_to(headers_end + 4);
                let (status, headers) = parse_response_head(&head)?;

                let body = self.read_response_body(stream, &mut buffer, &headers).await?;

                return Ok(build_relay_response(status, headers, body));
            }

            if buffer.len() > MAX_RESPONSE_HEADER_BYTES {
                return Err(ForwardError::Upstream("response headers too large".to_string()));
            }
        }
    }

    /// Reads the response entity. Framing priority follows RFC 9112:
    /// Transfer-Encoding, then Content-Length, then read-to-EOF (the upstream
    /// leg always requests `Connection: close`).
    async fn read_response_body<S>(
        &self,
        stream: &mut S,
        buffer: &mut BytesMut,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<u8>, ForwardError>
    where
        S: AsyncRead + Unpin,
    {
        let chunked = header_value(headers, "Transfer-Encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);

        if chunked {
            let raw = self.read_to_eof(stream, buffer).await?;
            return decode_chunked(&raw);
        }

        let content_length = match header_value(headers, "Content-Length") {
            Some(v) => Some(
                v.parse::<usize>()
                    .map_err(|_| ForwardError::Upstream("invalid Content-Length".to_string()))?,
            ),
            None => None,
        };

        match content_length {
            Some(0) => Ok(Vec::new()),
            Some(len) => {
                let mut body = Vec::with_capacity(len);

                let from_buffer = buffer.len().min(len);
                body.extend_from_slice(&buffer[..from_buffer]);
                buffer.advance(from_buffer);

                while body.len() < len {
                    let n = stream.read_buf(buffer).await.map_err(ForwardError::Io)?;
                    if n == 0 {
                        return Err(ForwardError::Upstream(
                            "connection closed before complete body".to_string(),
                        ));
                    }
                    let take = buffer.len().min(len - body.len());
                    body.extend_from_slice(&buffer[..take]);
                    buffer.advance(take);
                }

                Ok(body)
            }
            None => self.read_to_eof(stream, buffer).await,
        }
    }

    async fn read_to_eof<S>(
        &self,
        stream: &mut S,
        buffer: &mut BytesMut,
    ) -> Result<Vec<u8>, ForwardError>
    where
        S: AsyncRead + Unpin,
    {
        let mut body = Vec::new();
        body.extend_from_slice(buffer);
        buffer.clear();

        loop {
            let n = stream.read_buf(buffer).await.map_err(ForwardError::Io)?;
            if n == 0 {
                return Ok(body);
            }
            body.extend_from_slice(buffer);
            buffer.clear();
        }
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_EXCHANGE_TIMEOUT)
    }
}

/// Serializes the outbound request. Public so tests can assert on the exact
/// bytes without a live backend.
pub fn encode_request(req: &Request, rule: &ProxyRule) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + req.body.len());

    let target = if req.target.is_empty() { "/" } else { &req.target };

    // Original path and query, forwarded unchanged
    buf.extend_from_slice(format!("{} {} {}\r\n", req.method.as_str(), target, req.version).as_bytes());

    let mut headers: Vec<(String, String)> = req
        .headers
        .iter()
        .filter(|(k, _)| !is_hop_by_hop(k) && !k.eq_ignore_ascii_case("Host"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    // Host header: the target's origin when change_origin is set, otherwise
    // whatever the client sent (falling back to the target for clients that
    // sent none, since HTTP/1.1 requires one).
    let host = if rule.change_origin {
        rule.host_header()
    } else {
        match req.header("Host") {
            Some(h) => h.to_string(),
            None => rule.host_header(),
        }
    };

    headers.push(("Host".to_string(), host));
    headers.push(("Connection".to_string(), "close".to_string()));

    for (key, value) in &headers {
        buf.extend_from_slice(format!("{key}: {value}\r\n").as_bytes());
    }

    buf.extend_from_slice(b"\r\n");

    if !req.body.is_empty() {
        buf.extend_from_slice(&req.body);
    }

    buf
}

fn is_hop_by_hop(header: &str) -> bool {
    const HOP_BY_HOP: [&str; 6] = [
        "Connection",
        "Keep-Alive",
        "Proxy-Connection",
        "Transfer-Encoding",
        "Upgrade",
        "TE",
    ];

    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(header))
}

fn header_value<'a>(headers: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn parse_response_head(
    head: &[u8],
) -> Result<(StatusCode, HashMap<String, String>), ForwardError> {
    let text = std::str::from_utf8(head)
        .map_err(|_| ForwardError::Upstream("response headers are not UTF-8".to_string()))?;

    let mut lines = text.lines();

    let status_line = lines
        .next()
        .ok_or_else(|| ForwardError::Upstream("empty response".to_string()))?;

    // "HTTP/1.1 200 OK" - the reason phrase is ignored, the code is kept
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| ForwardError::Upstream(format!("invalid status line {status_line:?}")))?;

    if !version.starts_with("HTTP/") {
        return Err(ForwardError::Upstream(format!(
            "invalid status line {status_line:?}"
        )));
    }

    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            break;
        }

        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    Ok((StatusCode::from_u16(code), headers))
}

/// Builds the client-facing response from the backend's parts. Hop-by-hop
/// headers and framing headers are dropped; the writer re-frames the entity
/// with an exact Content-Length.
fn build_relay_response(
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Vec<u8>,
) -> Response {
    let relayed: HashMap<String, String> = headers
        .into_iter()
        .filter(|(k, _)| {
            !is_hop_by_hop(k)
                && !k.eq_ignore_ascii_case("Content-Length")
                && !k.eq_ignore_ascii_case("Trailer")
        })
        .collect();

    ResponseBuilder::new(status).headers(relayed).body(body).build()
}

/// Decodes a chunked transfer coding body that has been fully buffered.
fn decode_chunked(raw: &[u8]) -> Result<Vec<u8>, ForwardError> {
    let mut out = Vec::new();
    let mut pos = 0;

    loop {
        let line_end = raw[pos..]
            .windows(2)
            .position(|w| w == b"\r\n")
            .map(|p| pos + p)
            .ok_or_else(|| ForwardError::Upstream("truncated chunk size line".to_string()))?;

        let size_line = std::str::from_utf8(&raw[pos..line_end])
            .map_err(|_| ForwardError::Upstream("invalid chunk size line".to_string()))?;

        // Chunk extensions after ';' are ignored
        let size_token = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_token, 16)
            .map_err(|_| ForwardError::Upstream(format!("invalid chunk size {size_token:?}")))?;

        pos = line_end + 2;

        if size == 0 {
            // Terminal chunk; trailers, if any, are discarded
            return Ok(out);
        }

        if raw.len() < pos + size + 2 {
            return Err(ForwardError::Upstream("truncated chunk data".to_string()));
        }

        out.extend_from_slice(&raw[pos..pos + size]);
        pos += size;

        if &raw[pos..pos + 2] != b"\r\n" {
            return Err(ForwardError::Upstream("missing chunk delimiter".to_string()));
        }
        pos += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_chunked_body() {
        let raw = b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(raw).unwrap(), b"hello world");
    }

    #[test]
    fn decode_chunked_rejects_truncated_data() {
        let raw = b"a\r\nhel";
        assert!(decode_chunked(raw).is_err());
    }

    #[test]
    fn parse_head_keeps_unknown_status() {
        let head = b"HTTP/1.1 418 I'm a teapot\r\nX-Tea: yes\r\n\r\n";
        let (status, headers) = parse_response_head(head).unwrap();

        assert_eq!(status.as_u16(), 418);
        assert_eq!(header_value(&headers, "x-tea"), Some("yes"));
    }
}
