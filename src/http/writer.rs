use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

fn serialize_response(resp: &Response, include_body: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + if include_body { resp.body.len() } else { 0 });

    // Status line. The reason phrase may be empty for relayed statuses; the
    // separating space is still required by the grammar.
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");

    // HEAD responses carry the entity headers but no entity.
    if include_body {
        buf.extend_from_slice(&resp.body);
    }

    buf
}

/// Owns the serialized bytes of one response and tracks how much of them has
/// reached the socket, so a partial write can be resumed.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self::with_body(response, true)
    }

    /// `include_body: false` is used for HEAD requests.
    pub fn with_body(response: &Response, include_body: bool) -> Self {
        Self {
            buffer: serialize_response(response, include_body),
            written: 0,
        }
    }

    pub async fn write_to_stream(&mut self, stream: &mut TcpStream) -> anyhow::Result<()> {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::{Response, StatusCode};

    #[test]
    fn head_omits_body_but_keeps_content_length() {
        let resp = Response::ok("hello");
        let bytes = serialize_response(&resp, false);
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("Content-Length: 5"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn relayed_status_without_reason_phrase() {
        let resp = crate::http::response::ResponseBuilder::new(StatusCode::Other(418)).build();
        let bytes = serialize_response(&resp, true);
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("HTTP/1.1 418 \r\n"));
    }
}
