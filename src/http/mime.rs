//! MIME type lookup for static assets.
//!
//! Covers the extensions a front-end build output typically contains; anything
//! unknown is served as `application/octet-stream`.

use std::path::Path;

pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") | Some("map") => "application/json",
        Some("wasm") => "application/wasm",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_asset_types() {
        assert_eq!(from_path(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(from_path(Path::new("app.JS")), "application/javascript");
        assert_eq!(from_path(Path::new("chunk.js.map")), "application/json");
        assert_eq!(from_path(Path::new("blob")), "application/octet-stream");
    }
}
