//! Static file fallback.
//!
//! Serves the front-end build output for every request no proxy rule claims.
//! GET and HEAD only; directory paths resolve to the configured index file.

use std::path::{Component, Path, PathBuf};

use crate::config::StaticConfig;
use crate::http::mime;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub struct StaticFiles {
    root: PathBuf,
    index: String,
}

impl StaticFiles {
    pub fn new(cfg: &StaticConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            index: cfg.index.clone(),
        }
    }

    pub async fn serve(&self, req: &Request) -> Response {
        if req.method != Method::GET && req.method != Method::HEAD {
            return Response::method_not_allowed();
        }

        let Some(path) = self.resolve(req.path()) else {
            return Response::not_found();
        };

        match tokio::fs::read(&path).await {
            Ok(contents) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", mime::from_path(&path))
                .body(contents)
                .build(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Response::not_found(),
            // Directories reach here as "is a directory" errors on read
            Err(e) if is_directory_error(&e) => self.serve_index(&path).await,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read static file");
                Response::internal_error()
            }
        }
    }

    /// Maps a request path onto a file under the document root, or None for
    /// paths that try to escape it.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let rel = request_path.trim_start_matches('/');

        let rel_path = Path::new(rel);
        for component in rel_path.components() {
            match component {
                Component::Normal(_) => {}
                // ".." and friends never resolve inside the root
                _ => return None,
            }
        }

        let mut path = self.root.join(rel_path);

        if rel.is_empty() || request_path.ends_with('/') {
            path = path.join(&self.index);
        }

        Some(path)
    }

    async fn serve_index(&self, dir: &Path) -> Response {
        let path = dir.join(&self.index);

        match tokio::fs::read(&path).await {
            Ok(contents) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", mime::from_path(&path))
                .body(contents)
                .build(),
            Err(_) => Response::not_found(),
        }
    }
}

fn is_directory_error(e: &std::io::Error) -> bool {
    // ErrorKind::IsADirectory is stable but reading a directory may also
    // surface as other kinds depending on platform; fall back to raw errno 21
    // (EISDIR) on unix.
    #[cfg(unix)]
    {
        if e.raw_os_error() == Some(21) {
            return true;
        }
    }
    matches!(e.kind(), std::io::ErrorKind::IsADirectory)
}
