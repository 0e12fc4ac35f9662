//! Local static file server
//!
//! Local paths are checked over HTTP so relative links behave exactly as
//! they would once published. The server binds to loopback, lives only for
//! one run, and is shut down before the report is returned.

mod files;

pub use files::{render_markdown, ServeOptions};

use crate::{CheckError, Result};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// A running local server
#[derive(Debug)]
pub struct LocalServer {
    port: u16,
    root: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl LocalServer {
    /// Binds to `127.0.0.1` and starts serving `options.root`
    ///
    /// A port of 0 picks a free port.
    ///
    /// # Returns
    ///
    /// * `Ok(LocalServer)` - Server accepting connections
    /// * `Err(CheckError)` - The root is missing or the port could not be bound
    pub async fn start(options: ServeOptions, port: u16) -> Result<Self> {
        let root = options.root.canonicalize().map_err(|e| {
            CheckError::Server(format!("cannot serve '{}': {}", options.root.display(), e))
        })?;
        let options = Arc::new(ServeOptions {
            root: root.clone(),
            ..options
        });

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| CheckError::Server(format!("cannot bind port {}: {}", port, e)))?;
        let port = listener.local_addr()?.port();
        debug!("Serving {} on port {}", root.display(), port);

        let (shutdown, mut stop) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    accepted = listener.accept() => {
                        let stream = match accepted {
                            Ok((stream, _)) => stream,
                            Err(e) => {
                                debug!("Local server accept error: {}", e);
                                continue;
                            }
                        };
                        let options = Arc::clone(&options);
                        let io = TokioIo::new(stream);

                        tokio::spawn(async move {
                            let service = service_fn(move |req: Request<Incoming>| {
                                let options = Arc::clone(&options);
                                async move { files::handle_request(req, &options).await }
                            });

                            if let Err(e) = hyper::server::conn::http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                debug!("Local server connection error: {}", e);
                            }
                        });
                    }
                }
            }
        });

        Ok(Self {
            port,
            root,
            shutdown: Some(shutdown),
            handle,
        })
    }

    /// Returns the bound port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the canonical directory being served
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the base URL, e.g. `http://localhost:8080/`
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }

    /// Maps a local path under the served root to its URL
    ///
    /// Directories get a trailing slash so relative links on their index
    /// page resolve inside them.
    pub fn url_for(&self, path: &Path) -> Result<String> {
        let canonical = path.canonicalize()?;
        let relative = canonical.strip_prefix(&self.root).map_err(|_| {
            CheckError::Server(format!(
                "'{}' is outside the server root '{}'",
                path.display(),
                self.root.display()
            ))
        })?;

        let mut url = self.base_url();
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(urlencoding::encode(&part.to_string_lossy()).into_owned()),
                _ => None,
            })
            .collect();
        url.push_str(&segments.join("/"));

        if canonical.is_dir() && !segments.is_empty() {
            url.push('/');
        }

        Ok(url)
    }

    /// Stops accepting connections and waits for the accept loop to exit
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            debug!("Local server task ended abnormally: {}", e);
        }
    }
}

/// Picks the directory to serve for a set of local paths
///
/// An explicit root wins. A single directory is served as-is and a single
/// file is served from its parent. Several paths are served from the
/// current working directory.
pub fn resolve_server_root(paths: &[String], server_root: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = server_root {
        return Ok(root.to_path_buf());
    }

    match paths {
        [single] => {
            let path = Path::new(single);
            if path.is_dir() {
                Ok(path.to_path_buf())
            } else {
                let parent = path
                    .canonicalize()?
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| CheckError::Server(format!("'{}' has no parent directory", single)))?;
                Ok(parent)
            }
        }
        _ => Ok(std::env::current_dir()?),
    }
}
