//! Gemini transport.
//!
//! A request is a single absolute URL followed by CRLF, at most 1024 bytes.
//! The response is a status line and, on success, the body. TLS is
//! terminated in front of this listener.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use crate::config::DebugLevel;
use crate::errors::WikiError;
use crate::response::Response;
use crate::router::{Request, Router};
use crate::types::AppState;

pub const MAX_REQUEST_SIZE: usize = 1024;

pub struct Server {
    state: AppState,
    router: Router,
}

impl Server {
    pub fn new(state: AppState, router: Router) -> Self {
        if state.config.debug_level != DebugLevel::None {
            for route in router.routes() {
                info!("Loaded server route {} {}", route.name, route.path.as_str());
            }
        }
        Self { state, router }
    }

    /// Dispatch one request line to a response.
    ///
    /// Handler errors and panics end here as status 40 and never reach the
    /// listener.
    pub fn handle_request(&self, line: &str) -> Response {
        let url = match Url::parse(line.trim()) {
            Ok(url) => url,
            Err(e) => {
                warn!("Malformed request {:?}: {}", line, e);
                return Response::bad_request("Invalid URL");
            }
        };
        if url.scheme() != "gemini" {
            warn!("Refusing {} request for {}", url.scheme(), url);
            return Response::proxy_refused();
        }

        let request = Request::new(url);
        let prefix = self.state.config.path_prefix.as_deref();
        let Some((route, params)) = self.router.find_match(request.path(), prefix) else {
            warn!("No route for {}", request.path());
            return Response::not_found();
        };
        if self.state.config.debug_level != DebugLevel::None {
            info!("Request {} matched {} {:?}", request.path(), route.name, params);
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| (route.handler)(&request, &params, &self.state)));
        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                match &e {
                    WikiError::NotFound | WikiError::InvalidPath(_) | WikiError::BadRequest(_) => {
                        warn!("Request {} failed: {}", request.path(), e)
                    }
                    _ => error!("Request {} failed: {}", request.path(), e),
                }
                e.into_response()
            }
            Err(_) => {
                error!("Handler {} panicked on {}", route.name, request.path());
                Response::temporary_failure()
            }
        }
    }

    /// Read one request from `stream`, answer it and close
    pub async fn handle_connection<S>(&self, mut stream: S) -> Result<(), WikiError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf = [0u8; MAX_REQUEST_SIZE + 2];
        let mut pos = 0;

        loop {
            let n = stream.read(&mut buf[pos..]).await?;
            if n == 0 {
                debug!("Connection closed before a complete request");
                return Ok(());
            }
            pos += n;
            if buf[..pos].ends_with(b"\r\n") {
                break;
            }
            if pos >= buf.len() {
                let response = Response::bad_request("Request exceeds maximum size");
                stream.write_all(&response.to_bytes()).await?;
                return Ok(());
            }
        }

        let response = match std::str::from_utf8(&buf[..pos - 2]) {
            Ok(line) => self.handle_request(line),
            Err(_) => Response::bad_request("Invalid UTF-8 in request"),
        };
        info!("{} {} ({} bytes)", response.status.code(), response.meta, response.body.len());
        stream.write_all(&response.to_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }

    /// Accept connections forever, one task per connection
    pub async fn listen(self: Arc<Self>) -> Result<(), WikiError> {
        let (host, port) = self.state.config.bind_addr();
        let listener = TcpListener::bind((host.as_str(), port)).await?;
        info!("Gemini wiki listening on {}:{}", host, port);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            debug!("Connection from {}", peer);
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream).await {
                    warn!("Connection from {} failed: {}", peer, e);
                }
            });
        }
    }
}
