//! HTTP host and graceful shutdown.
//!
//! The server owns everything the plugin chain does not: sockets, HTTP
//! framing, body buffering and the mapping of chain failures to status codes.
//! Each request gets a fresh [`Response`] and one pass through the chain.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C (or when the future given to
//! [`Listening::serve_with_shutdown`] resolves) the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to wind down: idle keep-alive connections
//!    close at once, HTTP/1 requests in flight finish and then close, HTTP/2
//!    connections send GOAWAY and finish their open streams.
//! 3. Returns from `serve` once every connection is gone, which lets `main`
//!    exit cleanly.
//!
//! # Panics in handlers
//!
//! A handler panic unwinds out of the dispatch. Over HTTP/1 the request runs
//! on its connection task, so the panic drops that connection and the accept
//! loop logs it when reaping the task. Over HTTP/2 hyper runs each stream on
//! its own executor task: the panic resets that stream only, and tokio's
//! default panic hook is the only report.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::HttpChain;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` once it starts listening.
    ///
    /// ```rust
    /// use plait::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { addr: addr.parse()? })
    }

    /// Binds the socket without serving yet. Use this when the real address
    /// matters, e.g. after binding to port `0`.
    pub async fn listen(self) -> Result<Listening, Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let addr = listener.local_addr()?;
        Ok(Listening { listener, addr })
    }

    /// Binds and serves `chain` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, chain: HttpChain) -> Result<(), Error> {
        self.listen().await?.serve(chain).await
    }

    /// Binds and serves `chain` until `signal` resolves, then drains.
    pub async fn serve_with_shutdown<F>(self, chain: HttpChain, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        self.listen().await?.serve_with_shutdown(chain, signal).await
    }
}

/// A bound server socket, ready to serve.
#[derive(Debug)]
pub struct Listening {
    listener: TcpListener,
    addr: SocketAddr,
}

impl Listening {
    pub fn local_addr(&self) -> SocketAddr { self.addr }

    /// Serves `chain` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, chain: HttpChain) -> Result<(), Error> {
        self.serve_with_shutdown(chain, shutdown_signal()).await
    }

    /// Serves `chain` until `signal` resolves, then drains.
    ///
    /// Returns only after every in-flight connection has finished.
    pub async fn serve_with_shutdown<F>(self, chain: HttpChain, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let Self { listener, addr } = self;

        info!(%addr, handlers = chain.len(), "plait listening");

        // One builder for all connections: HTTP/1.1 or HTTP/2, whatever the
        // client negotiates.
        let builder = ConnBuilder::new(TokioExecutor::new());

        // Every open connection, so shutdown can ask them to close.
        let graceful = GracefulShutdown::new();

        // Every spawned connection task, so panics get reaped and logged.
        let mut tasks = JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let chain = chain.clone();
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let chain = chain.clone();
                        async move { handle(chain, req, remote_addr).await }
                    });

                    let conn = builder.serve_connection(TokioIo::new(stream), svc);
                    let conn = graceful.watch(conn.into_owned());

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set does not grow without bound.
                Some(res) = tasks.join_next(), if !tasks.is_empty() => reap(res),
            }
        }

        drop(listener);
        graceful.shutdown().await;

        while let Some(res) = tasks.join_next().await {
            reap(res);
        }

        info!("plait stopped");
        Ok(())
    }
}

/// A connection task only fails to join when a handler panicked inside it.
fn reap(res: Result<(), JoinError>) {
    if let Err(e) = res {
        if e.is_panic() {
            error!("connection task panicked, connection dropped");
        }
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// One request, one response, one pass through the chain.
///
/// Never returns an error to hyper: unreadable bodies become 400 and failed
/// dispatches become 500. A panicking handler unwinds through here; see the
/// module docs for what that costs under each protocol.
async fn handle(
    chain: HttpChain,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(Response::with_status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let req = Request::from_parts(parts, body, Some(remote_addr));
    let mut res = Response::new();

    if let Err(e) = chain.dispatch(&mut res, &req) {
        error!(method = %req.method(), path = req.path(), "plugin chain failed: {e}");
        res = Response::with_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(res.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM and SIGINT; elsewhere only Ctrl-C.
/// If a handler cannot be installed, that arm never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
