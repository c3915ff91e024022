//! # plait
//!
//! An ordered plugin chain for HTTP services. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! You register handlers. For every request, plait calls each of them, in the
//! order you registered them, with the same response and the same request.
//! Whatever one handler writes into the response, the next one sees. There is
//! no `next()`, no short-circuit, no priority: an ordered broadcast.
//!
//! - **Append-only**: handlers are added during setup, then the chain is
//!   frozen. No removal, no reordering.
//! - **Synchronous**: a dispatch is a plain loop. It never awaits and never
//!   locks; a frozen chain is shared by every connection task as-is.
//! - **Fail fast**: the first handler to return an error stops the chain and
//!   the error comes back to the caller, tagged with the handler's position.
//!   A panic unwinds straight out of the dispatch.
//!
//! The chain itself is generic over its response and request types: see
//! [`PluginChain`]. For HTTP, plait ships a small hyper host ([`Server`],
//! [`Request`], [`Response`]) that runs one dispatch per request and turns
//! a failed dispatch into `500 Internal Server Error`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use plait::middleware::plugins;
//! use plait::{HttpChain, Request, Response, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), plait::Error> {
//!     let chain = HttpChain::builder()
//!         .add(plugins::trace)
//!         .add_handler(plugins::header("server", "plait")?)
//!         .add(hello)
//!         .add(require_token)
//!         .build();
//!
//!     Server::bind("0.0.0.0:3000")?.serve(chain).await
//! }
//!
//! fn hello(res: &mut Response, req: &Request) {
//!     res.text(format!("hello from {}", req.path()));
//! }
//!
//! fn require_token(res: &mut Response, req: &Request) {
//!     if req.header("authorization").is_none() {
//!         res.set_status(StatusCode::UNAUTHORIZED).set_body("");
//!     }
//! }
//! ```

mod error;
mod request;
mod response;
mod server;

pub mod middleware;

pub use error::{BoxError, Error};
pub use middleware::handler::{Handler, Outcome, Plugin};
pub use middleware::{ChainBuilder, PluginChain};
pub use request::Request;
pub use response::{ContentType, Response};
pub use server::{Listening, Server};

pub use http::{Method, StatusCode};

/// The chain the [`Server`] runs: plait's own [`Response`] and [`Request`].
pub type HttpChain = PluginChain<Response, Request>;
