//! Minimal plait example: a chain of plugins that build one response together.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/hello
//!   curl -i http://localhost:3000/admin
//!   curl -i -H 'authorization: Bearer t0k3n' http://localhost:3000/admin
//!   curl -i -X POST http://localhost:3000/echo -d 'ping'

use plait::middleware::plugins;
use plait::{HttpChain, Method, Request, Response, Server, StatusCode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), plait::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Every handler runs on every request, in this order.
    let chain = HttpChain::builder()
        .add(plugins::trace)
        .add_handler(plugins::header("server", "plait")?)
        .add(greet)
        .add(echo)
        .add(guard_admin)
        .build();

    Server::bind("0.0.0.0:3000")?.serve(chain).await
}

// Default body for everything.
fn greet(res: &mut Response, req: &Request) {
    res.text(format!("hello from {}\n", req.path()));
}

// POST /echo: overwrite the greeting with the request body.
fn echo(res: &mut Response, req: &Request) {
    if req.method() == Method::POST && req.path() == "/echo" {
        res.bytes(plait::ContentType::OctetStream, req.body().to_vec());
    }
}

// /admin without credentials: replace whatever earlier handlers wrote.
fn guard_admin(res: &mut Response, req: &Request) -> Result<(), plait::Error> {
    if req.path().starts_with("/admin") && req.header("authorization").is_none() {
        res.set_status(StatusCode::UNAUTHORIZED).text("unauthorized\n");
        res.insert_header("www-authenticate", "Bearer")?;
    }
    Ok(())
}
