//! Built-in plugins for [`HttpChain`](crate::HttpChain).
//!
//! ```rust
//! use plait::HttpChain;
//! use plait::middleware::plugins;
//!
//! # fn main() -> Result<(), plait::Error> {
//! let chain = HttpChain::builder()
//!     .add(plugins::trace)
//!     .add_handler(plugins::header("server", "plait")?)
//!     .build();
//! # Ok(()) }
//! ```

use http::header::{HeaderName, HeaderValue};
use tracing::info;

use crate::error::{BoxError, Error};
use crate::middleware::handler::Handler;
use crate::request::Request;
use crate::response::{Response, header_pair};

/// Logs method, path and peer of every request at `info` level.
pub fn trace(_res: &mut Response, req: &Request) {
    info!(
        method = %req.method(),
        path = req.path(),
        peer = ?req.remote_addr(),
        "request"
    );
}

/// A plugin that sets one fixed header on every response.
#[derive(Clone, Debug)]
pub struct SetHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl SetHeader {
    pub fn name(&self) -> &HeaderName { &self.name }
    pub fn value(&self) -> &HeaderValue { &self.value }
}

impl Handler<Response, Request> for SetHeader {
    fn call(&self, res: &mut Response, _req: &Request) -> Result<(), BoxError> {
        res.headers_mut().insert(self.name.clone(), self.value.clone());
        Ok(())
    }
}

/// Builds a [`SetHeader`] plugin. The name and value are validated here, so
/// the plugin itself never fails.
pub fn header<K, V>(name: K, value: V) -> Result<SetHeader, Error>
where
    HeaderName: TryFrom<K>,
    <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
    HeaderValue: TryFrom<V>,
    <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
{
    let (name, value) = header_pair(name, value)?;
    Ok(SetHeader { name, value })
}
