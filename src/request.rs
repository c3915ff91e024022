//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request with its body fully read.
///
/// Handlers only ever see `&Request`: the request is shared, read-only, by
/// every handler in a dispatch.
#[derive(Debug)]
pub struct Request {
    parts: Parts,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub(crate) fn from_parts(parts: Parts, body: Bytes, remote_addr: Option<SocketAddr>) -> Self {
        Self { parts, body, remote_addr }
    }

    /// Wraps an already-buffered [`http::Request`]. Useful for driving a
    /// chain without a server, e.g. in tests.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body, None)
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn query(&self) -> Option<&str> { self.parts.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Peer address, when the request came in over a socket.
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup. `None` for missing or non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_request_line_headers_and_body() {
        let req = Request::from_http(
            http::Request::post("/users?active=true")
                .header("Content-Type", "application/json")
                .body(Bytes::from_static(br#"{"name":"alice"}"#))
                .unwrap(),
        );

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users");
        assert_eq!(req.uri(), "/users?active=true");
        assert_eq!(req.query(), Some("active=true"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
        assert_eq!(req.body(), br#"{"name":"alice"}"#);
        assert_eq!(req.remote_addr(), None);
    }
}
