//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A chain holds handlers of *different* types in a single ordered slice.
//! Rust collections can only hold one concrete type, so every handler is
//! hidden behind a trait object (`dyn Handler`) and wrapped in a [`Plugin`].
//!
//! ```text
//! fn stamp(res: &mut Response, req: &Request) { … }   ← user writes this
//!        ↓ builder.add(stamp)
//! Plugin::new(stamp)                                 ← blanket Handler impl
//!        ↓  stored as Arc<dyn Handler<Res, Req>>
//! plugin.call(&mut res, &req)  at dispatch time      ← one vtable call
//!        ↓
//! stamp(&mut res, &req).into_outcome()               ← () or Result<(), E>
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Conversion of a handler's return value into success or failure.
///
/// Handlers that cannot fail return `()`. Handlers that can fail return
/// `Result<(), E>` for any `E` convertible into a [`BoxError`]: a custom
/// error type, [`crate::Error`], a `String` or a `&'static str`.
pub trait Outcome {
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl Outcome for () {
    fn into_outcome(self) -> Result<(), BoxError> { Ok(()) }
}

impl<E> Outcome for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

// ── Handler trait ─────────────────────────────────────────────────────────────

/// One unit of request-processing logic in a [`PluginChain`](crate::PluginChain).
///
/// Automatically implemented for every function or closure of the shape
///
/// ```text
/// Fn(&mut Res, &Req) -> impl Outcome
/// ```
///
/// Implement it by hand on a struct when the handler carries configuration,
/// then register it with [`ChainBuilder::add_handler`](crate::ChainBuilder::add_handler):
///
/// ```rust
/// use plait::{BoxError, Handler, PluginChain};
///
/// struct Append(u32);
///
/// impl Handler<Vec<u32>, ()> for Append {
///     fn call(&self, res: &mut Vec<u32>, _req: &()) -> Result<(), BoxError> {
///         res.push(self.0);
///         Ok(())
///     }
/// }
///
/// let chain: PluginChain<Vec<u32>, ()> = PluginChain::builder()
///     .add_handler(Append(7))
///     .build();
///
/// let mut out = Vec::new();
/// chain.dispatch(&mut out, &()).unwrap();
/// assert_eq!(out, [7]);
/// ```
pub trait Handler<Res, Req>: Send + Sync {
    fn call(&self, res: &mut Res, req: &Req) -> Result<(), BoxError>;
}

impl<F, O, Res, Req> Handler<Res, Req> for F
where
    F: Fn(&mut Res, &Req) -> O + Send + Sync + 'static,
    O: Outcome,
{
    fn call(&self, res: &mut Res, req: &Req) -> Result<(), BoxError> {
        (self)(res, req).into_outcome()
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

/// A registered handler: exactly one [`Handler`], immutable once created.
///
/// Cloning a `Plugin` clones the `Arc`, never the handler itself.
pub struct Plugin<Res, Req> {
    handler: Arc<dyn Handler<Res, Req>>,
    name: &'static str,
}

impl<Res, Req> Plugin<Res, Req> {
    pub fn new<H: Handler<Res, Req> + 'static>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            name: std::any::type_name::<H>(),
        }
    }

    /// Type name of the wrapped handler, for diagnostics.
    pub fn name(&self) -> &'static str { self.name }

    pub fn call(&self, res: &mut Res, req: &Req) -> Result<(), BoxError> {
        self.handler.call(res, req)
    }
}

impl<Res, Req> Clone for Plugin<Res, Req> {
    fn clone(&self) -> Self {
        Self { handler: Arc::clone(&self.handler), name: self.name }
    }
}

impl<Res, Req> fmt::Debug for Plugin<Res, Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Plugin").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(res: &mut u32, _req: &()) {
        *res *= 2;
    }

    #[test]
    fn unit_outcome_is_success() {
        let plugin: Plugin<u32, ()> = Plugin::new(double);
        let mut n = 21;
        plugin.call(&mut n, &()).unwrap();
        assert_eq!(n, 42);
        assert!(plugin.name().ends_with("double"));
    }

    #[test]
    fn result_outcome_carries_the_error() {
        fn refuse(_res: &mut u32, _req: &()) -> Result<(), &'static str> {
            Err("nope")
        }

        let plugin: Plugin<u32, ()> = Plugin::new(refuse);
        let err = plugin.call(&mut 0, &()).unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn clones_share_the_handler() {
        let plugin: Plugin<u32, ()> = Plugin::new(double);
        let copy = plugin.clone();
        let mut n = 1;
        plugin.call(&mut n, &()).unwrap();
        copy.call(&mut n, &()).unwrap();
        assert_eq!(n, 4);
        assert!(Arc::ptr_eq(&plugin.handler, &copy.handler));
    }
}
