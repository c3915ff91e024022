//! Plugin chain.
//!
//! A chain is an ordered list of [`Handler`]s. Every dispatch runs all of them,
//! front to back, against the same response/request pair, so whatever one
//! handler writes into the response the next one sees. There is no `next()`
//! to call and no way for a handler to skip the rest: the only ways out of a
//! dispatch are reaching the end, returning an error, or panicking.
//!
//! Chains are built in two phases. A [`ChainBuilder`] collects handlers during
//! setup; [`ChainBuilder::build`] freezes them into a [`PluginChain`], an
//! immutable, cheaply clonable dispatcher that any number of connection tasks
//! can share without locking.
//!
//! ```rust
//! use plait::PluginChain;
//!
//! #[derive(Default)]
//! struct Reply { lines: Vec<String> }
//!
//! let chain: PluginChain<Reply, &str> = PluginChain::builder()
//!     .add(|res: &mut Reply, req: &&str| res.lines.push(format!("hello {req}")))
//!     .add(|res: &mut Reply, _: &&str| res.lines.push("bye".to_owned()))
//!     .build();
//!
//! let mut reply = Reply::default();
//! chain.dispatch(&mut reply, &"alice").unwrap();
//! assert_eq!(reply.lines, ["hello alice", "bye"]);
//! ```

pub mod handler;
pub mod plugins;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Error;
use self::handler::{Handler, Outcome, Plugin};

// ── Builder ───────────────────────────────────────────────────────────────────

/// Collects handlers in registration order. Append-only.
pub struct ChainBuilder<Res, Req> {
    plugins: Vec<Plugin<Res, Req>>,
}

impl<Res, Req> ChainBuilder<Res, Req> {
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    /// Append a function or closure. Returns `self` for chaining.
    ///
    /// The handler may return `()` or `Result<(), E>`; see [`Outcome`].
    pub fn add<F, O>(self, handler: F) -> Self
    where
        F: Fn(&mut Res, &Req) -> O + Send + Sync + 'static,
        O: Outcome,
    {
        self.add_handler(handler)
    }

    /// Append any [`Handler`] implementation. Returns `self` for chaining.
    pub fn add_handler(mut self, handler: impl Handler<Res, Req> + 'static) -> Self {
        self.plugins.push(Plugin::new(handler));
        self
    }

    pub fn len(&self) -> usize { self.plugins.len() }
    pub fn is_empty(&self) -> bool { self.plugins.is_empty() }

    /// Freeze the registered handlers into an immutable [`PluginChain`].
    pub fn build(self) -> PluginChain<Res, Req> {
        debug!(handlers = self.plugins.len(), "plugin chain built");
        PluginChain { plugins: Arc::from(self.plugins) }
    }
}

impl<Res, Req> Default for ChainBuilder<Res, Req> {
    fn default() -> Self { Self::new() }
}

impl<Res, Req> fmt::Debug for ChainBuilder<Res, Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBuilder").field("plugins", &self.plugins).finish()
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// A frozen, ordered sequence of handlers.
///
/// Clones share the same sequence: one `Arc` increment, no handler copies.
pub struct PluginChain<Res, Req> {
    plugins: Arc<[Plugin<Res, Req>]>,
}

impl<Res, Req> PluginChain<Res, Req> {
    /// Start an empty [`ChainBuilder`].
    pub fn builder() -> ChainBuilder<Res, Req> {
        ChainBuilder::new()
    }

    pub fn len(&self) -> usize { self.plugins.len() }
    pub fn is_empty(&self) -> bool { self.plugins.is_empty() }

    /// Registered plugins, in dispatch order.
    pub fn plugins(&self) -> &[Plugin<Res, Req>] { &self.plugins }

    /// Run every handler, in registration order, against `res` and `req`.
    ///
    /// The first handler to return an error stops the dispatch; its error is
    /// returned as [`Error::Handler`] carrying the handler's position. A
    /// handler that panics unwinds straight through this call. In both cases
    /// the handlers after it do not run.
    pub fn dispatch(&self, res: &mut Res, req: &Req) -> Result<(), Error> {
        for (index, plugin) in self.plugins.iter().enumerate() {
            trace!(index, plugin = plugin.name(), "dispatch");
            plugin
                .call(res, req)
                .map_err(|source| Error::Handler { index, source })?;
        }
        Ok(())
    }
}

impl<Res, Req> Clone for PluginChain<Res, Req> {
    fn clone(&self) -> Self {
        Self { plugins: Arc::clone(&self.plugins) }
    }
}

impl<Res, Req> Default for PluginChain<Res, Req> {
    fn default() -> Self { ChainBuilder::new().build() }
}

impl<Res, Req> From<ChainBuilder<Res, Req>> for PluginChain<Res, Req> {
    fn from(builder: ChainBuilder<Res, Req>) -> Self { builder.build() }
}

impl<Res, Req> fmt::Debug for PluginChain<Res, Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginChain").field("plugins", &self.plugins).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::error::BoxError;

    type Log = Vec<u32>;

    fn builder() -> ChainBuilder<Log, u32> {
        ChainBuilder::new()
    }

    fn record(id: u32) -> impl Fn(&mut Log, &u32) + Send + Sync + 'static {
        move |log: &mut Log, _req: &u32| log.push(id)
    }

    #[test]
    fn empty_chain_is_a_no_op() {
        let chain = builder().build();
        let mut log = Log::new();
        chain.dispatch(&mut log, &0).unwrap();
        assert!(chain.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn dispatch_runs_handlers_in_registration_order() {
        let chain = builder().add(record(1)).add(record(2)).add(record(3)).build();
        let mut log = Log::new();
        chain.dispatch(&mut log, &0).unwrap();
        assert_eq!(log, [1, 2, 3]);
    }

    #[test]
    fn every_handler_runs_exactly_once_per_dispatch() {
        let mut b = builder();
        for id in 0..10 {
            assert_eq!(b.len(), id as usize);
            b = b.add(record(id));
        }
        let chain = b.build();
        assert_eq!(chain.len(), 10);

        let mut log = Log::new();
        chain.dispatch(&mut log, &0).unwrap();
        assert_eq!(log, (0..10).collect::<Vec<_>>());

        chain.dispatch(&mut log, &0).unwrap();
        assert_eq!(log.len(), 20);
    }

    #[test]
    fn later_handlers_see_earlier_mutations() {
        #[derive(Default)]
        struct Res {
            authenticated: bool,
            body: String,
        }

        let chain: PluginChain<Res, &str> = PluginChain::builder()
            .add(|res: &mut Res, req: &&str| res.authenticated = *req == "secret")
            .add(|res: &mut Res, _: &&str| {
                res.body = if res.authenticated { "welcome" } else { "denied" }.to_owned();
            })
            .build();

        let mut res = Res::default();
        chain.dispatch(&mut res, &"secret").unwrap();
        assert_eq!(res.body, "welcome");

        let mut res = Res::default();
        chain.dispatch(&mut res, &"guess").unwrap();
        assert_eq!(res.body, "denied");
    }

    #[test]
    fn handlers_receive_the_same_instances() {
        type Seen = Vec<(usize, usize)>;

        fn note_addresses(res: &mut Seen, req: &String) {
            let addrs = (res as *const Seen as usize, req as *const String as usize);
            res.push(addrs);
        }

        let chain: PluginChain<Seen, String> = PluginChain::builder()
            .add(note_addresses)
            .add(note_addresses)
            .build();
        let mut seen = Seen::new();
        let req = String::from("GET /");
        chain.dispatch(&mut seen, &req).unwrap();

        let expected = (&seen as *const Seen as usize, &req as *const String as usize);
        assert_eq!(seen, [expected, expected]);
    }

    #[test]
    fn first_error_stops_the_chain() {
        let chain = builder()
            .add(record(1))
            .add(|log: &mut Log, _: &u32| -> Result<(), BoxError> {
                log.push(2);
                Err("rejected".into())
            })
            .add(record(3))
            .build();

        let mut log = Log::new();
        let err = chain.dispatch(&mut log, &0).unwrap_err();
        assert_eq!(log, [1, 2]);
        assert_eq!(err.handler_index(), Some(1));
        assert_eq!(err.to_string(), "handler #1 failed: rejected");
    }

    #[test]
    fn crate_errors_are_valid_handler_errors() {
        let chain = builder()
            .add(|_: &mut Log, _: &u32| -> Result<(), Error> {
                Err(Error::from(std::io::Error::other("disk gone")))
            })
            .build();

        let err = chain.dispatch(&mut Log::new(), &0).unwrap_err();
        assert_eq!(err.handler_index(), Some(0));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn panic_propagates_and_stops_the_chain() {
        fn explode(_: &mut Log, _: &u32) {
            panic!("handler blew up");
        }

        let chain = builder()
            .add(record(1))
            .add(explode)
            .add(record(3))
            .build();

        let mut log = Log::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| chain.dispatch(&mut log, &0)));
        assert!(outcome.is_err());
        assert_eq!(log, [1]);
    }

    #[test]
    fn clones_share_the_sequence() {
        let chain = builder().add(record(7)).build();
        let copy = chain.clone();
        assert!(Arc::ptr_eq(&chain.plugins, &copy.plugins));

        let mut log = Log::new();
        copy.dispatch(&mut log, &0).unwrap();
        chain.dispatch(&mut log, &0).unwrap();
        assert_eq!(log, [7, 7]);
    }

    #[test]
    fn chain_is_shareable_across_threads() {
        let chain = builder().add(|log: &mut Log, req: &u32| log.push(*req)).build();

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let chain = chain.clone();
                std::thread::spawn(move || {
                    let mut log = Log::new();
                    chain.dispatch(&mut log, &n).unwrap();
                    log
                })
            })
            .collect();

        for (n, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), [n as u32]);
        }
    }

    #[test]
    fn builder_converts_into_chain() {
        let chain: PluginChain<Log, u32> = builder().add(record(1)).into();
        assert_eq!(chain.len(), 1);
        assert_eq!(PluginChain::<Log, u32>::default().len(), 0);
    }

    #[test]
    fn request_may_borrow_from_the_caller() {
        fn shout(res: &mut Vec<String>, req: &&str) {
            res.push(req.to_uppercase());
        }

        let line = String::from("get /users");
        let chain: PluginChain<Vec<String>, &str> = PluginChain::builder().add(shout).build();

        let mut out = Vec::new();
        chain.dispatch(&mut out, &line.as_str()).unwrap();
        assert_eq!(out, ["GET /USERS"]);
    }

    #[test]
    fn plugins_are_listed_in_dispatch_order() {
        fn first(_: &mut Log, _: &u32) {}
        fn second(_: &mut Log, _: &u32) {}

        let chain = builder().add(first).add(second).build();
        let names: Vec<_> = chain.plugins().iter().map(Plugin::name).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("first"));
        assert!(names[1].ends_with("second"));
    }
}
