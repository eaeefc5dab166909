//! The router: pattern-matched dispatch over a tree of runners.
//!
//! Routers are built in two phases. A [`RouterBuilder`] collects middleware,
//! routes, branches and scopes; [`RouterBuilder::build`] validates the whole
//! tree and returns an immutable [`Router`] ready for dispatch.
//!
//! # Dispatch
//!
//! For each call to [`Router::run`]:
//!
//! 1. Patterns are tried in registration order against the first remaining
//!    token (or its absence). On the first match, the matched token is
//!    removed, the captures are set, and the route's middleware chain runs.
//!    Its result, success or failure, is the dispatch result.
//! 2. With no match, scoped routers are tried in registration order with the
//!    unchanged context. The first result that is not
//!    [`Error::NotFound`] is returned.
//! 3. Otherwise the router reports [`Error::NotFound`].
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{Capture, Context, Router, Runner};
//!
//! let router = Router::builder()
//!     .route_fn("", |ctx| {
//!         ctx.println("Hello!");
//!         Ok(())
//!     })
//!     .branch("db", |db| {
//!         db.route_fn("migrate", |ctx| {
//!             ctx.println(format!("migrating after {:?}", ctx.path()));
//!             Ok(())
//!         })
//!     })
//!     .build()?;
//!
//! let out = Capture::new();
//! let ctx = Context::builder().args(["db", "migrate"]).out(out.clone()).build();
//! router.run(ctx)?;
//! assert_eq!(out.contents(), "migrating after [\"db\", \"migrate\"]\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;

pub use builder::{Open, Routed, RouterBuilder};

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::{path_to_string, Context};
use crate::error::Error;
use crate::pattern::Pattern;
use crate::runner::{BoxedRunner, Runner};

/// A built, immutable router.
///
/// `Router` implements [`Runner`], so a router can be registered as the
/// runner of a pattern on another router and trees nest to any depth.
pub struct Router {
    routes: Vec<Route>,
    scopes: Vec<Router>,
}

struct Route {
    pattern: Pattern,
    /// The route's runner with the router's middleware composed around it.
    chain: BoxedRunner,
    /// Set when the route was registered with `branch`.
    nested: Option<Arc<Router>>,
}

impl Router {
    /// Starts building a router.
    pub fn builder() -> RouterBuilder<Open> {
        RouterBuilder::new()
    }

    /// Source text of the registered patterns, in match order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> + '_ {
        self.routes.iter().map(|route| route.pattern.source())
    }

    /// The compiled pattern registered with `source`, if any.
    pub fn pattern(&self, source: &str) -> Option<&Pattern> {
        self.find(source).map(|route| &route.pattern)
    }

    /// The nested router registered with `branch` under `source`, if any.
    pub fn branch(&self, source: &str) -> Option<&Router> {
        self.find(source).and_then(|route| route.nested.as_deref())
    }

    /// Scoped routers, in the order they are tried.
    pub fn scopes(&self) -> &[Router] {
        &self.scopes
    }

    /// Returns true if the router has no routes and no scopes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.scopes.is_empty()
    }

    fn find(&self, source: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.pattern.source() == source)
    }
}

impl Runner for Router {
    fn run(&self, ctx: Context) -> Result<(), Error> {
        let token = ctx.arg(0);

        for route in &self.routes {
            if let Some(captures) = route.pattern.matches(token) {
                debug!(
                    pattern = route.pattern.source(),
                    token,
                    path = %path_to_string(ctx.path()),
                    "route matched"
                );
                let consume = !route.pattern.is_root();
                return route.chain.run(ctx.advance(consume, captures));
            }
        }

        for (index, scope) in self.scopes.iter().enumerate() {
            match scope.run(ctx.clone()) {
                Err(err) if err.is_not_found() => {
                    trace!(scope = index, token, "scope did not match");
                }
                result => return result,
            }
        }

        debug!(token, path = %path_to_string(ctx.path()), "no route found");
        Err(Error::not_found(token, ctx.path()))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .field("scopes", &self.scopes)
            .finish()
    }
}
