//! Router construction.
//!
//! The builder records middleware and routes in declaration order. Nothing
//! is validated or composed until [`RouterBuilder::build`], which walks the
//! whole tree once: patterns are compiled, duplicates are rejected, and each
//! route's middleware chain is composed and cached.
//!
//! The builder's type parameter tracks whether a route has been registered.
//! Middleware can only be added while it is [`Open`], so declaring
//! middleware after a route is a compile error rather than a silent reorder:
//!
//! ```compile_fail
//! use cmdtree::{middleware, Router, Runner};
//!
//! let _ = Router::builder()
//!     .route_fn("", |_ctx| Ok(()))
//!     .middleware(middleware::from_fn(|ctx, next| next.run(ctx)));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Route, Router};
use crate::context::Context;
use crate::error::BuildError;
use crate::middleware::{compose, Middleware, SharedMiddleware};
use crate::pattern::PatternDef;
use crate::runner::{BoxedRunner, Runner, RunnerFn};

/// Builder state: no route registered yet, middleware may still be added.
#[derive(Debug, Clone, Copy)]
pub struct Open;

/// Builder state: at least one route registered, middleware is closed.
#[derive(Debug, Clone, Copy)]
pub struct Routed;

/// Builder for [`Router`].
///
/// # Example
///
/// ```rust
/// use cmdtree::{middleware, Router, Runner};
///
/// let router = Router::builder()
///     .middleware(middleware::from_fn(|ctx, next| {
///         ctx.eprintln(format!("running {:?}", ctx.path()));
///         next.run(ctx)
///     }))
///     .route_fn("", |ctx| {
///         ctx.println("Hello!");
///         Ok(())
///     })
///     .scope(|s| {
///         s.route_fn(r"\d+", |ctx| {
///             ctx.println(format!("number {}", ctx.capture(0).unwrap_or_default()));
///             Ok(())
///         })
///     })
///     .build()?;
///
/// assert_eq!(router.patterns().count(), 1);
/// assert_eq!(router.scopes().len(), 1);
/// # Ok::<(), cmdtree::BuildError>(())
/// ```
pub struct RouterBuilder<S = Open> {
    draft: Draft,
    _state: PhantomData<S>,
}

impl RouterBuilder<Open> {
    pub(super) fn new() -> Self {
        Self::from_draft(Draft::default())
    }

    /// Appends a middleware to this router's chain.
    ///
    /// Middleware wraps every route of this router, and of scopes created
    /// after this call, in declaration order.
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.draft.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends several middleware, in iteration order.
    pub fn middlewares<I, M>(self, middlewares: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Middleware + 'static,
    {
        middlewares
            .into_iter()
            .fold(self, |builder, middleware| builder.middleware(middleware))
    }
}

impl Default for RouterBuilder<Open> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RouterBuilder<S> {
    fn from_draft(draft: Draft) -> Self {
        Self {
            draft,
            _state: PhantomData,
        }
    }

    fn into_state<T>(self) -> RouterBuilder<T> {
        RouterBuilder::from_draft(self.draft)
    }

    /// Registers a runner under a pattern.
    ///
    /// Plain strings are classified with [`PatternDef::auto`]; pass a
    /// [`PatternDef`] to force a kind.
    pub fn route<P, R>(mut self, pattern: P, runner: R) -> RouterBuilder<Routed>
    where
        P: Into<PatternDef>,
        R: Runner + 'static,
    {
        self.draft
            .routes
            .push((pattern.into(), Entry::Runner(Arc::new(runner))));
        self.into_state()
    }

    /// Registers a closure handler under a pattern.
    pub fn route_fn<P, F>(self, pattern: P, handler: F) -> RouterBuilder<Routed>
    where
        P: Into<PatternDef>,
        F: Fn(Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.route(pattern, RunnerFn::new(handler))
    }

    /// Registers a nested router under a pattern.
    ///
    /// The nested router starts with no middleware of its own; this
    /// router's middleware still runs around it because the nested router
    /// is the route's runner. The nested router is reachable afterwards
    /// through [`Router::branch`].
    pub fn branch<P, F, T>(mut self, pattern: P, configure: F) -> RouterBuilder<Routed>
    where
        P: Into<PatternDef>,
        F: FnOnce(RouterBuilder<Open>) -> RouterBuilder<T>,
    {
        let nested = configure(RouterBuilder::new());
        self.draft
            .routes
            .push((pattern.into(), Entry::Branch(nested.draft)));
        self.into_state()
    }

    /// Adds a scoped router, consulted when no pattern of this router
    /// matches.
    ///
    /// The scope starts with a copy of this router's middleware as declared
    /// so far. Middleware added to the scope does not affect this router,
    /// and middleware added to this router later does not affect the scope.
    pub fn scope<F, T>(mut self, configure: F) -> Self
    where
        F: FnOnce(RouterBuilder<Open>) -> RouterBuilder<T>,
    {
        let seed = Draft {
            middlewares: self.draft.middlewares.clone(),
            ..Draft::default()
        };
        let scoped = configure(RouterBuilder::from_draft(seed));
        self.draft.scopes.push(scoped.draft);
        self
    }

    /// Validates the tree and builds the router.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicatePattern`] if a router, nested router
    /// or scope registers the same pattern text twice, and
    /// [`BuildError::InvalidPattern`] if a regex pattern fails to compile.
    pub fn build(self) -> Result<Router, BuildError> {
        self.draft.freeze(&mut Vec::new())
    }
}

impl<S> fmt::Debug for RouterBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("middlewares", &self.draft.middlewares.len())
            .field(
                "patterns",
                &self
                    .draft
                    .routes
                    .iter()
                    .map(|(def, _)| def.source())
                    .collect::<Vec<_>>(),
            )
            .field("scopes", &self.draft.scopes.len())
            .finish()
    }
}

#[derive(Default)]
struct Draft {
    middlewares: Vec<SharedMiddleware>,
    routes: Vec<(PatternDef, Entry)>,
    scopes: Vec<Draft>,
}

enum Entry {
    Runner(BoxedRunner),
    Branch(Draft),
}

impl Draft {
    /// `path` holds the branch patterns leading to this router.
    fn freeze(self, path: &mut Vec<String>) -> Result<Router, BuildError> {
        let mut seen = HashSet::with_capacity(self.routes.len());
        let mut routes = Vec::with_capacity(self.routes.len());

        for (def, entry) in self.routes {
            if !seen.insert(def.source().to_owned()) {
                return Err(BuildError::DuplicatePattern {
                    pattern: def.source().to_owned(),
                    path: path.clone(),
                });
            }

            let pattern = def
                .compile()
                .map_err(|source| BuildError::InvalidPattern {
                    pattern: def.source().to_owned(),
                    path: path.clone(),
                    source,
                })?;

            let (target, nested) = match entry {
                Entry::Runner(runner) => (runner, None),
                Entry::Branch(draft) => {
                    path.push(def.source().to_owned());
                    let built = draft.freeze(path);
                    path.pop();
                    let nested = Arc::new(built?);
                    (Arc::clone(&nested) as BoxedRunner, Some(nested))
                }
            };

            routes.push(Route {
                pattern,
                chain: compose(&self.middlewares, target),
                nested,
            });
        }

        let scopes = self
            .scopes
            .into_iter()
            .map(|scope| scope.freeze(path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Router { routes, scopes })
    }
}
