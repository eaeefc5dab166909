//! Pattern-routed command trees for CLIs.
//!
//! `cmdtree` dispatches a list of tokens (usually the process arguments)
//! through a tree of routers. Each router matches the first remaining token
//! against its patterns, consumes it, and hands the rest to whatever was
//! registered there: a handler, a nested router, or either of those wrapped
//! in middleware.
//!
//! # Concepts
//!
//! - **[`Runner`]**: anything that can be run with a [`Context`]. Handlers,
//!   composed middleware chains and [`Router`]s are all runners.
//! - **[`Context`]**: the remaining tokens, regex captures, the route path
//!   consumed so far, the I/O streams, a cancellation flag and typed
//!   [`Extensions`] added by middleware.
//! - **[`Middleware`]**: wraps the next runner. Middleware declared on a
//!   router runs, in declaration order, around every route of that router.
//! - **Patterns**: `""` matches when no tokens remain, plain text matches an
//!   equal token, and text with regex metacharacters is an anchored regex.
//! - **Scopes**: child routers consulted when none of the parent's patterns
//!   match. A scope starts with the parent's middleware and can add its own.
//!
//! # Quick Start
//!
//! ```rust
//! use cmdtree::{middleware, Capture, Context, Router, Runner};
//!
//! let router = Router::builder()
//!     .middleware(middleware::from_fn(|ctx, next| {
//!         ctx.println("->");
//!         next.run(ctx)
//!     }))
//!     .route_fn("", |ctx| {
//!         ctx.println("Hello!");
//!         Ok(())
//!     })
//!     .route_fn(r"add-(\d+)", |ctx| {
//!         let n: u32 = ctx.capture(1).unwrap_or("0").parse()?;
//!         ctx.println(n + 1);
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let out = Capture::new();
//! router.run(Context::builder().args(["add-41"]).out(out.clone()).build())?;
//! assert_eq!(out.contents(), "->\n42\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Binaries hand the built router to [`run`], which binds the process
//! arguments and streams and converts the outcome into an exit code.
//!
//! # Logging
//!
//! Dispatch emits [`tracing`] events at `debug` (route matched, no route
//! found) and `trace` (scope fall-through). Nothing is printed unless the
//! application installs a subscriber.

mod cancel;
mod context;
mod error;
mod pattern;
mod run;
mod runner;
mod stream;

pub mod middleware;
pub mod router;

pub use cancel::Cancellation;
pub use context::{path_to_string, Context, ContextBuilder, Extensions};
pub use error::{BuildError, Error};
pub use middleware::{compose, Middleware, SharedMiddleware};
pub use pattern::{Pattern, PatternDef, PatternKind};
pub use router::{Router, RouterBuilder};
pub use run::{run, run_with};
pub use runner::{BoxedRunner, Runner, RunnerFn};
pub use stream::{Capture, Reader, Writer};
