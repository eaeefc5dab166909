//! Middleware and chain composition.
//!
//! A middleware turns "the next runner" into "a runner that wraps it". It can
//! inspect the [`Context`], replace it before calling onward (for example to
//! strip tokens it consumed), or return without calling onward at all.
//!
//! # Ordering
//!
//! Middleware declared first runs first:
//!
//! ```text
//! compose([m1, m2], handler)  ==  m1(m2(handler))
//!
//! run → m1 → m2 → handler
//! ```
//!
//! # Writing middleware
//!
//! [`from_fn`] covers the common case of "do something, then call next":
//!
//! ```rust
//! use cmdtree::{middleware, Runner};
//!
//! let announce = middleware::from_fn(|ctx, next| {
//!     ctx.println("starting");
//!     next.run(ctx)
//! });
//! ```
//!
//! [`layer`] takes the raw `next → runner` function when the wrapping runner
//! needs its own state.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::runner::{BoxedRunner, Runner};

/// A transform from the next runner to a runner wrapping it.
pub trait Middleware: Send + Sync {
    /// Wraps `next`.
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner;
}

/// A shared, type-erased middleware.
pub type SharedMiddleware = Arc<dyn Middleware>;

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        (**self).wrap(next)
    }
}

impl<M: Middleware + ?Sized> Middleware for Box<M> {
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        (**self).wrap(next)
    }
}

/// Composes `middlewares` around `terminal`.
///
/// The sequence is folded from last to first so that, at run time, the
/// first middleware in the slice is the first one invoked.
pub fn compose(middlewares: &[SharedMiddleware], terminal: BoxedRunner) -> BoxedRunner {
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, middleware| middleware.wrap(next))
}

/// Creates a middleware from a closure receiving the context and the next runner.
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(Context, &dyn Runner) -> Result<(), Error> + Send + Sync + 'static,
{
    FnMiddleware { f: Arc::new(f) }
}

/// Creates a middleware from a `next → runner` function.
pub fn layer<F>(f: F) -> Layer<F>
where
    F: Fn(BoxedRunner) -> BoxedRunner + Send + Sync,
{
    Layer { f }
}

/// Middleware returned by [`from_fn`].
pub struct FnMiddleware<F> {
    f: Arc<F>,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Context, &dyn Runner) -> Result<(), Error> + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        Arc::new(FnWrapped {
            f: Arc::clone(&self.f),
            next,
        })
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware").finish_non_exhaustive()
    }
}

struct FnWrapped<F> {
    f: Arc<F>,
    next: BoxedRunner,
}

impl<F> Runner for FnWrapped<F>
where
    F: Fn(Context, &dyn Runner) -> Result<(), Error> + Send + Sync,
{
    fn run(&self, ctx: Context) -> Result<(), Error> {
        (self.f)(ctx, &*self.next)
    }
}

/// Middleware returned by [`layer`].
pub struct Layer<F> {
    f: F,
}

impl<F> Middleware for Layer<F>
where
    F: Fn(BoxedRunner) -> BoxedRunner + Send + Sync,
{
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        (self.f)(next)
    }
}

impl<F> fmt::Debug for Layer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunnerFn;
    use crate::stream::Capture;

    fn announce(name: &'static str) -> SharedMiddleware {
        Arc::new(from_fn(move |ctx, next| {
            ctx.println(name);
            next.run(ctx)
        }))
    }

    fn terminal(line: &'static str) -> BoxedRunner {
        Arc::new(RunnerFn::new(move |ctx| {
            ctx.println(line);
            Ok(())
        }))
    }

    fn run_capturing(runner: &BoxedRunner, args: &[&str]) -> (Result<(), Error>, String) {
        let out = Capture::new();
        let ctx = Context::builder()
            .args(args.iter().copied())
            .out(out.clone())
            .build();
        (runner.run(ctx), out.contents())
    }

    #[test]
    fn test_compose_runs_in_declaration_order() {
        let chain = compose(&[announce("m1"), announce("m2")], terminal("root"));
        let (result, output) = run_capturing(&chain, &[]);
        assert!(result.is_ok());
        assert_eq!(output, "m1\nm2\nroot\n");
    }

    #[test]
    fn test_compose_empty_is_terminal() {
        let chain = compose(&[], terminal("only"));
        let (_, output) = run_capturing(&chain, &[]);
        assert_eq!(output, "only\n");
    }

    #[test]
    fn test_short_circuit_skips_rest_of_chain() {
        let stop: SharedMiddleware = Arc::new(from_fn(|_ctx, _next| Ok(())));
        let chain = compose(&[announce("m1"), stop, announce("m3")], terminal("root"));

        let (result, output) = run_capturing(&chain, &[]);
        assert!(result.is_ok());
        assert_eq!(output, "m1\n");
    }

    #[test]
    fn test_replaced_context_reaches_downstream() {
        let strip_first: SharedMiddleware = Arc::new(from_fn(|ctx, next| {
            let rest: Vec<String> = ctx.args().iter().skip(1).cloned().collect();
            next.run(ctx.with_args(rest))
        }));
        let show_args: BoxedRunner = Arc::new(RunnerFn::new(|ctx| {
            ctx.println(ctx.args().join(","));
            Ok(())
        }));

        let chain = compose(&[strip_first], show_args);
        let (_, output) = run_capturing(&chain, &["-v", "a", "b"]);
        assert_eq!(output, "a,b\n");
    }

    #[test]
    fn test_middleware_error_propagates() {
        let fail: SharedMiddleware = Arc::new(from_fn(|_ctx, _next| {
            Err(Error::handler(anyhow::anyhow!("offline")))
        }));
        let chain = compose(&[fail], terminal("unreachable"));

        let (result, output) = run_capturing(&chain, &[]);
        assert_eq!(result.unwrap_err().to_string(), "offline");
        assert_eq!(output, "");
    }

    #[test]
    fn test_layer_wraps_next() {
        struct Twice(BoxedRunner);

        impl Runner for Twice {
            fn run(&self, ctx: Context) -> Result<(), Error> {
                self.0.run(ctx.clone())?;
                self.0.run(ctx)
            }
        }

        let twice = layer(|next: BoxedRunner| -> BoxedRunner { Arc::new(Twice(next)) });
        let twice: SharedMiddleware = Arc::new(twice);
        let chain = compose(&[twice], terminal("x"));

        let (_, output) = run_capturing(&chain, &[]);
        assert_eq!(output, "x\nx\n");
    }
}
