//! The runner capability.
//!
//! Everything a router can dispatch to is a [`Runner`]: leaf handlers,
//! middleware-wrapped chains, and nested [`Router`](crate::Router)s.
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{Context, Runner, RunnerFn};
//!
//! let hello = RunnerFn::new(|ctx: Context| {
//!     ctx.println("Hello!");
//!     Ok(())
//! });
//!
//! hello.run(Context::default())?;
//! # Ok::<(), cmdtree::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;

/// Something that can be run with a [`Context`].
///
/// Runners must be `Send + Sync` so a built router tree can be shared by
/// concurrent dispatches.
pub trait Runner: Send + Sync {
    /// Runs with the given context.
    fn run(&self, ctx: Context) -> Result<(), Error>;
}

/// A shared, type-erased runner.
pub type BoxedRunner = Arc<dyn Runner>;

impl<R: Runner + ?Sized> Runner for Arc<R> {
    fn run(&self, ctx: Context) -> Result<(), Error> {
        (**self).run(ctx)
    }
}

impl<R: Runner + ?Sized> Runner for Box<R> {
    fn run(&self, ctx: Context) -> Result<(), Error> {
        (**self).run(ctx)
    }
}

/// A runner backed by a closure.
///
/// The closure returns `anyhow::Result<()>`, so handlers can use `?` on any
/// error type. A [`cmdtree::Error`](Error) raised inside the closure keeps
/// its kind on the way out.
pub struct RunnerFn<F> {
    f: F,
}

impl<F> RunnerFn<F>
where
    F: Fn(Context) -> anyhow::Result<()> + Send + Sync,
{
    /// Creates a new runner wrapping the given closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Runner for RunnerFn<F>
where
    F: Fn(Context) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, ctx: Context) -> Result<(), Error> {
        (self.f)(ctx).map_err(Error::from)
    }
}

impl<F> fmt::Debug for RunnerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerFn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_runner_fn_success() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);

        let runner = RunnerFn::new(move |_ctx| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert!(runner.run(Context::default()).is_ok());
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_runner_fn_error_is_handler_failure() {
        let runner = RunnerFn::new(|_ctx| anyhow::bail!("boom"));
        let err = runner.run(Context::default()).unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_runner_fn_keeps_routing_failure() {
        let runner = RunnerFn::new(|ctx: Context| {
            Err(Error::not_found(ctx.arg(0), ctx.path()).into())
        });
        let err = runner
            .run(Context::builder().args(["nope"]).build())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_boxed_runner() {
        let boxed: BoxedRunner = Arc::new(RunnerFn::new(|_ctx| Ok(())));
        assert!(boxed.run(Context::default()).is_ok());
    }
}
