//! Logging middleware built on `tracing`.
//!
//! Both middleware only emit events and spans; where they end up is decided
//! by the subscriber the application installs.

use std::sync::Arc;

use cmdtree::{path_to_string, BoxedRunner, Context, Error, Middleware, Runner};
use tracing::{info, info_span, warn};

/// Logs the remaining tokens and the route path before calling onward, and
/// the error if the rest of the chain fails.
pub fn log_args() -> LogArgs {
    LogArgs
}

/// Runs the rest of the chain inside a `command` span carrying the route
/// path.
pub fn span() -> CommandSpan {
    CommandSpan
}

/// Middleware returned by [`log_args`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogArgs;

impl Middleware for LogArgs {
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        Arc::new(LogArgsRunner { next })
    }
}

struct LogArgsRunner {
    next: BoxedRunner,
}

impl Runner for LogArgsRunner {
    fn run(&self, ctx: Context) -> Result<(), Error> {
        let path = path_to_string(ctx.path());
        info!(args = ?ctx.args(), path = %path, "running command");

        self.next.run(ctx).inspect_err(|err| {
            warn!(error = %err, path = %path, "command failed");
        })
    }
}

/// Middleware returned by [`span`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSpan;

impl Middleware for CommandSpan {
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        Arc::new(SpanRunner { next })
    }
}

struct SpanRunner {
    next: BoxedRunner,
}

impl Runner for SpanRunner {
    fn run(&self, ctx: Context) -> Result<(), Error> {
        let span = info_span!("command", path = %path_to_string(ctx.path()));
        let _entered = span.enter();
        self.next.run(ctx)
    }
}
