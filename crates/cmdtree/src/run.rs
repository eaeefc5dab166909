//! Process entry point.

use std::env;
use std::process::ExitCode;

use tracing::warn;

use crate::cancel::Cancellation;
use crate::context::Context;
use crate::error::Error;
use crate::runner::Runner;
use crate::stream::{Reader, Writer};

/// Runs `runner` against the process arguments and standard streams.
///
/// The program name is dropped from the arguments. SIGINT and SIGTERM are
/// routed to the context's cancellation flag; a second signal terminates
/// the process. On failure, `Error: <message>` is written to standard error
/// and [`ExitCode::FAILURE`] is returned.
///
/// ```no_run
/// use std::process::ExitCode;
///
/// fn main() -> ExitCode {
///     let router = cmdtree::Router::builder()
///         .route_fn("", |ctx| {
///             ctx.println("Hello!");
///             Ok(())
///         })
///         .build()
///         .expect("valid routes");
///     cmdtree::run(&router)
/// }
/// ```
pub fn run<R>(runner: &R) -> ExitCode
where
    R: Runner + ?Sized,
{
    let cancellation = Cancellation::new();
    if let Err(err) = cancellation.install_signal_handlers() {
        warn!(error = %err, "failed to install signal handlers");
    }

    let ctx = Context::builder()
        .args(env::args().skip(1))
        .out(Writer::stdout())
        .err(Writer::stderr())
        .input(Reader::stdin())
        .cancellation(cancellation)
        .build();

    match run_with(runner, ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Runs `runner` with an explicit context, reporting failure on the
/// context's error stream.
///
/// This is [`run`] without the process plumbing, for embedding and tests.
pub fn run_with<R>(runner: &R, ctx: Context) -> Result<(), Error>
where
    R: Runner + ?Sized,
{
    let err_stream = ctx.err();
    runner.run(ctx).inspect_err(|err| {
        let _ = err_stream.write_line(format_args!("Error: {err}"));
    })
}
