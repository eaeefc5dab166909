//! Flag parsing with clap.
//!
//! The middleware parses leading flags from the remaining tokens, inserts
//! the result into the context extensions, and forwards the first positional
//! token and everything after it to the next runner. `--` ends flag parsing
//! and is itself consumed.
//!
//! Two flavors share one implementation:
//!
//! - [`flags`] takes a hand-built [`clap::Command`] and inserts the raw
//!   [`FlagMatches`];
//! - [`parsed`] takes a type deriving [`clap::Parser`] and inserts the
//!   parsed value.
//!
//! `-h`/`--help` prints the command's help on the error stream and ends the
//! invocation successfully without calling onward.
//!
//! ```rust
//! use clap::Parser;
//! use cmdtree::{Capture, Context, Router, Runner};
//! use cmdtree_middleware::parsed;
//!
//! #[derive(Debug, Parser)]
//! struct Opts {
//!     #[arg(short, long)]
//!     verbose: bool,
//! }
//!
//! let router = Router::builder()
//!     .middleware(parsed::<Opts>())
//!     .route_fn("dance", |ctx| {
//!         let opts = ctx.extensions().get_required::<Opts>()?;
//!         ctx.println(format!("verbose={} rest={:?}", opts.verbose, ctx.args()));
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let out = Capture::new();
//! router.run(Context::builder().args(["dance", "-v", "floor"]).out(out.clone()).build())?;
//! assert_eq!(out.contents(), "verbose=true rest=[\"floor\"]\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command, Parser};
use cmdtree::{BoxedRunner, Context, Error, Middleware, Runner};
use tracing::debug;

/// Flag values parsed by [`flags`].
pub type FlagMatches = ArgMatches;

/// Id of the hidden trailing argument collecting unparsed tokens.
const REST: &str = "__cmdtree_rest";

type Extract<T> = fn(&mut ArgMatches) -> Result<T, clap::Error>;

/// Middleware parsing flags declared on a [`Command`].
pub struct Flags<T> {
    command: Arc<Command>,
    extract: Extract<T>,
    _value: PhantomData<fn() -> T>,
}

/// Parses the flags declared on `command` and inserts [`FlagMatches`].
///
/// The command's name is irrelevant; no binary name is expected in the
/// tokens.
pub fn flags(command: Command) -> Flags<FlagMatches> {
    Flags::new(command, |matches| Ok(std::mem::take(matches)))
}

/// Parses flags into `T` and inserts the value.
pub fn parsed<T>() -> Flags<T>
where
    T: Parser + Send + Sync + 'static,
{
    Flags::new(T::command(), T::from_arg_matches_mut)
}

impl<T> Flags<T> {
    fn new(command: Command, extract: Extract<T>) -> Self {
        let command = command.no_binary_name(true).arg(
            Arg::new(REST)
                .value_name("ARGS")
                .action(ArgAction::Set)
                .num_args(1..)
                .trailing_var_arg(true)
                .hide(true),
        );
        Self {
            command: Arc::new(command),
            extract,
            _value: PhantomData,
        }
    }

    /// Renders the help text of the underlying command.
    pub fn help(&self) -> String {
        (*self.command).clone().render_help().to_string()
    }
}

impl<T> Clone for Flags<T> {
    fn clone(&self) -> Self {
        Self {
            command: Arc::clone(&self.command),
            extract: self.extract,
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Flags<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flags")
            .field("command", &self.command.get_name())
            .finish_non_exhaustive()
    }
}

impl<T> Middleware for Flags<T>
where
    T: Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        Arc::new(FlagsRunner {
            flags: self.clone(),
            next,
        })
    }
}

struct FlagsRunner<T> {
    flags: Flags<T>,
    next: BoxedRunner,
}

impl<T> Runner for FlagsRunner<T>
where
    T: Send + Sync + 'static,
{
    fn run(&self, ctx: Context) -> Result<(), Error> {
        let command = (*self.flags.command).clone();
        let mut matches = match command.try_get_matches_from(ctx.args()) {
            Ok(matches) => matches,
            Err(err) if is_help(&err) => {
                let _ = ctx.err().write_str(&err.render().to_string());
                return Ok(());
            }
            Err(err) => {
                debug!(kind = ?err.kind(), "flag parsing failed");
                return Err(Error::handler(err));
            }
        };

        let rest: Vec<String> = matches
            .remove_many::<String>(REST)
            .map(Iterator::collect)
            .unwrap_or_default();
        let value = (self.flags.extract)(&mut matches).map_err(Error::handler)?;

        self.next.run(ctx.with_args(rest).with_extension(value))
    }
}

/// Help and version requests surface from clap as errors.
fn is_help(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdtree::{Capture, RunnerFn};

    #[derive(Debug, Parser)]
    struct Opts {
        #[arg(short, long)]
        verbose: bool,
        #[arg(short, long, default_value = "text")]
        format: String,
    }

    fn verbose_command() -> Command {
        Command::new("test").arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue),
        )
    }

    fn dispatch<M: Middleware>(
        middleware: &M,
        args: &[&str],
    ) -> (Result<(), Error>, String, String) {
        let out = Capture::new();
        let err = Capture::new();
        let terminal: BoxedRunner = Arc::new(RunnerFn::new(|ctx: Context| {
            let verbose = match ctx.extensions().get::<FlagMatches>() {
                Some(matches) => matches.get_flag("verbose"),
                None => ctx.extensions().get_required::<Opts>()?.verbose,
            };
            ctx.println(format!("verbose={verbose} rest={:?}", ctx.args()));
            Ok(())
        }));
        let chain = middleware.wrap(terminal);
        let ctx = Context::builder()
            .args(args.iter().copied())
            .out(out.clone())
            .err(err.clone())
            .build();
        (chain.run(ctx), out.contents(), err.contents())
    }

    #[test]
    fn test_flag_set_and_rest_forwarded() {
        let (result, out, _) = dispatch(&flags(verbose_command()), &["-v", "a", "b"]);
        assert!(result.is_ok());
        assert_eq!(out, "verbose=true rest=[\"a\", \"b\"]\n");
    }

    #[test]
    fn test_no_tokens() {
        let (result, out, _) = dispatch(&flags(verbose_command()), &[]);
        assert!(result.is_ok());
        assert_eq!(out, "verbose=false rest=[]\n");
    }

    #[test]
    fn test_parsing_stops_at_first_positional() {
        let (_, out, _) = dispatch(&flags(verbose_command()), &["a", "-v"]);
        assert_eq!(out, "verbose=false rest=[\"a\", \"-v\"]\n");
    }

    #[test]
    fn test_double_dash_ends_flags() {
        let (_, out, _) = dispatch(&flags(verbose_command()), &["--", "-v"]);
        assert_eq!(out, "verbose=false rest=[\"-v\"]\n");
    }

    #[test]
    fn test_unknown_flag_is_error() {
        let (result, out, _) = dispatch(&flags(verbose_command()), &["--nope"]);
        let err = result.unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("--nope"));
        assert_eq!(out, "");
    }

    #[test]
    fn test_help_prints_and_stops() {
        let (result, out, err) = dispatch(&flags(verbose_command()), &["--help"]);
        assert!(result.is_ok());
        assert_eq!(out, "");
        assert!(err.contains("--verbose"));
        assert!(!err.contains(REST));
    }

    #[test]
    fn test_parsed_derive() {
        let (result, out, _) = dispatch(&parsed::<Opts>(), &["--verbose", "-f", "json", "x"]);
        assert!(result.is_ok());
        assert_eq!(out, "verbose=true rest=[\"x\"]\n");
    }

    #[test]
    fn test_parsed_value_inserted() {
        let chain = parsed::<Opts>().wrap(Arc::new(RunnerFn::new(|ctx: Context| {
            let opts = ctx.extensions().get_required::<Opts>()?;
            ctx.println(&opts.format);
            Ok(())
        })));
        let out = Capture::new();
        let ctx = Context::builder()
            .args(["-f", "yaml"])
            .out(out.clone())
            .build();

        assert!(chain.run(ctx).is_ok());
        assert_eq!(out.contents(), "yaml\n");
    }

    #[test]
    fn test_help_text_hides_rest() {
        let help = parsed::<Opts>().help();
        assert!(help.contains("--format"));
        assert!(!help.contains(REST));
    }
}
