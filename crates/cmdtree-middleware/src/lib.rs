//! Reusable middleware for `cmdtree` routers.
//!
//! - [`flags`] and [`parsed`]: parse leading flags with clap and insert the
//!   result into the context.
//! - [`Args`]: typed positional arguments with defaults.
//! - [`logging`]: `tracing` events and spans around command execution.
//!
//! Parsers consume what they understand and forward the remaining tokens, so
//! they stack: a flags middleware followed by an [`Args`] middleware handles
//! `greet -v Ada 2`.

mod args;
mod error;
mod flags;
pub mod logging;

pub use args::{ArgValue, Args, Positionals};
pub use error::ArgError;
pub use flags::{flags, parsed, FlagMatches, Flags};
pub use logging::{log_args, span};
