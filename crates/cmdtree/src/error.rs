//! Error types for building and dispatching command trees.
//!
//! Dispatch failures come in two kinds that callers must be able to tell
//! apart:
//!
//! - [`Error::NotFound`]: no pattern on a router (or any of its scopes)
//!   matched. A parent router treats this as "try elsewhere".
//! - [`Error::Handler`]: a handler or middleware ran and failed. This always
//!   propagates unchanged.
//!
//! Build failures ([`BuildError`]) describe a misconfigured tree and are
//! reported by [`RouterBuilder::build`](crate::RouterBuilder::build) before
//! any dispatch can happen.

use crate::context::path_to_string;

/// Error returned by [`Runner::run`](crate::Runner::run).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered pattern or scoped router could handle the tokens.
    #[error("{}", not_found_message(.token, .path))]
    NotFound {
        /// The token that failed to match, or `None` when no tokens remained.
        token: Option<String>,
        /// Tokens consumed by enclosing routers before the failure.
        path: Vec<String>,
    },

    /// A handler or middleware failed.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// The invocation was cancelled before the handler finished.
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Creates a routing-not-found error.
    pub fn not_found(token: Option<&str>, path: &[String]) -> Self {
        Error::NotFound {
            token: token.map(str::to_owned),
            path: path.to_vec(),
        }
    }

    /// Wraps any error as a handler failure.
    ///
    /// An error that already is a [`cmdtree::Error`](Error) keeps its kind.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Error::from(err.into())
    }

    /// Returns true if this is a routing failure rather than a handler failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true if this error reports a cancelled invocation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

// Handlers return `anyhow::Result`, so a `cmdtree::Error` raised inside one
// (for example by a nested `Router::run` or `check_cancelled`) arrives here
// wrapped. Unwrap it so a routing failure never turns into a handler failure.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(err) => Error::Handler(err),
        }
    }
}

fn not_found_message(token: &Option<String>, path: &[String]) -> String {
    match (token, path.is_empty()) {
        (Some(token), true) => format!("no route for {token:?}"),
        (Some(token), false) => format!("no route for {token:?} under {:?}", path_to_string(path)),
        (None, true) => "no root route".to_string(),
        (None, false) => format!("no root route under {:?}", path_to_string(path)),
    }
}

/// Error type for building a router tree.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The same pattern was registered twice on one router.
    #[error("duplicate pattern {pattern:?} in router {}", router_label(.path))]
    DuplicatePattern {
        /// Source text of the repeated pattern.
        pattern: String,
        /// Branch patterns leading to the offending router.
        path: Vec<String>,
    },

    /// A regular-expression pattern failed to compile.
    #[error("invalid pattern {pattern:?} in router {}: {source}", router_label(.path))]
    InvalidPattern {
        /// Source text of the pattern.
        pattern: String,
        /// Branch patterns leading to the offending router.
        path: Vec<String>,
        /// The regex compilation error.
        source: regex::Error,
    },
}

impl BuildError {
    /// Returns the source text of the pattern that caused the error.
    pub fn pattern(&self) -> &str {
        match self {
            BuildError::DuplicatePattern { pattern, .. }
            | BuildError::InvalidPattern { pattern, .. } => pattern,
        }
    }
}

fn router_label(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        format!("{:?}", path_to_string(path))
    }
}
