//! The per-invocation context.
//!
//! A [`Context`] is the value every [`Runner`](crate::Runner) receives. It
//! carries:
//!
//! | Field | Set by | Purpose |
//! |-------|--------|---------|
//! | `args` | entry point, routers, middleware | tokens not consumed yet |
//! | `captures` | routers | groups from the most recent pattern match |
//! | `path` | routers | tokens consumed by matches so far |
//! | `out` / `err` / `input` | entry point | shared stream handles |
//! | `cancellation` | entry point | cooperative stop signal |
//! | `extensions` | middleware | typed values for downstream handlers |
//!
//! Contexts are passed by value. A layer that wants downstream layers to see
//! different tokens builds a new context with [`Context::with_args`] and
//! forwards that; the value it received is never modified in place.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cancel::Cancellation;
use crate::error::Error;
use crate::stream::{Reader, Writer};

/// Type-keyed container that middleware use to hand values to handlers.
///
/// Values are stored behind `Arc`, so cloning a context (which routers do
/// when they try scoped children in turn) keeps every extension.
///
/// # Example
///
/// ```rust
/// use cmdtree::Extensions;
///
/// struct ApiBase(String);
///
/// let mut ext = Extensions::new();
/// ext.insert(ApiBase("https://api.example.com".into()));
///
/// let base = ext.get_required::<ApiBase>()?;
/// assert_eq!(base.0, "https://api.example.com");
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Creates a new empty extensions container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any earlier value of the same type.
    pub fn insert<T>(&mut self, val: T)
    where
        T: Send + Sync + 'static,
    {
        self.map.insert(TypeId::of::<T>(), Arc::new(val));
    }

    /// Gets a reference to a value of the specified type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    /// Gets a value of the specified type, or an error naming the missing type.
    pub fn get_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "Extension missing: type {} not found in context",
                std::any::type_name::<T>()
            )
        })
    }

    /// Removes the value of the specified type. Returns true if one was present.
    pub fn remove<T: 'static>(&mut self) -> bool {
        self.map.remove(&TypeId::of::<T>()).is_some()
    }

    /// Returns `true` if a value of the specified type is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Context passed to every runner.
#[derive(Debug, Clone)]
pub struct Context {
    args: Vec<String>,
    captures: Vec<String>,
    path: Vec<String>,
    out: Writer,
    err: Writer,
    input: Reader,
    cancellation: Cancellation,
    extensions: Extensions,
}

impl Context {
    /// Starts building a context.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Tokens that have not been consumed yet.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The `index`-th remaining token.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Captures from the most recent pattern match.
    ///
    /// For a regular-expression pattern this is the full match followed by
    /// every capture group; for literal and root patterns it is empty.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    /// The `index`-th capture of the most recent match.
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).map(String::as_str)
    }

    /// Tokens consumed by pattern matches on the way to this runner.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Handle to the output stream.
    pub fn out(&self) -> Writer {
        self.out.clone()
    }

    /// Handle to the error stream.
    pub fn err(&self) -> Writer {
        self.err.clone()
    }

    /// Handle to the input stream.
    pub fn input(&self) -> Reader {
        self.input.clone()
    }

    /// The cancellation signal for this invocation.
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Returns true once the invocation has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns [`Error::Cancelled`] if the invocation has been asked to stop.
    pub fn check_cancelled(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Values inserted by middleware.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Writes a line to the output stream. Write failures are ignored.
    pub fn println(&self, line: impl fmt::Display) {
        let _ = self.out.write_line(line);
    }

    /// Writes a line to the error stream. Write failures are ignored.
    pub fn eprintln(&self, line: impl fmt::Display) {
        let _ = self.err.write_line(line);
    }

    /// Returns this context with the remaining tokens replaced.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Returns this context with an extension value added.
    pub fn with_extension<T>(mut self, val: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.extensions.insert(val);
        self
    }

    /// Derives the context for the runner behind a matched pattern.
    pub(crate) fn advance(mut self, consume: bool, captures: Vec<String>) -> Self {
        if consume && !self.args.is_empty() {
            let token = self.args.remove(0);
            self.path.push(token);
        }
        self.captures = captures;
        self
    }
}

impl Default for Context {
    fn default() -> Self {
        ContextBuilder::default().build()
    }
}

/// Builder for [`Context`].
///
/// Anything not set falls back to a quiet default: no tokens, output and
/// error streams that discard, an input stream at end of file, and a fresh
/// cancellation flag.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    args: Vec<String>,
    out: Option<Writer>,
    err: Option<Writer>,
    input: Option<Reader>,
    cancellation: Option<Cancellation>,
    extensions: Extensions,
}

impl ContextBuilder {
    /// Sets the tokens to dispatch, conventionally the process arguments
    /// without the program name.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the output stream.
    pub fn out(mut self, out: impl Into<Writer>) -> Self {
        self.out = Some(out.into());
        self
    }

    /// Sets the error stream.
    pub fn err(mut self, err: impl Into<Writer>) -> Self {
        self.err = Some(err.into());
        self
    }

    /// Sets the input stream.
    pub fn input(mut self, input: Reader) -> Self {
        self.input = Some(input);
        self
    }

    /// Sets the cancellation signal.
    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    /// Adds an extension value visible to every runner.
    pub fn extension<T>(mut self, val: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.extensions.insert(val);
        self
    }

    /// Builds the context.
    pub fn build(self) -> Context {
        Context {
            args: self.args,
            captures: Vec::new(),
            path: Vec::new(),
            out: self.out.unwrap_or_else(Writer::sink),
            err: self.err.unwrap_or_else(Writer::sink),
            input: self.input.unwrap_or_else(Reader::empty),
            cancellation: self.cancellation.unwrap_or_default(),
            extensions: self.extensions,
        }
    }
}

/// Joins a route path with spaces, the way it was typed.
///
/// For example, `["db", "migrate"]` becomes `"db migrate"`.
pub fn path_to_string(path: &[String]) -> String {
    path.join(" ")
}
