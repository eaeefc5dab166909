//! Positional arguments.
//!
//! [`Args`] declares an ordered list of typed positional arguments. Each
//! declared argument consumes one token when one is present and otherwise
//! keeps its default. Tokens beyond the declared arguments are forwarded to
//! the next runner unchanged.
//!
//! ```rust
//! use cmdtree::{Capture, Context, Router, Runner};
//! use cmdtree_middleware::{Args, Positionals};
//!
//! let router = Router::builder()
//!     .scope(|s| {
//!         s.middleware(
//!             Args::new()
//!                 .string("name", "World", "who to greet")
//!                 .int("count", 1, "how many times"),
//!         )
//!         .route_fn("greet", |ctx| {
//!             let args = ctx.extensions().get_required::<Positionals>()?;
//!             for _ in 0..args.int("count").unwrap_or(1) {
//!                 ctx.println(format!("Hello, {}!", args.str("name").unwrap_or_default()));
//!             }
//!             Ok(())
//!         })
//!     })
//!     .build()?;
//!
//! let out = Capture::new();
//! router.run(Context::builder().args(["greet", "Ada", "2"]).out(out.clone()).build())?;
//! assert_eq!(out.contents(), "Hello, Ada!\nHello, Ada!\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::sync::Arc;

use cmdtree::{BoxedRunner, Context, Error, Middleware, Runner};
use tracing::debug;

use crate::error::ArgError;

/// A parsed positional value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Taken verbatim from the token.
    Str(String),
    /// Parsed by the rules described on [`Args::int`].
    Int(i64),
    /// One of `1 t T TRUE true True` or `0 f F FALSE false False`.
    Bool(bool),
    /// Parsed with [`str::parse`].
    Float(f64),
}

impl ArgValue {
    fn parse_like(&self, name: &str, token: &str) -> Result<Self, ArgError> {
        let invalid = |reason: String| ArgError::invalid(name, token, reason);
        match self {
            ArgValue::Str(_) => Ok(ArgValue::Str(token.to_owned())),
            ArgValue::Int(_) => parse_int(token).map(ArgValue::Int).map_err(invalid),
            ArgValue::Bool(_) => parse_bool(token)
                .map(ArgValue::Bool)
                .ok_or_else(|| invalid("expected a boolean".to_string())),
            ArgValue::Float(_) => token
                .parse::<f64>()
                .map(ArgValue::Float)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Float(x) => write!(f, "{x}"),
        }
    }
}

const INVALID_DIGIT: &str = "invalid digit found in string";

/// Parses a signed integer, picking the radix from the prefix.
///
/// `0x`, `0o` and `0b` select hexadecimal, octal and binary. A bare leading
/// `0` also selects octal, so `010` is 8. Digits may be grouped with single
/// underscores, each one following a digit or the prefix.
fn parse_int(token: &str) -> Result<i64, String> {
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let (radix, prefixed, body) = match unsigned.get(..2) {
        Some("0x" | "0X") => (16, true, &unsigned[2..]),
        Some("0o" | "0O") => (8, true, &unsigned[2..]),
        Some("0b" | "0B") => (2, true, &unsigned[2..]),
        _ if unsigned.len() > 1 && unsigned.starts_with('0') => (8, true, &unsigned[1..]),
        _ => (10, false, unsigned),
    };
    let digits = strip_separators(body, prefixed).ok_or(INVALID_DIGIT)?;
    if digits.starts_with(['+', '-']) {
        return Err(INVALID_DIGIT.to_string());
    }

    let magnitude = match u64::from_str_radix(&digits, radix) {
        Ok(magnitude) => i128::from(magnitude),
        Err(err) => return Err(err.to_string()),
    };
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value)
        .map_err(|_| "number too large to fit in target type".to_string())
}

/// Drops `_` separators from `body`.
///
/// Returns `None` when an underscore is doubled, trailing, or leads an
/// unprefixed number.
fn strip_separators(body: &str, prefixed: bool) -> Option<String> {
    let mut after_digit = prefixed;
    let mut digits = String::with_capacity(body.len());
    for c in body.chars() {
        if c != '_' {
            digits.push(c);
            after_digit = true;
        } else if after_digit {
            after_digit = false;
        } else {
            return None;
        }
    }
    if body.ends_with('_') {
        return None;
    }
    Some(digits)
}

fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    default: ArgValue,
    usage: String,
}

/// Declared positional arguments. The order of declarations is significant.
#[derive(Debug, Clone, Default)]
pub struct Args {
    slots: Vec<Slot>,
}

impl Args {
    /// No arguments declared; every token is forwarded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a string argument.
    pub fn string(
        self,
        name: impl Into<String>,
        default: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        self.declare(name, ArgValue::Str(default.into()), usage)
    }

    /// Declares an integer argument.
    ///
    /// Tokens follow the usual literal rules: an optional sign, then `0x`,
    /// `0o`, `0b` or a bare leading `0` (octal) to pick the radix, with `_`
    /// allowed between digits. `1_000`, `0x1f` and `010` are 1000, 31 and 8.
    pub fn int(self, name: impl Into<String>, default: i64, usage: impl Into<String>) -> Self {
        self.declare(name, ArgValue::Int(default), usage)
    }

    /// Declares a boolean argument.
    pub fn bool(self, name: impl Into<String>, default: bool, usage: impl Into<String>) -> Self {
        self.declare(name, ArgValue::Bool(default), usage)
    }

    /// Declares a floating-point argument.
    pub fn float(self, name: impl Into<String>, default: f64, usage: impl Into<String>) -> Self {
        self.declare(name, ArgValue::Float(default), usage)
    }

    fn declare(
        mut self,
        name: impl Into<String>,
        default: ArgValue,
        usage: impl Into<String>,
    ) -> Self {
        self.slots.push(Slot {
            name: name.into(),
            default,
            usage: usage.into(),
        });
        self
    }

    /// Parses `tokens`, returning the values and the unconsumed tokens.
    ///
    /// Every declared argument starts from its default on each call.
    pub fn parse(&self, tokens: &[String]) -> Result<(Positionals, Vec<String>), ArgError> {
        let mut values = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            let value = match tokens.get(i) {
                Some(token) => slot.default.parse_like(&slot.name, token)?,
                None => slot.default.clone(),
            };
            values.push((slot.name.clone(), value));
        }
        let rest = tokens.iter().skip(self.slots.len()).cloned().collect();
        Ok((Positionals { values }, rest))
    }

    /// One line per argument: name, default and usage.
    pub fn usage(&self) -> String {
        self.slots
            .iter()
            .map(|slot| {
                format!(
                    "  {}\t{} (default {})\n",
                    slot.name, slot.usage, slot.default
                )
            })
            .collect()
    }
}

impl Middleware for Args {
    fn wrap(&self, next: BoxedRunner) -> BoxedRunner {
        Arc::new(ArgsRunner {
            args: self.clone(),
            next,
        })
    }
}

struct ArgsRunner {
    args: Args,
    next: BoxedRunner,
}

impl Runner for ArgsRunner {
    fn run(&self, ctx: Context) -> Result<(), Error> {
        let (values, rest) = self.args.parse(ctx.args()).map_err(|err| {
            debug!(argument = err.name(), "positional argument rejected");
            Error::handler(err)
        })?;
        self.next.run(ctx.with_args(rest).with_extension(values))
    }
}

/// Values parsed by [`Args`], keyed by argument name.
///
/// Inserted into the context extensions for downstream runners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Positionals {
    values: Vec<(String, ArgValue)>,
}

impl Positionals {
    /// The value of `name`, whatever its type.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// The value of a string argument. `None` if `name` is missing or not a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value of an integer argument.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value of a boolean argument.
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value of a floating-point argument.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ArgValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Name and value pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}
