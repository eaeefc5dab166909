//! Route patterns.
//!
//! A pattern decides whether a router handles the first remaining token:
//!
//! - **root** (`""`) matches only when no tokens remain;
//! - **literal** matches a token equal to its text;
//! - **regex** is anchored at both ends and matches exactly one token.
//!
//! Plain strings are classified by [`PatternDef::auto`]: text containing a
//! regex metacharacter becomes a regex, anything else a literal.

use regex::Regex;

/// Characters that turn a plain string into a regular-expression pattern.
const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// How a pattern's source text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Matches only when no tokens remain.
    Root,
    /// Matches a token equal to the source text.
    Literal,
    /// Matches a token against the anchored regular expression.
    Regex,
}

/// An uncompiled pattern, as registered on a builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDef {
    source: String,
    kind: PatternKind,
}

impl PatternDef {
    /// The root pattern.
    pub fn root() -> Self {
        Self {
            source: String::new(),
            kind: PatternKind::Root,
        }
    }

    /// A literal pattern, even if the text contains regex metacharacters.
    ///
    /// An empty string is the root pattern.
    pub fn literal(source: impl Into<String>) -> Self {
        let source = source.into();
        if source.is_empty() {
            return Self::root();
        }
        Self {
            source,
            kind: PatternKind::Literal,
        }
    }

    /// A regular-expression pattern, even if the text has no metacharacters.
    pub fn regex(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: PatternKind::Regex,
        }
    }

    /// Classifies plain text: empty is root, text with regex metacharacters
    /// is a regex, anything else is a literal.
    pub fn auto(source: impl Into<String>) -> Self {
        let source = source.into();
        if source.contains(REGEX_META) {
            Self::regex(source)
        } else {
            Self::literal(source)
        }
    }

    /// The source text. Uniqueness within a router is decided on this.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// How the source text is interpreted.
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Compiles the pattern for matching.
    pub fn compile(&self) -> Result<Pattern, regex::Error> {
        let matcher = match self.kind {
            PatternKind::Root => Matcher::Root,
            PatternKind::Literal => Matcher::Literal,
            PatternKind::Regex => Matcher::Regex(Regex::new(&format!("^(?:{})$", self.source))?),
        };
        Ok(Pattern {
            source: self.source.clone(),
            matcher,
        })
    }
}

impl From<&str> for PatternDef {
    fn from(source: &str) -> Self {
        Self::auto(source)
    }
}

impl From<String> for PatternDef {
    fn from(source: String) -> Self {
        Self::auto(source)
    }
}

impl From<&String> for PatternDef {
    fn from(source: &String) -> Self {
        Self::auto(source.as_str())
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Root,
    Literal,
    Regex(Regex),
}

/// A compiled pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    matcher: Matcher,
}

impl Pattern {
    /// The source text the pattern was registered with.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// How the source text is interpreted.
    pub fn kind(&self) -> PatternKind {
        match self.matcher {
            Matcher::Root => PatternKind::Root,
            Matcher::Literal => PatternKind::Literal,
            Matcher::Regex(_) => PatternKind::Regex,
        }
    }

    /// Returns true for the root pattern, which never consumes a token.
    pub fn is_root(&self) -> bool {
        matches!(self.matcher, Matcher::Root)
    }

    /// Matches the first remaining token, or `None` when no tokens remain.
    ///
    /// Returns the captures on a match: empty for root and literal patterns;
    /// for regex patterns the full match followed by each group, with an
    /// empty string for a group that did not participate.
    pub fn matches(&self, token: Option<&str>) -> Option<Vec<String>> {
        match (&self.matcher, token) {
            (Matcher::Root, None) => Some(Vec::new()),
            (Matcher::Literal, Some(token)) if token == self.source => Some(Vec::new()),
            (Matcher::Regex(re), Some(token)) => re.captures(token).map(|caps| {
                caps.iter()
                    .map(|group| {
                        group.map_or_else(String::new, |m| m.as_str().to_owned())
                    })
                    .collect()
            }),
            _ => None,
        }
    }
}
