//! Error types for argument parsing.

/// Errors raised while parsing positional arguments.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgError {
    /// A token could not be parsed as the declared type.
    #[error("invalid value {value:?} for argument '{name}': {reason}")]
    Invalid {
        /// Declared name of the argument.
        name: String,
        /// The token as given.
        value: String,
        /// Why the token was rejected.
        reason: String,
    },
}

impl ArgError {
    /// Create an invalid-value error.
    pub fn invalid(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Name of the argument that failed to parse.
    pub fn name(&self) -> &str {
        match self {
            Self::Invalid { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display() {
        let err = ArgError::invalid("count", "many", "expected an integer");
        assert_eq!(
            err.to_string(),
            "invalid value \"many\" for argument 'count': expected an integer"
        );
        assert_eq!(err.name(), "count");
    }
}
