//! Error types for obfuscation operations.

/// Errors reported by the obfuscator and its configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObfuscatorError {
    /// The configuration was rejected at construction.
    #[error("invalid configuration: {msg}")]
    InvalidConfiguration {
        /// Human-readable error description.
        msg: String,
    },

    /// A call argument was rejected before any randomness was consumed.
    #[error("invalid argument: {msg}")]
    InvalidArgument {
        /// Human-readable error description.
        msg: String,
    },

    /// The operation is not meaningful for this obfuscator.
    #[error("invalid operation: {msg}")]
    InvalidOperation {
        /// Human-readable error description.
        msg: String,
    },
}

/// Result type for obfuscation operations.
pub type Result<T> = std::result::Result<T, ObfuscatorError>;

impl ObfuscatorError {
    /// Create an invalid configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration { msg: msg.into() }
    }

    /// Create an invalid argument error.
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument { msg: msg.into() }
    }

    /// Create an invalid operation error.
    pub fn operation<S: Into<String>>(msg: S) -> Self {
        Self::InvalidOperation { msg: msg.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_category() {
        assert_eq!(
            ObfuscatorError::config("rounding_step must be positive").to_string(),
            "invalid configuration: rounding_step must be positive"
        );
        assert_eq!(
            ObfuscatorError::invalid("epsilon must be positive").to_string(),
            "invalid argument: epsilon must be positive"
        );
        assert!(matches!(
            ObfuscatorError::operation("not caching"),
            ObfuscatorError::InvalidOperation { .. }
        ));
    }
}
