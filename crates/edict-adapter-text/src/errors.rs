//! Error types for the text protocols

use thiserror::Error;

/// Errors raised while formatting records as text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The output pattern itself is malformed
    #[error("invalid pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    /// A record lacks a field the protocol needs
    #[error("record has no field '{field}'")]
    MissingField {
        protocol: &'static str,
        field: String,
    },

    /// Unknown beancount directive
    #[error("invalid directive type '{0}'")]
    InvalidDirective(String),
}

impl TextError {
    /// Create a pattern error
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(protocol: &'static str, field: impl Into<String>) -> Self {
        Self::MissingField {
            protocol,
            field: field.into(),
        }
    }

    /// Name of the protocol that raised the error
    pub fn protocol(&self) -> &'static str {
        match self {
            Self::Pattern { .. } => "pattern",
            Self::MissingField { protocol, .. } => *protocol,
            Self::InvalidDirective(_) => "beancount",
        }
    }
}

impl From<TextError> for edict_record::Error {
    fn from(e: TextError) -> Self {
        edict_record::Error::protocol(e.protocol(), e.to_string())
    }
}

/// Result type alias for text protocol operations
pub type TextResult<T> = std::result::Result<T, TextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_context_survives_conversion() {
        let err: edict_record::Error = TextError::missing_field("hledger", "date").into();
        assert_eq!(
            err.to_string(),
            "Protocol error (hledger): record has no field 'date'"
        );

        let err: edict_record::Error = TextError::InvalidDirective("note".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Protocol error (beancount): invalid directive type 'note'"
        );
    }
}
