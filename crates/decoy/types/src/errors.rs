//! Error types for contract and argument handling

/// Errors raised while describing members or reading arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    #[error("Member '{member}' takes {expected} argument(s) but {actual} were supplied")]
    ArityMismatch {
        member: String,
        expected: usize,
        actual: usize,
    },

    #[error("Argument '{parameter}' of member '{member}' does not fit declared type {expected}")]
    TypeMismatch {
        member: String,
        parameter: String,
        expected: String,
    },

    #[error("Contract {contract} has no member named '{member}'")]
    UnknownMember { contract: String, member: String },

    #[error("No argument named '{name}'")]
    UnknownParameter { name: String },

    #[error("Argument index {index} is out of range for {len} argument(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Value conversion failed: {reason}")]
    Conversion { reason: String },
}

impl From<serde_json::Error> for TypesError {
    fn from(err: serde_json::Error) -> Self {
        Self::Conversion {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for type-level operations
pub type TypesResult<T> = Result<T, TypesError>;
