//! Error types for the ETL core.

/// Errors raised by DataSet, Driver and SQL utility operations.
///
/// Most malformed-but-recoverable input (empty field lists, empty key
/// lists, unparsable type ranges) is reported as an empty string or `None`
/// instead. The variants here are the cases where continuing would produce
/// wrong data.
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// A row or column index is outside the current bounds.
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The length of the indexed collection.
        len: usize,
    },

    /// A field name does not exist in the DataSet.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A driver neither declares a size limit nor delegates it to a parent.
    #[error("driver '{driver}' has no {limit} configured and no parent driver")]
    UnconfiguredLimit {
        /// Driver name.
        driver: String,
        /// Name of the missing limit.
        limit: &'static str,
    },

    /// No driver is registered under this name.
    #[error("unknown driver: {0}")]
    UnknownDriver(String),

    /// A filter expression could not be parsed.
    #[error("filter syntax error at position {position}: {message}")]
    FilterSyntax {
        /// Error message.
        message: String,
        /// Byte offset into the expression.
        position: usize,
    },

    /// A sort expression could not be parsed.
    #[error("invalid sort expression: {0}")]
    InvalidSortExpression(String),

    /// Encoded text could not be turned back into a value.
    #[error("cannot decode field '{field}': {message}")]
    Decode {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// A result set implementation failed while producing rows.
    #[error("result set error: {0}")]
    ResultSet(String),
}

/// Result type for ETL core operations.
pub type Result<T> = std::result::Result<T, EtlError>;
