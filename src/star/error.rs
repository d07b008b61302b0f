/// Errors that can occur while reading or writing STAR files
#[derive(Debug, thiserror::Error)]
pub enum StarError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A row does not match the declared columns
    #[error("Row has {found} values but table '{table}' declares {expected} columns")]
    ColumnCountMismatch {
        /// Table being written or read
        table: String,
        /// Declared column count
        expected: usize,
        /// Values in the offending row
        found: usize,
    },

    /// A text cell cannot be written without changing its meaning
    #[error("Value {value} in table '{table}' contains a double quote, which STAR cannot represent")]
    UnrepresentableValue {
        /// Table being written
        table: String,
        /// Offending value
        value: String,
    },

    /// A row was written before any table header
    #[error("No table started; call begin_table first")]
    NoTable,

    /// Malformed STAR content
    #[error("Invalid STAR format at line {line}: {message}")]
    InvalidFormat {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
}
