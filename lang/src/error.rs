use crate::kind::Kind;
use thiserror::Error;

/// Result type used by every fallible value-layer operation
pub type ValueResult<T> = Result<T, ValueError>;

/// Broad grouping of value-layer failures, used when reporting errors to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Shape, subscript and container errors.
    Shape,
    /// Failed coercions between kinds or to/from strings.
    Conversion,
    /// Out-of-domain inputs and non-finite results.
    Numeric,
    /// Matrix file I/O.
    Io,
    /// Resource exhaustion and internal faults.
    Fatal,
}

/// Unified error type for the value layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("invalid row {row}, matrix has {rows} rows")]
    InvalidRow { row: i64, rows: usize },

    #[error("invalid column {column}, matrix has {columns} columns")]
    InvalidColumn { column: i64, columns: usize },

    #[error("invalid index {index}, container holds {length} elements")]
    InvalidIndex { index: i64, length: usize },

    #[error(
        "incompatible matrix dimensions: {lhs_rows}x{lhs_columns} and {rhs_rows}x{rhs_columns}"
    )]
    IncompatibleMatrixDimensions {
        lhs_rows: usize,
        lhs_columns: usize,
        rhs_rows: usize,
        rhs_columns: usize,
    },

    #[error("invalid matrix dimensions {rows}x{columns}")]
    InvalidMatrixDimensions { rows: usize, columns: usize },

    #[error("{kind} does not support subscripts")]
    TypeDoesNotSupportSubscripts { kind: Kind },

    #[error("invalid container contents: {reason}")]
    InvalidContainerContents { reason: String },

    #[error("can not convert {source_kind} to {target_kind}")]
    InvalidRuntimeConversion { source_kind: Kind, target_kind: Kind },

    #[error("invalid range {first}, {second:?} .. {last}")]
    InvalidRangeParameter {
        first: i64,
        second: Option<i64>,
        last: i64,
    },

    #[error("can not convert {kind} to a string")]
    CanNotConvertToString { kind: Kind },

    #[error("malformed string: {reason}")]
    MalformedString { reason: String },

    #[error("invalid parameter value: {reason}")]
    InvalidParameterValue { reason: String },

    #[error("invalid numeric value {value}")]
    InvalidNumericValue { value: f64 },

    #[error("result is NaN")]
    ResultIsNaN,

    #[error("result is infinite")]
    ResultIsInfinite,

    #[error("{operation} did not converge")]
    CanNotConverge { operation: &'static str },

    #[error("matrix is singular")]
    MatrixIsSingular,

    #[error("can not open {path}: {reason}")]
    FileOpenError { path: String, reason: String },

    #[error("can not read {path}: {reason}")]
    FileReadError { path: String, reason: String },

    #[error("can not write {path}: {reason}")]
    FileWriteError { path: String, reason: String },

    #[error("can not seek in {path}: {reason}")]
    FileSeekError { path: String, reason: String },

    #[error("can not close {path}: {reason}")]
    FileCloseError { path: String, reason: String },

    #[error("invalid file number {number}")]
    InvalidFileNumber { number: i64 },

    #[error("unknown file type for {path}")]
    UnknownFileType { path: String },

    #[error("insufficient memory")]
    InsufficientMemory,

    #[error("memory allocation of {bytes} bytes failed")]
    MemoryAllocationError { bytes: usize },

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("system error: {0}")]
    System(String),
}

impl ValueError {
    /// Shorthand for an `InvalidParameterValue` error
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        ValueError::InvalidParameterValue {
            reason: reason.into(),
        }
    }

    pub fn conversion(source_kind: Kind, target_kind: Kind) -> Self {
        ValueError::InvalidRuntimeConversion {
            source_kind,
            target_kind,
        }
    }

    pub fn incompatible_dimensions(lhs: (usize, usize), rhs: (usize, usize)) -> Self {
        ValueError::IncompatibleMatrixDimensions {
            lhs_rows: lhs.0,
            lhs_columns: lhs.1,
            rhs_rows: rhs.0,
            rhs_columns: rhs.1,
        }
    }

    /// Which taxonomy group this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValueError::InvalidRow { .. }
            | ValueError::InvalidColumn { .. }
            | ValueError::InvalidIndex { .. }
            | ValueError::IncompatibleMatrixDimensions { .. }
            | ValueError::InvalidMatrixDimensions { .. }
            | ValueError::TypeDoesNotSupportSubscripts { .. }
            | ValueError::InvalidContainerContents { .. } => ErrorCategory::Shape,

            ValueError::InvalidRuntimeConversion { .. }
            | ValueError::InvalidRangeParameter { .. }
            | ValueError::CanNotConvertToString { .. }
            | ValueError::MalformedString { .. }
            | ValueError::InvalidParameterValue { .. } => ErrorCategory::Conversion,

            ValueError::InvalidNumericValue { .. }
            | ValueError::ResultIsNaN
            | ValueError::ResultIsInfinite
            | ValueError::CanNotConverge { .. }
            | ValueError::MatrixIsSingular => ErrorCategory::Numeric,

            ValueError::FileOpenError { .. }
            | ValueError::FileReadError { .. }
            | ValueError::FileWriteError { .. }
            | ValueError::FileSeekError { .. }
            | ValueError::FileCloseError { .. }
            | ValueError::InvalidFileNumber { .. }
            | ValueError::UnknownFileType { .. } => ErrorCategory::Io,

            ValueError::InsufficientMemory
            | ValueError::MemoryAllocationError { .. }
            | ValueError::InternalError(_)
            | ValueError::System(_) => ErrorCategory::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_display() {
        let err = ValueError::conversion(Kind::Real, Kind::Integer);

        let display = err.to_string();
        assert!(display.contains("real"));
        assert!(display.contains("integer"));
        assert_eq!(err.category(), ErrorCategory::Conversion);
    }

    #[test]
    fn dimension_error_display() {
        let err = ValueError::incompatible_dimensions((2, 3), (4, 5));

        assert_eq!(
            err.to_string(),
            "incompatible matrix dimensions: 2x3 and 4x5"
        );
        assert_eq!(err.category(), ErrorCategory::Shape);
    }

    #[test]
    fn subscript_error_names_kind() {
        let err = ValueError::TypeDoesNotSupportSubscripts { kind: Kind::Set };
        assert_eq!(err.to_string(), "set does not support subscripts");
    }

    #[test]
    fn io_errors_carry_path() {
        let err = ValueError::FileOpenError {
            path: "/tmp/missing.csv".to_string(),
            reason: "not found".to_string(),
        };

        let display = err.to_string();
        assert!(display.contains("/tmp/missing.csv"));
        assert!(display.contains("not found"));
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn numeric_and_fatal_categories() {
        assert_eq!(ValueError::ResultIsNaN.category(), ErrorCategory::Numeric);
        assert_eq!(
            ValueError::CanNotConverge { operation: "schur" }.category(),
            ErrorCategory::Numeric
        );
        assert_eq!(
            ValueError::InternalError("bad".to_string()).category(),
            ErrorCategory::Fatal
        );
    }
}
