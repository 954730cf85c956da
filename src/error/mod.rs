//! Unified error handling for minidb.
//!
//! This module defines [`DbError`], the single error type propagated through
//! every layer of the database: the lexer and parser, the execution engine,
//! and the built-in catalog and storage collaborators.
//!
//! A convenience [`Result<T>`] type alias is re-exported so that callers can
//! write `Result<T>` instead of `std::result::Result<T, DbError>`.

use std::io;

use crate::sql::ast::ComparisonOp;
use crate::types::DataType;

/// The canonical error type for all minidb operations.
///
/// Every error aborts the statement being processed. Variants are grouped by
/// the subsystem that raises them; use [`DbError::category`] to branch on
/// the broad failure class without inspecting message text.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// An I/O error from the data directory.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A table file could not be read or written as CSV.
    #[error("storage error: {0}")]
    Csv(#[from] csv::Error),

    /// The catalog file contains a line that cannot be decoded.
    #[error("corrupt catalog: {0}")]
    CorruptCatalog(String),

    /// A stored row does not line up with its table schema.
    #[error("corrupt row in table {table}: {detail}")]
    CorruptRow { table: String, detail: String },

    /// The SQL text could not be tokenized or parsed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A table with the given name already exists.
    #[error("table already exists: {0}")]
    DuplicateTable(String),

    /// The referenced table does not exist in the catalog.
    #[error("table does not exist: {0}")]
    TableNotFound(String),

    /// A column with the given name already exists within the same table.
    #[error("column already exists: {0}")]
    DuplicateColumn(String),

    /// The referenced column does not exist on any candidate table.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A qualifier names neither a bound table nor one of its aliases.
    #[error("unknown table or alias: {0}")]
    UnknownTable(String),

    /// A qualifier matches more than one bound table.
    #[error("ambiguous table reference: {0}")]
    AmbiguousTable(String),

    /// An unqualified column name exists on more than one bound table.
    #[error("ambiguous column: {0}")]
    AmbiguousColumn(String),

    /// A literal of the wrong type was supplied for a column.
    #[error("type mismatch: column {column} expects {expected}")]
    TypeMismatch { column: String, expected: DataType },

    /// `INSERT` supplied a different number of values than the table has columns.
    #[error("value count mismatch for table {table}: expected {expected}, got {actual}")]
    ValueCount {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// A VARCHAR value is longer than the column's declared length.
    #[error("value for column {column} exceeds maximum length {max}")]
    ValueTooLong { column: String, max: usize },

    /// `ALTER TABLE ... DROP COLUMN` would leave the table without columns.
    #[error("cannot drop the last column from table: {0}")]
    LastColumn(String),

    /// `=` or `<>` applied to operands of different types.
    #[error("cannot compare {left} with {right}")]
    Incomparable { left: DataType, right: DataType },

    /// An ordering operator applied to anything other than two INTs.
    #[error("{op} comparisons require INT operands")]
    NonIntOperands { op: ComparisonOp },

    /// A stored cell cannot be read back as its column's type.
    #[error("invalid INT value for column {column}: {value:?}")]
    InvalidStoredValue { column: String, value: String },

    /// A row-returning call was given a statement that returns no rows.
    #[error("statement does not return rows: {0}")]
    NotAQuery(String),
}

/// Broad failure class of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed SQL, raised before anything is executed.
    Syntax,
    /// The statement is well-formed but cannot be applied to the current data.
    Semantic,
    /// The data directory could not be read or written.
    Storage,
}

impl DbError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DbError::Syntax(_) => ErrorCategory::Syntax,
            DbError::Io(_) | DbError::Csv(_) | DbError::CorruptCatalog(_) => {
                ErrorCategory::Storage
            }
            _ => ErrorCategory::Semantic,
        }
    }
}

/// A specialised [`Result`] type for minidb operations.
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts_via_question_mark() {
        fn might_fail() -> Result<()> {
            let _f = std::fs::File::open("/non/existent/path/minidb_test")?;
            Ok(())
        }

        let err = might_fail().unwrap_err();
        assert!(matches!(err, DbError::Io(_)));
        assert_eq!(err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn display_messages_are_human_readable() {
        let cases: Vec<(DbError, &str)> = vec![
            (
                DbError::Syntax("expected keyword 'FROM', found end of input".into()),
                "syntax error: expected keyword 'FROM', found end of input",
            ),
            (
                DbError::TableNotFound("users".into()),
                "table does not exist: users",
            ),
            (
                DbError::DuplicateTable("users".into()),
                "table already exists: users",
            ),
            (
                DbError::ColumnNotFound("s.email".into()),
                "column not found: s.email",
            ),
            (DbError::AmbiguousColumn("id".into()), "ambiguous column: id"),
            (
                DbError::TypeMismatch {
                    column: "age".into(),
                    expected: DataType::Int,
                },
                "type mismatch: column age expects INT",
            ),
            (
                DbError::ValueCount {
                    table: "t".into(),
                    expected: 2,
                    actual: 3,
                },
                "value count mismatch for table t: expected 2, got 3",
            ),
            (
                DbError::ValueTooLong {
                    column: "name".into(),
                    max: 5,
                },
                "value for column name exceeds maximum length 5",
            ),
            (
                DbError::LastColumn("t".into()),
                "cannot drop the last column from table: t",
            ),
            (
                DbError::Incomparable {
                    left: DataType::Int,
                    right: DataType::Varchar,
                },
                "cannot compare INT with VARCHAR",
            ),
            (
                DbError::NonIntOperands {
                    op: ComparisonOp::GreaterOrEqual,
                },
                ">= comparisons require INT operands",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn categories() {
        assert_eq!(
            DbError::Syntax("x".into()).category(),
            ErrorCategory::Syntax
        );
        assert_eq!(
            DbError::AmbiguousColumn("id".into()).category(),
            ErrorCategory::Semantic
        );
        assert_eq!(
            DbError::CorruptCatalog("line 3".into()).category(),
            ErrorCategory::Storage
        );
    }
}
