//! Row storage for minidb.
//!
//! Every table's rows are plain text fields; the declared column types are
//! applied by the execution engine when a row is read or written. The engine
//! talks to storage only through the [`Storage`] trait, so the on-disk CSV
//! backend ([`CsvStorage`]) and the in-process backend ([`MemoryStorage`])
//! are interchangeable.

mod csv;
mod memory;

pub use self::csv::CsvStorage;
pub use self::memory::MemoryStorage;

use crate::catalog::{ColumnSchema, TableSchema};
use crate::error::Result;

/// One stored row: ordered text fields, already stripped of any quoting.
pub type Row = Vec<String>;

/// The row-storage service consumed by the execution engine.
///
/// Column mutators rewrite every stored row of the table. Callers are
/// expected to have validated table and column existence against the
/// catalog first.
pub trait Storage {
    /// Initialise empty storage (header only) for a new table.
    fn create_table_storage(&mut self, schema: &TableSchema) -> Result<()>;

    /// Remove a table's storage. Missing storage is not an error.
    fn drop_table_storage(&mut self, table: &str) -> Result<()>;

    /// Move a table's storage to a new name. Missing storage is not an error.
    fn rename_table_storage(&mut self, old_name: &str, new_name: &str) -> Result<()>;

    /// Append `column` to the header and an empty field to every row.
    fn add_column(&mut self, table: &str, column: &ColumnSchema) -> Result<()>;

    /// Remove the named column from the header and every row.
    fn drop_column(&mut self, table: &str, column: &str) -> Result<()>;

    /// Rewrite the header entry for `column.name`; stored values are untouched.
    fn modify_column(&mut self, table: &str, column: &ColumnSchema) -> Result<()>;

    /// All data rows of a table in insertion order, header excluded.
    fn read_all_rows(&self, table: &str) -> Result<Vec<Row>>;

    fn append_row(&mut self, table: &str, row: &[String]) -> Result<()>;

    /// Replace the table's contents with a fresh header from `schema` and `rows`.
    fn write_all_rows(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<()>;
}
