//! # minidb
//!
//! A minimal single-user SQL database. Statements are tokenized and parsed
//! into an owned AST, then executed against a text-file catalog and one CSV
//! file per table.
//!
//! ```no_run
//! use minidb::{Config, Database};
//!
//! let mut db = Database::open(&Config::default())?;
//! db.execute("CREATE TABLE t (id INT, name VARCHAR(20))")?;
//! db.execute("INSERT INTO t VALUES (1, 'Ada')")?;
//! println!("{}", db.query("SELECT * FROM t")?);
//! # Ok::<(), minidb::DbError>(())
//! ```

pub mod error;
pub mod types;
pub mod catalog;
pub mod storage;
pub mod sql;
pub mod execution;
pub mod shell;

pub use error::{DbError, ErrorCategory, Result};
pub use execution::{ExecutionEngine, ResultTable};
pub use types::DataType;

use std::path::{Path, PathBuf};

use catalog::Catalog;
use sql::ast::Statement;
use sql::Parser;
use storage::{CsvStorage, MemoryStorage};

/// Name of the catalog file inside the data directory.
pub const CATALOG_FILE: &str = "catalog.meta";

/// Where a [`Database`] keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the catalog and one `<table>.csv` per table.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new("data")
    }
}

/// The main database handle.
pub struct Database {
    data_dir: Option<PathBuf>,
    engine: ExecutionEngine,
}

impl Database {
    /// Open or create a database in `config.data_dir`.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = CsvStorage::open(&config.data_dir)?;
        let catalog = Catalog::open(config.catalog_path())?;
        tracing::info!(
            data_dir = %config.data_dir.display(),
            tables = catalog.table_names().len(),
            "database opened"
        );
        Ok(Database {
            data_dir: Some(config.data_dir.clone()),
            engine: ExecutionEngine::new(catalog, Box::new(storage)),
        })
    }

    /// A database that keeps everything in memory.
    pub fn in_memory() -> Self {
        Database {
            data_dir: None,
            engine: ExecutionEngine::new(Catalog::in_memory(), Box::new(MemoryStorage::new())),
        }
    }

    /// Parse and execute one statement, returning its printable result.
    pub fn execute(&mut self, sql_text: &str) -> Result<String> {
        let stmt = Parser::parse(sql_text)?;
        self.engine.execute(&stmt)
    }

    /// Parse and run one `SELECT`, returning the unrendered result.
    pub fn query(&self, sql_text: &str) -> Result<ResultTable> {
        match Parser::parse(sql_text)? {
            Statement::Select(select) => self.engine.select(&select),
            other => Err(DbError::NotAQuery(other.kind().to_string())),
        }
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.engine.catalog().table_names()
    }

    /// The data directory, or `None` for an in-memory database.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_data_dir() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.catalog_path(), PathBuf::from("data").join("catalog.meta"));
    }

    #[test]
    fn in_memory_round_trip() {
        let mut db = Database::in_memory();
        db.execute("CREATE TABLE t (id INT);").unwrap();
        db.execute("INSERT INTO t VALUES (1)").unwrap();
        let result = db.query("SELECT id FROM t").unwrap();
        assert_eq!(result.rows, vec![vec!["1".to_string()]]);
        assert_eq!(db.table_names(), vec!["t"]);
        assert!(db.data_dir().is_none());
    }

    #[test]
    fn query_rejects_non_select() {
        let db = Database::in_memory();
        let err = db.query("DROP TABLE t").unwrap_err();
        assert!(matches!(err, DbError::NotAQuery(ref k) if k == "DROP TABLE"));
    }
}
