//! Schema catalog for minidb.
//!
//! The catalog maps table names to their ordered column schemas. It is loaded
//! once when the database is opened and rewritten in full after every DDL
//! change, so the file on disk always reflects the in-memory state once a
//! mutator returns.
//!
//! # Persistence
//!
//! The catalog file holds one table per line, sorted by table name:
//!
//! ```text
//! students|id:INT:4,name:VARCHAR:32
//! ```
//!
//! Table and column names are compared case-sensitively.
//!
//! # Key types
//!
//! - [`Catalog`]: the table-name to schema directory.
//! - [`TableSchema`]: an ordered list of columns under a table name.
//! - [`ColumnSchema`]: name, type and declared length of one column.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{DbError, Result};
use crate::sql::ast::ColumnDef;
use crate::types::DataType;

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    /// Maximum VARCHAR length (0 = unlimited); informational for INT.
    pub length: usize,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType, length: usize) -> Self {
        ColumnSchema {
            name: name.into(),
            data_type,
            length,
        }
    }
}

impl From<ColumnDef> for ColumnSchema {
    fn from(def: ColumnDef) -> Self {
        ColumnSchema::new(def.name, def.data_type, def.length)
    }
}

/// Metadata for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        TableSchema {
            name: name.into(),
            columns,
        }
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The durable table-name to schema directory.
///
/// A catalog opened with [`Catalog::open`] persists to a file after every
/// mutation; one created with [`Catalog::in_memory`] never touches disk.
#[derive(Debug, Default)]
pub struct Catalog {
    path: Option<PathBuf>,
    tables: BTreeMap<String, TableSchema>,
}

impl Catalog {
    /// Open (or create) the catalog stored at `path`.
    ///
    /// A missing file is an empty catalog; the parent directory is created
    /// if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut catalog = Catalog {
            path: Some(path),
            tables: BTreeMap::new(),
        };
        catalog.refresh()?;
        Ok(catalog)
    }

    /// A catalog that lives only as long as this value.
    pub fn in_memory() -> Self {
        Catalog::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// All table names in ascending order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn create_table(&mut self, schema: TableSchema) -> Result<()> {
        if self.table_exists(&schema.name) {
            return Err(DbError::DuplicateTable(schema.name));
        }
        tracing::debug!(table = %schema.name, columns = schema.columns.len(), "catalog: create table");
        let mut tables = self.tables.clone();
        tables.insert(schema.name.clone(), schema);
        self.commit(tables)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let mut tables = self.tables.clone();
        if tables.remove(name).is_none() {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        tracing::debug!(table = name, "catalog: drop table");
        self.commit(tables)
    }

    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if self.table_exists(new_name) {
            return Err(DbError::DuplicateTable(new_name.to_string()));
        }
        let mut tables = self.tables.clone();
        let mut schema = tables
            .remove(old_name)
            .ok_or_else(|| DbError::TableNotFound(old_name.to_string()))?;
        schema.name = new_name.to_string();
        tables.insert(new_name.to_string(), schema);
        tracing::debug!(from = old_name, to = new_name, "catalog: rename table");
        self.commit(tables)
    }

    pub fn add_column(&mut self, table: &str, column: ColumnSchema) -> Result<()> {
        let mut tables = self.tables.clone();
        let schema = table_mut(&mut tables, table)?;
        if schema.find_column(&column.name).is_some() {
            return Err(DbError::DuplicateColumn(column.name));
        }
        schema.columns.push(column);
        self.commit(tables)
    }

    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        let mut tables = self.tables.clone();
        let schema = table_mut(&mut tables, table)?;
        let idx = schema
            .find_column_index(column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))?;
        schema.columns.remove(idx);
        self.commit(tables)
    }

    /// Replace the type and length of the column named `column.name`.
    pub fn modify_column(&mut self, table: &str, column: ColumnSchema) -> Result<()> {
        let mut tables = self.tables.clone();
        let schema = table_mut(&mut tables, table)?;
        let existing = schema
            .columns
            .iter_mut()
            .find(|c| c.name == column.name)
            .ok_or_else(|| DbError::ColumnNotFound(column.name.clone()))?;
        existing.data_type = column.data_type;
        existing.length = column.length;
        self.commit(tables)
    }

    /// Discard in-memory state and reload from the catalog file.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let mut tables = BTreeMap::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let schema = decode_table(line)
                .map_err(|detail| DbError::CorruptCatalog(format!("line {}: {detail}", idx + 1)))?;
            tables.insert(schema.name.clone(), schema);
        }
        tracing::debug!(path = %path.display(), tables = tables.len(), "catalog loaded");
        self.tables = tables;
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    /// Write `tables` to the catalog file, then make them current. A failed
    /// write leaves the in-memory catalog untouched.
    fn commit(&mut self, tables: BTreeMap<String, TableSchema>) -> Result<()> {
        if let Some(path) = &self.path {
            let mut out = String::new();
            for schema in tables.values() {
                out.push_str(&encode_table(schema));
                out.push('\n');
            }
            fs::write(path, out)?;
            tracing::info!(path = %path.display(), tables = tables.len(), "catalog persisted");
        }
        self.tables = tables;
        Ok(())
    }
}

fn table_mut<'a>(
    tables: &'a mut BTreeMap<String, TableSchema>,
    name: &str,
) -> Result<&'a mut TableSchema> {
    tables
        .get_mut(name)
        .ok_or_else(|| DbError::TableNotFound(name.to_string()))
}

// ---------------------------------------------------------------------------
// Line format
// ---------------------------------------------------------------------------

fn encode_table(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!("{}:{}:{}", c.name, c.data_type, c.length))
        .collect();
    format!("{}|{}", schema.name, columns.join(","))
}

fn decode_table(line: &str) -> std::result::Result<TableSchema, String> {
    let (name, columns) = line
        .split_once('|')
        .ok_or_else(|| "missing '|' separator".to_string())?;
    if name.is_empty() {
        return Err("empty table name".into());
    }

    let mut schema = TableSchema::new(name, Vec::new());
    for entry in columns.split(',').filter(|e| !e.is_empty()) {
        let mut parts = entry.split(':');
        let col_name = parts.next().unwrap_or_default();
        let type_name = parts
            .next()
            .ok_or_else(|| format!("column entry {entry:?} has no type"))?;
        let data_type: DataType = type_name
            .parse()
            .map_err(|_| format!("unknown column type {type_name:?}"))?;
        let length = match parts.next() {
            Some(len) => len
                .parse()
                .map_err(|_| format!("invalid length {len:?} for column {col_name}"))?,
            None => data_type.default_length(),
        };
        schema.columns.push(ColumnSchema::new(col_name, data_type, length));
    }
    Ok(schema)
}

// ===========================================================================
// Tests
// ===========================================================================
