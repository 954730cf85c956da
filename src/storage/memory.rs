//! In-process table storage. Nothing survives the owning value.

use std::collections::HashMap;

use super::{Row, Storage};
use crate::catalog::{ColumnSchema, TableSchema};
use crate::error::{DbError, Result};

#[derive(Debug, Default, Clone)]
struct MemTable {
    header: Row,
    rows: Vec<Row>,
}

/// [`Storage`] backed by in-memory vectors.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: HashMap<String, MemTable>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    fn table(&self, name: &str) -> Result<&MemTable> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn column_index(table: &MemTable, column: &str) -> Result<usize> {
        table
            .header
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))
    }
}

impl Storage for MemoryStorage {
    fn create_table_storage(&mut self, schema: &TableSchema) -> Result<()> {
        self.tables.insert(
            schema.name.clone(),
            MemTable {
                header: schema.column_names(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn drop_table_storage(&mut self, table: &str) -> Result<()> {
        self.tables.remove(table);
        Ok(())
    }

    fn rename_table_storage(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if let Some(data) = self.tables.remove(old_name) {
            self.tables.insert(new_name.to_string(), data);
        }
        Ok(())
    }

    fn add_column(&mut self, table: &str, column: &ColumnSchema) -> Result<()> {
        let data = self.table_mut(table)?;
        data.header.push(column.name.clone());
        for row in &mut data.rows {
            row.push(String::new());
        }
        Ok(())
    }

    fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        let data = self.table_mut(table)?;
        let idx = Self::column_index(data, column)?;
        data.header.remove(idx);
        for row in &mut data.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        Ok(())
    }

    fn modify_column(&mut self, table: &str, column: &ColumnSchema) -> Result<()> {
        let data = self.table(table)?;
        Self::column_index(data, &column.name).map(|_| ())
    }

    fn read_all_rows(&self, table: &str) -> Result<Vec<Row>> {
        Ok(self.table(table)?.rows.clone())
    }

    fn append_row(&mut self, table: &str, row: &[String]) -> Result<()> {
        self.table_mut(table)?.rows.push(row.to_vec());
        Ok(())
    }

    fn write_all_rows(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<()> {
        let data = self.tables.entry(schema.name.clone()).or_default();
        data.header = schema.column_names();
        data.rows = rows.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn schema() -> TableSchema {
        TableSchema::new(
            "t",
            vec![
                ColumnSchema::new("a", DataType::Int, 4),
                ColumnSchema::new("b", DataType::Varchar, 8),
            ],
        )
    }

    #[test]
    fn append_then_read() {
        let mut storage = MemoryStorage::new();
        storage.create_table_storage(&schema()).unwrap();
        storage
            .append_row("t", &["1".to_string(), "x".to_string()])
            .unwrap();
        assert_eq!(storage.read_all_rows("t").unwrap(), vec![vec!["1", "x"]]);
    }

    #[test]
    fn column_changes_rewrite_rows() {
        let mut storage = MemoryStorage::new();
        storage.create_table_storage(&schema()).unwrap();
        storage
            .append_row("t", &["1".to_string(), "x".to_string()])
            .unwrap();

        storage
            .add_column("t", &ColumnSchema::new("c", DataType::Int, 4))
            .unwrap();
        assert_eq!(storage.read_all_rows("t").unwrap(), vec![vec!["1", "x", ""]]);

        storage.drop_column("t", "a").unwrap();
        assert_eq!(storage.read_all_rows("t").unwrap(), vec![vec!["x", ""]]);

        assert!(matches!(
            storage.modify_column("t", &ColumnSchema::new("a", DataType::Int, 4)),
            Err(DbError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn rename_moves_rows() {
        let mut storage = MemoryStorage::new();
        storage.create_table_storage(&schema()).unwrap();
        storage.rename_table_storage("t", "u").unwrap();
        assert!(storage.read_all_rows("t").is_err());
        assert!(storage.read_all_rows("u").unwrap().is_empty());
    }
}
