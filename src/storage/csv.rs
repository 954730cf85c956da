//! On-disk table storage: one `<table>.csv` file per table.
//!
//! The first record of each file is the header of column names; every
//! following record is one row. Quoting of fields that contain commas,
//! quotes or line breaks is handled by the `csv` crate in both directions.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use ::csv::{ReaderBuilder, WriterBuilder};

use super::{Row, Storage};
use crate::catalog::{ColumnSchema, TableSchema};
use crate::error::{DbError, Result};

/// CSV-file storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    dir: PathBuf,
}

impl CsvStorage {
    /// Use `dir` as the data directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(CsvStorage { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    fn read_file(&self, table: &str) -> Result<(Row, Vec<Row>)> {
        let file = File::open(self.table_path(table))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header: Row = reader.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(String::from).collect());
        }
        Ok((header, rows))
    }

    fn write_file(&self, table: &str, header: &[String], rows: &[Row]) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(self.table_path(table))?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        tracing::trace!(table, rows = rows.len(), "table file rewritten");
        Ok(())
    }

    fn header_index(header: &[String], column: &str) -> Result<usize> {
        header
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))
    }
}

impl Storage for CsvStorage {
    fn create_table_storage(&mut self, schema: &TableSchema) -> Result<()> {
        self.write_file(&schema.name, &schema.column_names(), &[])
    }

    fn drop_table_storage(&mut self, table: &str) -> Result<()> {
        let path = self.table_path(table);
        if path.exists() {
            fs::remove_file(&path)?;
        } else {
            tracing::warn!(path = %path.display(), "no table file to remove");
        }
        Ok(())
    }

    fn rename_table_storage(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let from = self.table_path(old_name);
        if !from.exists() {
            tracing::warn!(path = %from.display(), "no table file to rename");
            return Ok(());
        }
        fs::rename(&from, self.table_path(new_name))?;
        Ok(())
    }

    fn add_column(&mut self, table: &str, column: &ColumnSchema) -> Result<()> {
        let (mut header, mut rows) = self.read_file(table)?;
        header.push(column.name.clone());
        for row in &mut rows {
            row.push(String::new());
        }
        self.write_file(table, &header, &rows)
    }

    fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        let (mut header, mut rows) = self.read_file(table)?;
        let idx = Self::header_index(&header, column)?;
        header.remove(idx);
        for (n, row) in rows.iter_mut().enumerate() {
            if idx >= row.len() {
                return Err(DbError::CorruptRow {
                    table: table.to_string(),
                    detail: format!("row {} has no field for column {column}", n + 1),
                });
            }
            row.remove(idx);
        }
        self.write_file(table, &header, &rows)
    }

    fn modify_column(&mut self, table: &str, column: &ColumnSchema) -> Result<()> {
        let (mut header, rows) = self.read_file(table)?;
        let idx = Self::header_index(&header, &column.name)?;
        header[idx] = column.name.clone();
        self.write_file(table, &header, &rows)
    }

    fn read_all_rows(&self, table: &str) -> Result<Vec<Row>> {
        let (_, rows) = self.read_file(table)?;
        Ok(rows)
    }

    fn append_row(&mut self, table: &str, row: &[String]) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(self.table_path(table))?;
        let mut writer = WriterBuilder::new().flexible(true).from_writer(file);
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }

    fn write_all_rows(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<()> {
        self.write_file(&schema.name, &schema.column_names(), rows)
    }
}
