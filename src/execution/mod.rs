//! # Execution Engine
//!
//! Executes parsed statements against the catalog and row storage. The
//! engine owns both collaborators for its whole lifetime and keeps no other
//! state between calls: every DDL change and every affecting DML statement
//! is written through before [`ExecutionEngine::execute`] returns.
//!
//! DDL writes the two collaborators in a fixed order. `CREATE` and `DROP`
//! touch the catalog first; `RENAME` and the column mutations touch storage
//! first. All existence and duplicate checks run before either write.

mod eval;
mod format;

pub use format::ResultTable;

use crate::catalog::{Catalog, ColumnSchema, TableSchema};
use crate::error::{DbError, Result};
use crate::sql::ast::*;
use crate::storage::{Row, Storage};

use eval::{evaluate_condition, literal_to_storage, lookup_column, resolve_qualifier, Binding, TableData};

/// Runs statements against a [`Catalog`] and a [`Storage`] backend.
pub struct ExecutionEngine {
    catalog: Catalog,
    storage: Box<dyn Storage>,
}

impl ExecutionEngine {
    pub fn new(catalog: Catalog, storage: Box<dyn Storage>) -> Self {
        ExecutionEngine { catalog, storage }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Execute one statement and return its printable result.
    ///
    /// DDL and DML return an `OK: ...` message; `SELECT` returns the
    /// rendered result table.
    pub fn execute(&mut self, stmt: &Statement) -> Result<String> {
        tracing::debug!(kind = stmt.kind(), "executing statement");
        match stmt {
            Statement::CreateTable(ct) => self.execute_create_table(ct),
            Statement::DropTable(dt) => self.execute_drop_table(dt),
            Statement::AlterTable(at) => self.execute_alter_table(at),
            Statement::Insert(ins) => self.execute_insert(ins),
            Statement::Update(upd) => self.execute_update(upd),
            Statement::Delete(del) => self.execute_delete(del),
            Statement::Select(sel) => Ok(self.select(sel)?.render()),
        }
    }

    // ---- CREATE TABLE ----

    fn execute_create_table(&mut self, ct: &CreateTableStatement) -> Result<String> {
        if self.catalog.table_exists(&ct.name) {
            return Err(DbError::DuplicateTable(ct.name.clone()));
        }

        let mut columns: Vec<ColumnSchema> = Vec::with_capacity(ct.columns.len());
        for def in &ct.columns {
            if columns.iter().any(|c| c.name == def.name) {
                return Err(DbError::DuplicateColumn(def.name.clone()));
            }
            columns.push(def.clone().into());
        }
        let schema = TableSchema::new(ct.name.clone(), columns);

        self.catalog.create_table(schema.clone())?;
        self.storage.create_table_storage(&schema)?;
        tracing::info!(table = %ct.name, "table created");
        Ok(format!("OK: Table created: {}", ct.name))
    }

    // ---- DROP TABLE ----

    fn execute_drop_table(&mut self, dt: &DropTableStatement) -> Result<String> {
        if !self.catalog.table_exists(&dt.name) {
            return Err(DbError::TableNotFound(dt.name.clone()));
        }
        self.catalog.drop_table(&dt.name)?;
        self.storage.drop_table_storage(&dt.name)?;
        tracing::info!(table = %dt.name, "table dropped");
        Ok(format!("OK: Table dropped: {}", dt.name))
    }

    // ---- ALTER TABLE ----

    fn execute_alter_table(&mut self, at: &AlterTableStatement) -> Result<String> {
        let table = at.table.as_str();
        let schema = self.table_schema(table)?;

        match &at.action {
            AlterTableAction::RenameTo(new_name) => {
                if self.catalog.table_exists(new_name) {
                    return Err(DbError::DuplicateTable(new_name.clone()));
                }
                self.storage.rename_table_storage(table, new_name)?;
                self.catalog.rename_table(table, new_name)?;
                tracing::info!(from = table, to = %new_name, "table renamed");
                Ok(format!("OK: Table renamed: {table} -> {new_name}"))
            }
            AlterTableAction::AddColumn(def) => {
                if schema.find_column(&def.name).is_some() {
                    return Err(DbError::DuplicateColumn(def.name.clone()));
                }
                let column = ColumnSchema::from(def.clone());
                self.storage.add_column(table, &column)?;
                self.catalog.add_column(table, column)?;
                tracing::info!(table, column = %def.name, "column added");
                Ok(format!("OK: Column added: {table}.{}", def.name))
            }
            AlterTableAction::DropColumn(name) => {
                if schema.find_column(name).is_none() {
                    return Err(DbError::ColumnNotFound(name.clone()));
                }
                if schema.columns.len() == 1 {
                    return Err(DbError::LastColumn(table.to_string()));
                }
                self.storage.drop_column(table, name)?;
                self.catalog.drop_column(table, name)?;
                tracing::info!(table, column = %name, "column dropped");
                Ok(format!("OK: Column dropped: {table}.{name}"))
            }
            AlterTableAction::ModifyColumn { target, column } => {
                if schema.find_column(target).is_none() {
                    return Err(DbError::ColumnNotFound(target.clone()));
                }
                // Stored values are left as-is and reinterpreted on the next read.
                let column = ColumnSchema::new(target.clone(), column.data_type, column.length);
                self.storage.modify_column(table, &column)?;
                self.catalog.modify_column(table, column)?;
                tracing::info!(table, column = %target, "column modified");
                Ok(format!("OK: Column modified: {table}.{target}"))
            }
        }
    }

    // ---- INSERT ----

    fn execute_insert(&mut self, ins: &InsertStatement) -> Result<String> {
        let schema = self.table_schema(&ins.table)?;
        if ins.values.len() != schema.columns.len() {
            return Err(DbError::ValueCount {
                table: ins.table.clone(),
                expected: schema.columns.len(),
                actual: ins.values.len(),
            });
        }

        let row = ins
            .values
            .iter()
            .zip(&schema.columns)
            .map(|(value, column)| literal_to_storage(value, column))
            .collect::<Result<Row>>()?;

        self.storage.append_row(&ins.table, &row)?;
        Ok(format!("OK: 1 row inserted into {}", ins.table))
    }

    // ---- UPDATE ----

    fn execute_update(&mut self, upd: &UpdateStatement) -> Result<String> {
        let data = self.load_table(&upd.table, &upd.table)?;

        // Resolve and convert every assignment before touching any row.
        let mut changes = Vec::with_capacity(upd.assignments.len());
        for assignment in &upd.assignments {
            let idx = data
                .schema
                .find_column_index(&assignment.column)
                .ok_or_else(|| DbError::ColumnNotFound(assignment.column.clone()))?;
            let cell = literal_to_storage(&assignment.value, &data.schema.columns[idx])?;
            changes.push((idx, cell));
        }

        let mut affected = 0;
        let mut rows = Vec::with_capacity(data.rows.len());
        for row in &data.rows {
            let mut row = row.clone();
            if row_matches(upd.where_clause.as_ref(), &data, &row)? {
                for (idx, cell) in &changes {
                    row[*idx] = cell.clone();
                }
                affected += 1;
            }
            rows.push(row);
        }

        if affected > 0 {
            self.storage.write_all_rows(&data.schema, &rows)?;
        }
        tracing::debug!(table = %upd.table, affected, "update applied");
        Ok(format!("OK: {affected} row(s) updated in {}", upd.table))
    }

    // ---- DELETE ----

    fn execute_delete(&mut self, del: &DeleteStatement) -> Result<String> {
        let data = self.load_table(&del.table, &del.table)?;

        let mut kept = Vec::with_capacity(data.rows.len());
        for row in &data.rows {
            if !row_matches(del.where_clause.as_ref(), &data, row)? {
                kept.push(row.clone());
            }
        }

        let removed = data.rows.len() - kept.len();
        if removed > 0 {
            self.storage.write_all_rows(&data.schema, &kept)?;
        }
        tracing::debug!(table = %del.table, removed, "delete applied");
        Ok(format!("OK: {removed} row(s) deleted from {}", del.table))
    }

    // ---- SELECT ----

    /// Run a `SELECT` and return the projected rows before rendering.
    ///
    /// Joins are evaluated as an incremental nested loop: each join clause
    /// extends every surviving binding list with every row of the next
    /// table and keeps the candidates whose `ON` condition holds.
    pub fn select(&self, stmt: &SelectStatement) -> Result<ResultTable> {
        let mut tables = Vec::with_capacity(stmt.joins.len() + 1);
        tables.push(self.load_table(&stmt.from.name, stmt.from.label())?);
        for join in &stmt.joins {
            tables.push(self.load_table(&join.table.name, join.table.label())?);
        }

        let table_refs: Vec<&TableData> = tables.iter().collect();
        let (headers, projection) = resolve_projection(&stmt.columns, &table_refs)?;

        let primary = &tables[0];
        let mut candidates: Vec<Vec<Binding<'_>>> = primary
            .rows
            .iter()
            .map(|row| vec![Binding { table: primary, row }])
            .collect();

        for (join, table) in stmt.joins.iter().zip(&tables[1..]) {
            let mut next = Vec::new();
            for existing in &candidates {
                for row in &table.rows {
                    let mut candidate = existing.clone();
                    candidate.push(Binding { table, row });
                    if evaluate_condition(&join.condition, &candidate)? {
                        next.push(candidate);
                    }
                }
            }
            tracing::trace!(
                table = %table.name,
                inputs = candidates.len(),
                outputs = next.len(),
                "join step"
            );
            candidates = next;
        }

        if let Some(where_clause) = &stmt.where_clause {
            let mut filtered = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if evaluate_condition(where_clause, &candidate)? {
                    filtered.push(candidate);
                }
            }
            candidates = filtered;
        }

        let rows: Vec<Vec<String>> = candidates
            .iter()
            .map(|bindings| {
                projection
                    .iter()
                    .map(|&(t, c)| bindings[t].row[c].clone())
                    .collect()
            })
            .collect();

        Ok(ResultTable::new(headers, rows))
    }

    // ---- Helpers ----

    fn table_schema(&self, name: &str) -> Result<TableSchema> {
        self.catalog
            .get_table(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn load_table(&self, name: &str, label: &str) -> Result<TableData> {
        let schema = self.table_schema(name)?;
        let rows = self.storage.read_all_rows(name)?;
        TableData::new(name, label, schema, rows)
    }
}

/// True if `row` satisfies the optional single-table condition.
fn row_matches(condition: Option<&Expr>, data: &TableData, row: &[String]) -> Result<bool> {
    match condition {
        Some(expr) => evaluate_condition(expr, &[Binding { table: data, row }]),
        None => Ok(true),
    }
}

/// Expand the select list into header labels and `(table, column)` positions.
fn resolve_projection(
    items: &[SelectItem],
    tables: &[&TableData],
) -> Result<(Vec<String>, Vec<(usize, usize)>)> {
    let mut headers = Vec::new();
    let mut positions = Vec::new();

    let expand = |t: usize, headers: &mut Vec<String>, positions: &mut Vec<(usize, usize)>| {
        let table = tables[t];
        for (c, column) in table.schema.columns.iter().enumerate() {
            headers.push(format!("{}.{}", table.label, column.name));
            positions.push((t, c));
        }
    };

    for item in items {
        match item {
            SelectItem::Wildcard { table: None } => {
                for t in 0..tables.len() {
                    expand(t, &mut headers, &mut positions);
                }
            }
            SelectItem::Wildcard { table: Some(q) } => {
                let t = resolve_qualifier(tables, q)?;
                expand(t, &mut headers, &mut positions);
            }
            SelectItem::Column { table, name, alias } => {
                let pos = lookup_column(tables, table.as_deref(), name)?;
                headers.push(match (alias, table) {
                    (Some(alias), _) => alias.clone(),
                    (None, Some(q)) => format!("{q}.{name}"),
                    (None, None) => name.clone(),
                });
                positions.push(pos);
            }
        }
    }

    Ok((headers, positions))
}
