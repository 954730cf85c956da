//! Row bindings, name resolution and condition evaluation.
//!
//! A [`Binding`] pairs a loaded table with one of its rows. Conditions are
//! evaluated against an ordered list of bindings (one per table in the
//! `FROM`/`JOIN` sequence). Column references are resolved against the same
//! list, so resolution works identically for a single-table `UPDATE` and a
//! three-way join.

use std::cmp::Ordering;

use crate::catalog::{ColumnSchema, TableSchema};
use crate::error::{DbError, Result};
use crate::sql::ast::{ComparisonOp, Expr, LiteralValue};
use crate::storage::Row;
use crate::types::DataType;

// ---------------------------------------------------------------------------
// Loaded tables and bindings
// ---------------------------------------------------------------------------

/// A table's schema and rows, labelled the way the statement refers to it.
#[derive(Debug, Clone)]
pub(crate) struct TableData {
    pub name: String,
    /// The alias if one was given, else the table name.
    pub label: String,
    pub schema: TableSchema,
    /// Every row holds at least `schema.columns.len()` fields.
    pub rows: Vec<Row>,
}

impl TableData {
    /// Wrap freshly read rows, rejecting any that are shorter than the schema.
    pub fn new(name: &str, label: &str, schema: TableSchema, rows: Vec<Row>) -> Result<Self> {
        let width = schema.columns.len();
        if let Some((n, short)) = rows.iter().enumerate().find(|(_, r)| r.len() < width) {
            return Err(DbError::CorruptRow {
                table: name.to_string(),
                detail: format!(
                    "row {} has {} fields, expected {width}",
                    n + 1,
                    short.len()
                ),
            });
        }
        Ok(TableData {
            name: name.to_string(),
            label: label.to_string(),
            schema,
            rows,
        })
    }
}

/// One row of one table during evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding<'a> {
    pub table: &'a TableData,
    pub row: &'a [String],
}

/// Anything that exposes a loaded table for name resolution.
pub(crate) trait HasTable {
    fn table(&self) -> &TableData;
}

impl HasTable for &TableData {
    fn table(&self) -> &TableData {
        self
    }
}

impl HasTable for Binding<'_> {
    fn table(&self) -> &TableData {
        self.table
    }
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

/// Find the position of the table a qualifier refers to.
///
/// Labels (aliases) are tried first; only if no label matches is the
/// qualifier compared against the underlying table names. Matching more than
/// one table is an error rather than a silent first pick.
pub(crate) fn resolve_qualifier<T: HasTable>(tables: &[T], qualifier: &str) -> Result<usize> {
    let by_label: Vec<usize> = positions(tables, |t| t.label == qualifier);
    let matches = if by_label.is_empty() {
        positions(tables, |t| t.name == qualifier)
    } else {
        by_label
    };

    match matches.as_slice() {
        [idx] => Ok(*idx),
        [] => Err(DbError::UnknownTable(qualifier.to_string())),
        _ => Err(DbError::AmbiguousTable(qualifier.to_string())),
    }
}

fn positions<T: HasTable>(tables: &[T], pred: impl Fn(&TableData) -> bool) -> Vec<usize> {
    tables
        .iter()
        .enumerate()
        .filter(|(_, t)| pred(t.table()))
        .map(|(i, _)| i)
        .collect()
}

/// Resolve a column reference to `(table position, column position)`.
pub(crate) fn lookup_column<T: HasTable>(
    tables: &[T],
    qualifier: Option<&str>,
    name: &str,
) -> Result<(usize, usize)> {
    if let Some(q) = qualifier {
        let t = resolve_qualifier(tables, q)?;
        let c = tables[t]
            .table()
            .schema
            .find_column_index(name)
            .ok_or_else(|| DbError::ColumnNotFound(format!("{q}.{name}")))?;
        return Ok((t, c));
    }

    let mut found = None;
    for (t, entry) in tables.iter().enumerate() {
        if let Some(c) = entry.table().schema.find_column_index(name) {
            if found.is_some() {
                return Err(DbError::AmbiguousColumn(name.to_string()));
            }
            found = Some((t, c));
        }
    }
    found.ok_or_else(|| DbError::ColumnNotFound(name.to_string()))
}

// ---------------------------------------------------------------------------
// Literal <-> storage coercion
// ---------------------------------------------------------------------------

/// Interpret a stored cell according to its column's declared type.
pub(crate) fn storage_to_literal(column: &ColumnSchema, text: &str) -> Result<LiteralValue> {
    match column.data_type {
        DataType::Int => text
            .parse::<i64>()
            .map(LiteralValue::Int)
            .map_err(|_| DbError::InvalidStoredValue {
                column: column.name.clone(),
                value: text.to_string(),
            }),
        DataType::Varchar => Ok(LiteralValue::String(text.to_string())),
    }
}

/// Check a literal against a column and render it as a stored cell.
pub(crate) fn literal_to_storage(literal: &LiteralValue, column: &ColumnSchema) -> Result<String> {
    match (column.data_type, literal) {
        (DataType::Int, LiteralValue::Int(v)) => Ok(v.to_string()),
        (DataType::Varchar, LiteralValue::String(s)) => {
            if column.length != 0 && s.len() > column.length {
                return Err(DbError::ValueTooLong {
                    column: column.name.clone(),
                    max: column.length,
                });
            }
            Ok(s.clone())
        }
        (expected, _) => Err(DbError::TypeMismatch {
            column: column.name.clone(),
            expected,
        }),
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Apply a comparison operator to two evaluated operands.
pub(crate) fn compare(op: ComparisonOp, left: &LiteralValue, right: &LiteralValue) -> Result<bool> {
    let ordering = match op {
        ComparisonOp::Equal | ComparisonOp::NotEqual => match (left, right) {
            (LiteralValue::Int(a), LiteralValue::Int(b)) => a.cmp(b),
            (LiteralValue::String(a), LiteralValue::String(b)) => a.cmp(b),
            _ => {
                return Err(DbError::Incomparable {
                    left: left.data_type(),
                    right: right.data_type(),
                })
            }
        },
        _ => match (left, right) {
            (LiteralValue::Int(a), LiteralValue::Int(b)) => a.cmp(b),
            _ => return Err(DbError::NonIntOperands { op }),
        },
    };

    Ok(match op {
        ComparisonOp::Equal => ordering == Ordering::Equal,
        ComparisonOp::NotEqual => ordering != Ordering::Equal,
        ComparisonOp::Greater => ordering == Ordering::Greater,
        ComparisonOp::Less => ordering == Ordering::Less,
        ComparisonOp::GreaterOrEqual => ordering != Ordering::Less,
        ComparisonOp::LessOrEqual => ordering != Ordering::Greater,
    })
}

/// Evaluate an operand (literal or column reference) to a value.
pub(crate) fn evaluate_operand(expr: &Expr, bindings: &[Binding<'_>]) -> Result<LiteralValue> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Column { table, name } => {
            let (t, c) = lookup_column(bindings, table.as_deref(), name)?;
            let binding = bindings[t];
            storage_to_literal(&binding.table.schema.columns[c], &binding.row[c])
        }
        Expr::Comparison { .. } | Expr::And(_) => Err(DbError::Syntax(
            "a condition cannot be used as a value".into(),
        )),
    }
}

/// Evaluate a `WHERE`/`ON` condition against one candidate binding list.
pub(crate) fn evaluate_condition(expr: &Expr, bindings: &[Binding<'_>]) -> Result<bool> {
    match expr {
        Expr::Comparison { op, left, right } => {
            let l = evaluate_operand(left, bindings)?;
            let r = evaluate_operand(right, bindings)?;
            compare(*op, &l, &r)
        }
        Expr::And(terms) => {
            for term in terms {
                if !evaluate_condition(term, bindings)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Expr::Column { .. } | Expr::Literal(_) => Err(DbError::Syntax(
            "expected a comparison in condition".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, label: &str, cols: &[(&str, DataType)], rows: &[&[&str]]) -> TableData {
        let schema = TableSchema::new(
            name,
            cols.iter()
                .map(|(n, t)| ColumnSchema::new(*n, *t, t.default_length()))
                .collect(),
        );
        let rows: Vec<Row> = rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect::<Row>())
            .collect();
        TableData::new(name, label, schema, rows).unwrap()
    }

    fn col(table: Option<&str>, name: &str) -> Box<Expr> {
        Box::new(Expr::Column {
            table: table.map(str::to_string),
            name: name.to_string(),
        })
    }

    fn int(v: i64) -> Box<Expr> {
        Box::new(Expr::Literal(LiteralValue::Int(v)))
    }

    #[test]
    fn short_rows_are_rejected_on_load() {
        let schema = TableSchema::new(
            "t",
            vec![
                ColumnSchema::new("a", DataType::Int, 4),
                ColumnSchema::new("b", DataType::Int, 4),
            ],
        );
        let err = TableData::new("t", "t", schema, vec![vec!["1".into()]]).unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { .. }));
    }

    #[test]
    fn qualifier_prefers_alias_then_table_name() {
        let a = table("students", "s", &[("id", DataType::Int)], &[]);
        let b = table("courses", "courses", &[("id", DataType::Int)], &[]);
        let tables = [&a, &b];
        assert_eq!(resolve_qualifier(&tables, "s").unwrap(), 0);
        assert_eq!(resolve_qualifier(&tables, "students").unwrap(), 0);
        assert_eq!(resolve_qualifier(&tables, "courses").unwrap(), 1);
        assert!(matches!(
            resolve_qualifier(&tables, "x"),
            Err(DbError::UnknownTable(_))
        ));
    }

    #[test]
    fn self_join_by_table_name_is_ambiguous() {
        let a = table("emp", "e", &[("id", DataType::Int)], &[]);
        let b = table("emp", "m", &[("id", DataType::Int)], &[]);
        let tables = [&a, &b];
        assert!(matches!(
            resolve_qualifier(&tables, "emp"),
            Err(DbError::AmbiguousTable(_))
        ));
        assert_eq!(resolve_qualifier(&tables, "m").unwrap(), 1);
    }

    #[test]
    fn unqualified_lookup_detects_ambiguity() {
        let a = table("a", "a", &[("id", DataType::Int), ("x", DataType::Int)], &[]);
        let b = table("b", "b", &[("id", DataType::Int), ("y", DataType::Int)], &[]);
        let tables = [&a, &b];
        assert_eq!(lookup_column(&tables, None, "y").unwrap(), (1, 1));
        assert_eq!(lookup_column(&tables, Some("a"), "id").unwrap(), (0, 0));
        assert!(matches!(
            lookup_column(&tables, None, "id"),
            Err(DbError::AmbiguousColumn(_))
        ));
        assert!(matches!(
            lookup_column(&tables, None, "z"),
            Err(DbError::ColumnNotFound(_))
        ));
        let err = lookup_column(&tables, Some("b"), "x").unwrap_err();
        assert_eq!(err.to_string(), "column not found: b.x");
    }

    #[test]
    fn storage_coercion() {
        let id = ColumnSchema::new("id", DataType::Int, 4);
        let name = ColumnSchema::new("name", DataType::Varchar, 3);
        let any = ColumnSchema::new("any", DataType::Varchar, 0);

        assert_eq!(storage_to_literal(&id, "-7").unwrap(), LiteralValue::Int(-7));
        assert!(storage_to_literal(&id, "").is_err());
        assert!(storage_to_literal(&id, "abc").is_err());
        assert_eq!(
            storage_to_literal(&name, "").unwrap(),
            LiteralValue::String(String::new())
        );

        assert_eq!(literal_to_storage(&LiteralValue::Int(42), &id).unwrap(), "42");
        assert!(matches!(
            literal_to_storage(&LiteralValue::String("42".into()), &id),
            Err(DbError::TypeMismatch { .. })
        ));
        assert!(matches!(
            literal_to_storage(&LiteralValue::Int(1), &name),
            Err(DbError::TypeMismatch { .. })
        ));
        assert_eq!(
            literal_to_storage(&LiteralValue::String("abc".into()), &name).unwrap(),
            "abc"
        );
        assert!(matches!(
            literal_to_storage(&LiteralValue::String("abcd".into()), &name),
            Err(DbError::ValueTooLong { max: 3, .. })
        ));
        let long = "x".repeat(10_000);
        assert_eq!(
            literal_to_storage(&LiteralValue::String(long.clone()), &any).unwrap(),
            long
        );
    }

    #[test]
    fn varchar_length_counts_bytes() {
        let name = ColumnSchema::new("name", DataType::Varchar, 3);
        // 'héé' is three characters but five bytes.
        assert!(matches!(
            literal_to_storage(&LiteralValue::String("héé".into()), &name),
            Err(DbError::ValueTooLong { max: 3, .. })
        ));
        assert_eq!(
            literal_to_storage(&LiteralValue::String("hé".into()), &name).unwrap(),
            "hé"
        );
    }

    #[test]
    fn comparison_rules() {
        let one = LiteralValue::Int(1);
        let two = LiteralValue::Int(2);
        let a = LiteralValue::String("a".into());
        let b = LiteralValue::String("b".into());

        assert!(compare(ComparisonOp::Less, &one, &two).unwrap());
        assert!(compare(ComparisonOp::GreaterOrEqual, &two, &two).unwrap());
        assert!(!compare(ComparisonOp::LessOrEqual, &two, &one).unwrap());
        assert!(compare(ComparisonOp::NotEqual, &a, &b).unwrap());
        assert!(compare(ComparisonOp::Equal, &a, &a).unwrap());

        assert!(matches!(
            compare(ComparisonOp::Equal, &one, &a),
            Err(DbError::Incomparable { .. })
        ));
        assert!(matches!(
            compare(ComparisonOp::Less, &a, &b),
            Err(DbError::NonIntOperands { .. })
        ));
    }

    #[test]
    fn condition_over_bindings() {
        let t = table(
            "t",
            "t",
            &[("a", DataType::Int), ("b", DataType::Varchar)],
            &[&["5", "x"]],
        );
        let bindings = [Binding {
            table: &t,
            row: &t.rows[0],
        }];

        let cond = Expr::And(vec![
            Expr::Comparison {
                op: ComparisonOp::Greater,
                left: col(None, "a"),
                right: int(3),
            },
            Expr::Comparison {
                op: ComparisonOp::Equal,
                left: col(Some("t"), "b"),
                right: Box::new(Expr::Literal(LiteralValue::String("x".into()))),
            },
        ]);
        assert!(evaluate_condition(&cond, &bindings).unwrap());

        let cond = Expr::Comparison {
            op: ComparisonOp::Less,
            left: col(None, "a"),
            right: int(5),
        };
        assert!(!evaluate_condition(&cond, &bindings).unwrap());
    }

    #[test]
    fn and_short_circuits_on_false() {
        let t = table("t", "t", &[("a", DataType::Int)], &[&["1"]]);
        let bindings = [Binding {
            table: &t,
            row: &t.rows[0],
        }];
        let cond = Expr::And(vec![
            Expr::Comparison {
                op: ComparisonOp::Equal,
                left: col(None, "a"),
                right: int(2),
            },
            Expr::Comparison {
                op: ComparisonOp::Equal,
                left: col(None, "missing"),
                right: int(2),
            },
        ]);
        assert!(!evaluate_condition(&cond, &bindings).unwrap());
    }
}
