//! Abstract syntax tree definitions for minidb SQL.
//!
//! Every statement parsed by the [`super::parser::Parser`] is represented as
//! a tree of the types defined here. Nodes own their children outright; a
//! tree lives exactly as long as the statement being executed.

use std::fmt;

use crate::types::DataType;

/// A top-level SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStatement),
    DropTable(DropTableStatement),
    AlterTable(AlterTableStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Select(SelectStatement),
}

impl Statement {
    /// Short statement name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::DropTable(_) => "DROP TABLE",
            Statement::AlterTable(_) => "ALTER TABLE",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::Select(_) => "SELECT",
        }
    }
}

/// A `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// A column definition inside `CREATE TABLE`, `ADD COLUMN` or `MODIFY COLUMN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    /// Declared `VARCHAR(n)` length, or the type's default length.
    pub length: usize,
}

/// A `DROP TABLE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    pub name: String,
}

/// An `ALTER TABLE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub table: String,
    pub action: AlterTableAction,
}

/// The action performed by `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    /// `RENAME TO new_name`
    RenameTo(String),
    /// `ADD COLUMN name TYPE[(n)]`
    AddColumn(ColumnDef),
    /// `DROP COLUMN name`
    DropColumn(String),
    /// `MODIFY COLUMN name TYPE[(n)]`. `column.name` always equals `target`.
    ModifyColumn { target: String, column: ColumnDef },
}

/// An `INSERT INTO t VALUES (...)` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub values: Vec<LiteralValue>,
}

/// An `UPDATE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expr>,
}

/// A single `column = literal` pair in an `UPDATE ... SET` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: LiteralValue,
}

/// A `DELETE FROM` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub where_clause: Option<Expr>,
}

/// A `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub columns: Vec<SelectItem>,
    pub from: TableReference,
    pub joins: Vec<JoinClause>,
    pub where_clause: Option<Expr>,
}

/// A single item in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A bare `*`, or a qualified `alias.*` when `table` is set.
    Wildcard { table: Option<String> },
    /// A column reference, optionally qualified and optionally aliased.
    Column {
        table: Option<String>,
        name: String,
        alias: Option<String>,
    },
}

/// A table named in `FROM` or `JOIN`, with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    pub name: String,
    pub alias: Option<String>,
}

impl TableReference {
    /// The name rows of this table are labelled with: the alias if present.
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// An inner join against `table`; the `ON` condition is mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: TableReference,
    pub condition: Expr,
}

/// A literal value as written in SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    Int(i64),
    String(String),
}

impl LiteralValue {
    /// The column type this literal naturally belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            LiteralValue::Int(_) => DataType::Int,
            LiteralValue::String(_) => DataType::Varchar,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::String(s) => write!(f, "{s}"),
        }
    }
}

/// A boolean or operand expression.
///
/// There is no disjunction and no parenthesised grouping: a condition is
/// either one comparison or a flat `And` of two or more comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference, `name` or `table.name`.
    Column { table: Option<String>, name: String },
    Literal(LiteralValue),
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl ComparisonOp {
    /// Map an operator symbol token to its operator.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(ComparisonOp::Equal),
            "<>" => Some(ComparisonOp::NotEqual),
            ">" => Some(ComparisonOp::Greater),
            "<" => Some(ComparisonOp::Less),
            ">=" => Some(ComparisonOp::GreaterOrEqual),
            "<=" => Some(ComparisonOp::LessOrEqual),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::Greater => ">",
            ComparisonOp::Less => "<",
            ComparisonOp::GreaterOrEqual => ">=",
            ComparisonOp::LessOrEqual => "<=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
