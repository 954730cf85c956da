//! Recursive-descent SQL parser for minidb.
//!
//! The entry point is [`Parser::parse`], which takes the text of exactly one
//! statement (an optional trailing `;` is tolerated), tokenizes it, and
//! dispatches on the leading keyword to one of seven statement parsers.
//! Every statement parser finishes with [`Parser::ensure_end`], so trailing
//! tokens are always a syntax error.

use crate::error::{DbError, Result};
use crate::sql::ast::*;
use crate::sql::lexer::{Lexer, Token, TokenKind};
use crate::types::DataType;

/// Words that can never be taken as an implicit table or column alias.
const RESERVED_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INNER", "JOIN", "LEFT", "ON", "AS", "AND", "OR", "INSERT", "INTO",
    "VALUES", "UPDATE", "SET", "DELETE", "CREATE", "TABLE", "DROP", "ALTER", "DISTINCT",
];

static END_TOKEN: Token = Token {
    kind: TokenKind::End,
    text: String::new(),
};

/// True if `word` is reserved, ignoring case.
pub fn is_reserved_keyword(word: &str) -> bool {
    RESERVED_KEYWORDS
        .iter()
        .any(|kw| kw.eq_ignore_ascii_case(word))
}

/// A recursive-descent parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse the text of a single SQL statement.
    pub fn parse(sql: &str) -> Result<Statement> {
        let mut text = sql.trim();
        if text.is_empty() {
            return Err(DbError::Syntax("empty statement".into()));
        }
        if let Some(stripped) = text.strip_suffix(';') {
            text = stripped.trim();
        }

        let tokens = Lexer::new(text).tokenize()?;
        let mut parser = Parser { tokens, pos: 0 };
        let stmt = parser.parse_statement()?;
        tracing::trace!(?stmt, "parsed statement");
        Ok(stmt)
    }

    // =======================================================================
    // Token helpers
    // =======================================================================

    fn peek(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&END_TOKEN)
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, expected: &str) -> DbError {
        DbError::Syntax(format!(
            "expected {expected}, found {}",
            self.current().describe()
        ))
    }

    fn match_symbol(&mut self, symbol: &str) -> bool {
        if self.current().is_symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<()> {
        if self.match_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error(&format!("'{symbol}'")))
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.current().is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("keyword '{keyword}'")))
        }
    }

    /// Consume an identifier; `what` names it in the error message.
    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        if self.current().kind == TokenKind::Identifier {
            Ok(self.advance().text)
        } else {
            Err(self.error(what))
        }
    }

    fn expect_number(&mut self, what: &str) -> Result<String> {
        if self.current().kind == TokenKind::Number {
            Ok(self.advance().text)
        } else {
            Err(self.error(what))
        }
    }

    /// True if the current token could serve as an implicit alias.
    fn at_implicit_alias(&self) -> bool {
        let tok = self.current();
        tok.kind == TokenKind::Identifier && !is_reserved_keyword(&tok.text)
    }

    fn ensure_end(&self) -> Result<()> {
        if self.current().kind == TokenKind::End {
            Ok(())
        } else {
            Err(DbError::Syntax(format!(
                "unexpected trailing token {}",
                self.current().describe()
            )))
        }
    }

    // =======================================================================
    // Statement dispatch
    // =======================================================================

    fn parse_statement(&mut self) -> Result<Statement> {
        let first = self.current();
        if first.kind != TokenKind::Identifier {
            return Err(self.error("a statement keyword"));
        }
        match first.text.to_ascii_uppercase().as_str() {
            "CREATE" => self.parse_create_table(),
            "DROP" => self.parse_drop_table(),
            "ALTER" => self.parse_alter_table(),
            "INSERT" => self.parse_insert(),
            "UPDATE" => self.parse_update(),
            "DELETE" => self.parse_delete(),
            "SELECT" => self.parse_select(),
            other => Err(DbError::Syntax(format!("unsupported statement: {other}"))),
        }
    }

    // =======================================================================
    // DDL
    // =======================================================================

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        let name = self.expect_identifier("table name")?;
        self.expect_symbol("(")?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);
            if self.match_symbol(")") {
                break;
            }
            self.expect_symbol(",")?;
        }

        self.ensure_end()?;
        Ok(Statement::CreateTable(CreateTableStatement { name, columns }))
    }

    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;
        let name = self.expect_identifier("table name")?;
        self.ensure_end()?;
        Ok(Statement::DropTable(DropTableStatement { name }))
    }

    fn parse_alter_table(&mut self) -> Result<Statement> {
        self.expect_keyword("ALTER")?;
        self.expect_keyword("TABLE")?;
        let table = self.expect_identifier("table name")?;

        let action = if self.match_keyword("RENAME") {
            self.expect_keyword("TO")?;
            AlterTableAction::RenameTo(self.expect_identifier("new table name")?)
        } else if self.match_keyword("ADD") {
            self.expect_keyword("COLUMN")?;
            AlterTableAction::AddColumn(self.parse_column_def()?)
        } else if self.match_keyword("DROP") {
            self.expect_keyword("COLUMN")?;
            AlterTableAction::DropColumn(self.expect_identifier("column name")?)
        } else if self.match_keyword("MODIFY") {
            self.expect_keyword("COLUMN")?;
            let target = self.expect_identifier("column name")?;
            let column = self.parse_column_type(target.clone())?;
            AlterTableAction::ModifyColumn { target, column }
        } else {
            return Err(self.error("RENAME, ADD, DROP or MODIFY"));
        };

        self.ensure_end()?;
        Ok(Statement::AlterTable(AlterTableStatement { table, action }))
    }

    /// `name TYPE [ (length) ]`
    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier("column name")?;
        self.parse_column_type(name)
    }

    /// The type tail of a column definition. Only VARCHAR takes a length.
    fn parse_column_type(&mut self, name: String) -> Result<ColumnDef> {
        let type_name = self.expect_identifier("column type")?;
        let data_type: DataType = type_name.parse()?;

        let length = match data_type {
            DataType::Varchar if self.match_symbol("(") => {
                let digits = self.expect_number("VARCHAR length")?;
                self.expect_symbol(")")?;
                digits
                    .parse::<usize>()
                    .map_err(|_| DbError::Syntax(format!("invalid VARCHAR length: {digits}")))?
            }
            _ => data_type.default_length(),
        };

        Ok(ColumnDef {
            name,
            data_type,
            length,
        })
    }

    // =======================================================================
    // DML
    // =======================================================================

    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.expect_identifier("table name")?;
        self.expect_keyword("VALUES")?;
        self.expect_symbol("(")?;

        let mut values = vec![self.parse_literal()?];
        while self.match_symbol(",") {
            values.push(self.parse_literal()?);
        }
        self.expect_symbol(")")?;

        self.ensure_end()?;
        Ok(Statement::Insert(InsertStatement { table, values }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.expect_keyword("UPDATE")?;
        let table = self.expect_identifier("table name")?;
        self.expect_keyword("SET")?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier("column name")?;
            self.expect_symbol("=")?;
            let value = self.parse_literal()?;
            assignments.push(Assignment { column, value });
            if !self.match_symbol(",") {
                break;
            }
        }

        let where_clause = self.parse_optional_where()?;
        self.ensure_end()?;
        Ok(Statement::Update(UpdateStatement {
            table,
            assignments,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.expect_identifier("table name")?;
        let where_clause = self.parse_optional_where()?;
        self.ensure_end()?;
        Ok(Statement::Delete(DeleteStatement {
            table,
            where_clause,
        }))
    }

    // =======================================================================
    // SELECT
    // =======================================================================

    fn parse_select(&mut self) -> Result<Statement> {
        self.expect_keyword("SELECT")?;
        if self.current().is_keyword("DISTINCT") {
            return Err(DbError::Syntax("DISTINCT is not supported".into()));
        }

        let mut columns = vec![self.parse_select_item()?];
        while self.match_symbol(",") {
            columns.push(self.parse_select_item()?);
        }

        self.expect_keyword("FROM")?;
        let from = self.parse_table_reference()?;

        let mut joins = Vec::new();
        loop {
            if self.match_keyword("INNER") {
                self.expect_keyword("JOIN")?;
            } else if self.current().is_keyword("LEFT") {
                return Err(DbError::Syntax("LEFT JOIN is not supported".into()));
            } else if !self.match_keyword("JOIN") {
                break;
            }
            let table = self.parse_table_reference()?;
            self.expect_keyword("ON")?;
            let condition = self.parse_condition()?;
            joins.push(JoinClause { table, condition });
        }

        let where_clause = self.parse_optional_where()?;
        self.ensure_end()?;
        Ok(Statement::Select(SelectStatement {
            columns,
            from,
            joins,
            where_clause,
        }))
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.match_symbol("*") {
            return Ok(SelectItem::Wildcard { table: None });
        }

        // alias.*
        if self.current().kind == TokenKind::Identifier
            && self.peek(1).is_symbol(".")
            && self.peek(2).is_symbol("*")
        {
            let table = self.advance().text;
            self.pos += 2;
            return Ok(SelectItem::Wildcard { table: Some(table) });
        }

        let (table, name) = match self.parse_operand()? {
            Expr::Column { table, name } => (table, name),
            _ => {
                return Err(DbError::Syntax(
                    "SELECT list only supports column references".into(),
                ))
            }
        };

        let alias = if self.match_keyword("AS") {
            Some(self.expect_identifier("column alias")?)
        } else if self.at_implicit_alias() {
            Some(self.advance().text)
        } else {
            None
        };

        Ok(SelectItem::Column { table, name, alias })
    }

    /// `name [AS alias | alias]`
    fn parse_table_reference(&mut self) -> Result<TableReference> {
        let name = self.expect_identifier("table name")?;
        let alias = if self.match_keyword("AS") {
            Some(self.expect_identifier("table alias")?)
        } else if self.at_implicit_alias() {
            Some(self.advance().text)
        } else {
            None
        };
        Ok(TableReference { name, alias })
    }

    // =======================================================================
    // Conditions and operands
    // =======================================================================

    fn parse_optional_where(&mut self) -> Result<Option<Expr>> {
        if self.match_keyword("WHERE") {
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    /// `comparison (AND comparison)*`, flattened into a single `And`.
    fn parse_condition(&mut self) -> Result<Expr> {
        let first = self.parse_comparison()?;
        if !self.current().is_keyword("AND") {
            return Ok(first);
        }

        let mut terms = vec![first];
        while self.match_keyword("AND") {
            terms.push(self.parse_comparison()?);
        }
        Ok(Expr::And(terms))
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_operand()?;

        let tok = self.current();
        let op = match tok.kind {
            TokenKind::Symbol => ComparisonOp::from_symbol(&tok.text),
            _ => None,
        }
        .ok_or_else(|| self.error("comparison operator"))?;
        self.advance();

        let right = self.parse_operand()?;
        Ok(Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// A literal, or a column reference `name` / `table.name`.
    fn parse_operand(&mut self) -> Result<Expr> {
        let tok = self.current();
        let starts_literal = matches!(tok.kind, TokenKind::String | TokenKind::Number)
            || (tok.is_symbol("-") && self.peek(1).kind == TokenKind::Number);
        if starts_literal {
            return Ok(Expr::Literal(self.parse_literal()?));
        }

        if tok.kind != TokenKind::Identifier {
            return Err(self.error("column reference or literal"));
        }

        let first = self.advance().text;
        if self.match_symbol(".") {
            let name = self.expect_identifier("column name")?;
            Ok(Expr::Column {
                table: Some(first),
                name,
            })
        } else {
            Ok(Expr::Column {
                table: None,
                name: first,
            })
        }
    }

    /// A string, a number, or `-` immediately followed by a number.
    fn parse_literal(&mut self) -> Result<LiteralValue> {
        let tok = self.current();
        match tok.kind {
            TokenKind::String => Ok(LiteralValue::String(self.advance().text)),
            TokenKind::Number => {
                let digits = self.advance().text;
                parse_int(&digits)
            }
            TokenKind::Symbol if tok.is_symbol("-") && self.peek(1).kind == TokenKind::Number => {
                self.advance();
                let digits = self.advance().text;
                parse_int(&format!("-{digits}"))
            }
            _ => Err(self.error("literal value")),
        }
    }
}

fn parse_int(text: &str) -> Result<LiteralValue> {
    text.parse::<i64>()
        .map(LiteralValue::Int)
        .map_err(|_| DbError::Syntax(format!("invalid INT literal: {text}")))
}

// ===========================================================================
// Tests
// ===========================================================================
