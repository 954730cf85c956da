//! Column type system for minidb.
//!
//! Only two column types exist: `INT` (signed 64-bit integers) and
//! `VARCHAR(n)` (text with an optional maximum length). Stored cells are
//! always plain text; the declared type decides how a cell is read back and
//! which literals may be written into it.

use std::fmt;
use std::str::FromStr;

use crate::error::DbError;

/// The declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Varchar,
}

impl DataType {
    /// Length recorded for a column when no explicit `(n)` is given.
    ///
    /// `INT` records the platform int width; `VARCHAR` defaults to 255
    /// characters. A `VARCHAR` length of zero means unlimited.
    pub fn default_length(self) -> usize {
        match self {
            DataType::Int => std::mem::size_of::<i32>(),
            DataType::Varchar => 255,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Varchar => write!(f, "VARCHAR"),
        }
    }
}

impl FromStr for DataType {
    type Err = DbError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_uppercase().as_str() {
            "INT" => Ok(DataType::Int),
            "VARCHAR" => Ok(DataType::Varchar),
            _ => Err(DbError::Syntax(format!("unsupported column type: {name}"))),
        }
    }
}
