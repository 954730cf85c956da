//! Text rendering of query results.

use std::fmt;

/// The projected output of a `SELECT`: header labels and rows of raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        ResultTable { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render as a left-aligned text table with a row-count footer.
    ///
    /// ```text
    /// s.id | s.name
    /// -----+-------
    /// 1    | Alice
    /// (1 row)
    /// ```
    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return "(no columns)".to_string();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 3);
        lines.push(render_line(&self.headers, &widths));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &self.rows {
            lines.push(render_line(row, &widths));
        }
        lines.push(match self.rows.len() {
            1 => "(1 row)".to_string(),
            n => format!("({n} rows)"),
        });
        lines.join("\n")
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn renders_padded_table() {
        let table = ResultTable::new(
            strings(&["s.id", "s.name"]),
            vec![strings(&["1", "Alice"]), strings(&["22", "Bo"])],
        );
        assert_eq!(
            table.render(),
            "s.id | s.name\n\
             -----+-------\n\
             1    | Alice \n\
             22   | Bo    \n\
             (2 rows)"
        );
    }

    #[test]
    fn widest_value_sets_column_width() {
        let table = ResultTable::new(strings(&["n"]), vec![strings(&["long value"])]);
        assert_eq!(table.render(), "n         \n----------\nlong value\n(1 row)");
    }

    #[test]
    fn empty_result_keeps_header() {
        let table = ResultTable::new(strings(&["a", "b"]), Vec::new());
        assert_eq!(table.render(), "a | b\n--+--\n(0 rows)");
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn no_columns() {
        assert_eq!(ResultTable::default().render(), "(no columns)");
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        let table = ResultTable::new(strings(&["name"]), vec![strings(&["héllo"])]);
        assert_eq!(table.to_string(), "name \n-----\nhéllo\n(1 row)");
    }
}
