//! Statement runner for the `minidb` binary.
//!
//! The shell turns a stream of lines into complete statements (split on `;`,
//! with `--` comments removed) and feeds them to a [`Database`] one at a
//! time. A failing statement prints `Error: <message>` and the stream
//! carries on. Three front-ends share this machinery: the interactive REPL,
//! script execution, and watch mode, which re-runs a script file each time
//! ENTER is pressed.
//!
//! All I/O goes through `BufRead`/`Write` so every mode can be driven from
//! tests.

use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::Database;

pub const PROMPT: &str = "minidb> ";
pub const CONTINUATION_PROMPT: &str = "    -> ";

const HELP_TEXT: &str = "\
.help              Show this help
.tables            List all tables
.exit, .quit       Exit this program
Statements end with ';' and may span several lines. '--' starts a comment.";

// ---------------------------------------------------------------------------
// Statement splitting
// ---------------------------------------------------------------------------

/// Accumulates input lines and yields complete `;`-terminated statements.
///
/// Semicolons and `--` inside single-quoted strings are kept as text.
#[derive(Debug, Default)]
pub struct StatementSplitter {
    buffer: String,
    in_string: bool,
}

impl StatementSplitter {
    pub fn new() -> Self {
        StatementSplitter::default()
    }

    /// Feed one line and return every statement it completes, trimmed and
    /// without the terminating `;`.
    pub fn push_line(&mut self, line: &str) -> Vec<String> {
        let mut statements = Vec::new();
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if self.in_string {
                self.buffer.push(c);
                if c == '\'' {
                    self.in_string = false;
                }
                continue;
            }
            match c {
                '\'' => {
                    self.in_string = true;
                    self.buffer.push(c);
                }
                '-' if chars.peek() == Some(&'-') => break,
                ';' => {
                    let stmt = self.buffer.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    self.buffer.clear();
                }
                _ => self.buffer.push(c),
            }
        }

        self.buffer.push(if self.in_string { '\n' } else { ' ' });
        statements
    }

    /// True while an unterminated statement is buffered.
    pub fn is_pending(&self) -> bool {
        self.in_string || !self.buffer.trim().is_empty()
    }

    /// Take whatever unterminated text is left, if any.
    pub fn take_remainder(&mut self) -> Option<String> {
        let rest = self.buffer.trim().to_string();
        self.buffer.clear();
        self.in_string = false;
        (!rest.is_empty()).then_some(rest)
    }
}

// ---------------------------------------------------------------------------
// Line ranges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineRangeError {
    #[error("line range must use '-' or ':' delimiter")]
    MissingDelimiter,
    #[error("line range requires start and end values")]
    MissingBound,
    #[error("invalid line number: {0}")]
    InvalidNumber(String),
    #[error("line numbers start at 1")]
    Zero,
    #[error("line range end must be >= start")]
    Reversed,
    #[error("line range starts beyond end of file ({0} lines)")]
    BeyondEnd(usize),
}

/// An inclusive, 1-based range of script lines: `start-end` or `start:end`.
///
/// Always satisfies `1 <= start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Result<Self, LineRangeError> {
        if start == 0 || end == 0 {
            return Err(LineRangeError::Zero);
        }
        if end < start {
            return Err(LineRangeError::Reversed);
        }
        Ok(LineRange { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Extract the selected lines from `text`, each followed by a newline.
    pub fn select(&self, text: &str) -> Result<String, LineRangeError> {
        let total = text.lines().count();
        if total < self.start {
            return Err(LineRangeError::BeyondEnd(total));
        }
        let mut selected = String::new();
        for line in text.lines().skip(self.start - 1).take(self.end - self.start + 1) {
            selected.push_str(line);
            selected.push('\n');
        }
        Ok(selected)
    }
}

impl FromStr for LineRange {
    type Err = LineRangeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (start, end) = text
            .split_once('-')
            .or_else(|| text.split_once(':'))
            .ok_or(LineRangeError::MissingDelimiter)?;
        let (start, end) = (start.trim(), end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(LineRangeError::MissingBound);
        }

        let parse = |s: &str| {
            s.parse::<usize>()
                .map_err(|_| LineRangeError::InvalidNumber(s.to_string()))
        };
        LineRange::new(parse(start)?, parse(end)?)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// Counts reported after a script run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Drives a [`Database`] from line-oriented input.
pub struct Shell {
    db: Database,
}

impl Shell {
    pub fn new(db: Database) -> Self {
        Shell { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Execute one statement and print its result or error.
    ///
    /// Returns whether the statement succeeded.
    pub fn run_statement<W: Write>(&mut self, sql: &str, out: &mut W) -> io::Result<bool> {
        match self.db.execute(sql) {
            Ok(result) => {
                if !result.is_empty() {
                    writeln!(out, "{result}")?;
                }
                Ok(true)
            }
            Err(e) => {
                tracing::debug!(error = %e, category = ?e.category(), "statement failed");
                writeln!(out, "Error: {e}")?;
                Ok(false)
            }
        }
    }

    /// Run every statement in `input`.
    ///
    /// An unterminated tail is reported and counted as a failure.
    pub fn run_script<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
    ) -> io::Result<ScriptSummary> {
        let mut splitter = StatementSplitter::new();
        let mut summary = ScriptSummary::default();

        for line in input.lines() {
            for stmt in splitter.push_line(&line?) {
                summary.executed += 1;
                if !self.run_statement(&stmt, out)? {
                    summary.failed += 1;
                }
            }
        }

        if splitter.take_remainder().is_some() {
            writeln!(out, "Error: script ended without terminating ';'")?;
            summary.failed += 1;
        }
        tracing::info!(
            executed = summary.executed,
            failed = summary.failed,
            "script finished"
        );
        Ok(summary)
    }

    /// Interactive read-eval-print loop. Returns on `.exit`, `.quit`,
    /// `exit;` or end of input.
    pub fn run_interactive<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        let mut splitter = StatementSplitter::new();
        write!(out, "{PROMPT}")?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();

            if !splitter.is_pending() {
                if matches!(trimmed, ".exit" | ".quit" | "exit;") {
                    break;
                }
                if trimmed.starts_with('.') {
                    self.dot_command(trimmed, out)?;
                    write!(out, "{PROMPT}")?;
                    out.flush()?;
                    continue;
                }
            }

            for stmt in splitter.push_line(&line) {
                self.run_statement(&stmt, out)?;
            }

            let prompt = if splitter.is_pending() {
                CONTINUATION_PROMPT
            } else {
                PROMPT
            };
            write!(out, "{prompt}")?;
            out.flush()?;
        }

        writeln!(out, "Bye!")?;
        Ok(())
    }

    fn dot_command<W: Write>(&self, cmd: &str, out: &mut W) -> io::Result<()> {
        match cmd {
            ".help" => writeln!(out, "{HELP_TEXT}"),
            ".tables" => {
                let names = self.db.table_names();
                if names.is_empty() {
                    writeln!(out, "(no tables)")
                } else {
                    writeln!(out, "{}", names.join("\n"))
                }
            }
            other => writeln!(out, "Error: unknown command: {other}"),
        }
    }

    /// Re-run the script at `path` every time a line is read from `input`.
    ///
    /// `exit`, `.exit` or `quit` (or end of input) leaves. Returns the
    /// number of executions.
    pub fn run_watch<R: BufRead, W: Write>(
        &mut self,
        path: &Path,
        input: R,
        out: &mut W,
    ) -> io::Result<usize> {
        writeln!(out, "=== Watch Mode ===")?;
        writeln!(out, "Monitoring: {}", path.display())?;
        writeln!(
            out,
            "Press ENTER to execute the file, or type 'exit' and press ENTER to quit."
        )?;

        let mut executions = 0;
        let mut lines = input.lines();
        loop {
            write!(out, "\n[Press ENTER to run] ")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            if matches!(line?.trim(), "exit" | ".exit" | "quit") {
                break;
            }

            executions += 1;
            writeln!(out, "\n--- Execution #{executions} ---")?;
            match fs::read_to_string(path) {
                Ok(text) => {
                    self.run_script(text.as_bytes(), out)?;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read watched file");
                    writeln!(out, "Error: cannot open file {}: {e}", path.display())?;
                }
            }
            writeln!(out, "--- End of execution ---")?;
        }

        writeln!(out, "Exiting watch mode. Bye!")?;
        Ok(executions)
    }
}
