//! Hand-written SQL tokenizer for minidb.
//!
//! The [`Lexer`] takes the text of one statement and produces a `Vec<Token>`
//! terminated by a [`TokenKind::End`] token. Keywords are not classified
//! here: every word comes out as an [`TokenKind::Identifier`] and the parser
//! decides, case-insensitively, whether it is a keyword in context.

use crate::error::{DbError, Result};

/// Broad class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `[A-Za-z_][A-Za-z0-9_]*`, keywords included.
    Identifier,
    /// A run of ASCII digits. Signs are assembled by the parser.
    Number,
    /// The contents of a single-quoted string, with `''` unescaped.
    String,
    /// Punctuation or an operator, one or two characters long.
    Symbol,
    /// End-of-input sentinel.
    End,
}

/// A single SQL token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }

    pub fn end() -> Self {
        Token::new(TokenKind::End, "")
    }

    /// True if this is an identifier spelling `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }

    /// Rendering used in syntax error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::End => "end of input".to_string(),
            TokenKind::String => format!("string '{}'", self.text),
            TokenKind::Number => format!("number {}", self.text),
            TokenKind::Identifier => format!("'{}'", self.text),
            TokenKind::Symbol => format!("'{}'", self.text),
        }
    }
}

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

/// Two-character operators, matched before single characters.
const MULTI_CHAR_SYMBOLS: [&str; 3] = ["<>", "<=", ">="];

const SINGLE_CHAR_SYMBOLS: &[u8] = b"(),.;*=<>-";

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// A hand-written SQL tokenizer.
///
/// Create one with [`Lexer::new`], then call [`Lexer::tokenize`] to obtain
/// the full token stream (terminated by [`TokenKind::End`]).
pub struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over the given SQL text.
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            input: src.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenize the entire input and return the token list.
    ///
    /// Fails only on an unterminated string literal or a character that
    /// cannot start any token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_end = tok.kind == TokenKind::End;
            tokens.push(tok);
            if is_end {
                break;
            }
        }
        tracing::trace!(count = tokens.len(), "tokenized statement");
        Ok(tokens)
    }

    // -- helpers ------------------------------------------------------------

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek().map_or(false, &pred) {
            self.pos += 1;
        }
        &src[start..self.pos]
    }

    // -- main scanner -------------------------------------------------------

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let ch = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::end()),
        };

        if ch.is_ascii_alphabetic() || ch == b'_' {
            let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
            return Ok(Token::new(TokenKind::Identifier, word));
        }

        if ch.is_ascii_digit() {
            let digits = self.take_while(|c| c.is_ascii_digit());
            return Ok(Token::new(TokenKind::Number, digits));
        }

        if ch == b'\'' {
            return self.read_string_literal();
        }

        self.read_symbol()
    }

    fn read_string_literal(&mut self) -> Result<Token> {
        self.pos += 1; // opening '
        let mut value = String::new();
        let mut segment_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(DbError::Syntax("unterminated string literal".into()));
                }
                Some(b'\'') => {
                    value.push_str(&self.src[segment_start..self.pos]);
                    self.pos += 1;
                    if self.peek() == Some(b'\'') {
                        // '' is an escaped quote
                        value.push('\'');
                        self.pos += 1;
                        segment_start = self.pos;
                    } else {
                        return Ok(Token::new(TokenKind::String, value));
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn read_symbol(&mut self) -> Result<Token> {
        let src = self.src;
        let rest = &src[self.pos..];
        for op in MULTI_CHAR_SYMBOLS {
            if rest.starts_with(op) {
                self.pos += op.len();
                return Ok(Token::new(TokenKind::Symbol, op));
            }
        }

        let ch = self.input[self.pos];
        if SINGLE_CHAR_SYMBOLS.contains(&ch) {
            self.pos += 1;
            return Ok(Token::new(TokenKind::Symbol, (ch as char).to_string()));
        }

        let bad = rest.chars().next().unwrap_or('?');
        Err(DbError::Syntax(format!("unexpected character: '{bad}'")))
    }
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    Lexer::new(src).tokenize()
}

// ===========================================================================
// Tests
// ===========================================================================
