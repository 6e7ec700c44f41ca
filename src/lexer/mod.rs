//! Lexer for Tiny BASIC source.
//!
//! The lexer consumes the source one line at a time and never aborts: every
//! lexical problem is reported to the [`ErrorReporter`] and scanning resumes,
//! so a single pass surfaces as many independent errors as possible.
mod token;
mod tokens;

pub use self::token::*;
pub use self::tokens::*;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::{ErrorCategory, ErrorReporter};

macro_rules! terminal {
    ($map:ident, $name:ident, $value:expr) => {
        $map.insert($value, TokenKind::$name);
    };
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();

    terminal!(m, Label, "LABEL");
    terminal!(m, Goto, "GOTO");
    terminal!(m, Print, "PRINT");
    terminal!(m, Input, "INPUT");
    terminal!(m, Let, "LET");
    terminal!(m, If, "IF");
    terminal!(m, Then, "THEN");
    terminal!(m, Else, "ELSE");
    terminal!(m, EndIf, "ENDIF");
    terminal!(m, While, "WHILE");
    terminal!(m, Repeat, "REPEAT");
    terminal!(m, EndWhile, "ENDWHILE");

    m
});

static OPERATORS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();

    terminal!(m, Plus, "+");
    terminal!(m, Minus, "-");
    terminal!(m, Mult, "*");
    terminal!(m, Div, "/");
    terminal!(m, Gt, ">");
    terminal!(m, Lt, "<");
    terminal!(m, Gte, ">=");
    terminal!(m, Lte, "<=");
    terminal!(m, Eq, "=");
    terminal!(m, EqEq, "==");
    terminal!(m, NotEq, "!=");
    terminal!(m, Not, "!");
    terminal!(m, And, "&&");
    terminal!(m, Or, "||");

    m
});

const ESCAPE_CHAR: u8 = b'\\';

fn is_whitespace_char(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0c | 0x0b)
}

fn is_operator_char(c: u8) -> bool {
    matches!(
        c,
        b'+' | b'-' | b'*' | b'/' | b'>' | b'<' | b'=' | b'!' | b'&' | b'|'
    )
}

fn is_string_delim(c: u8) -> bool {
    matches!(c, b'\'' | b'"')
}

fn is_word_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Replace recognized escape pairs with their literal character. Unknown
/// escapes keep the backslash intact; a trailing lone backslash is copied
/// as-is. Idempotent on inputs without backslashes.
pub fn clean_escape_sequences(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            cleaned.push(c);
            continue;
        }
        match chars.next() {
            None => cleaned.push('\\'),
            Some(escaped) => match escape_replacement(escaped) {
                Some(replacement) => cleaned.push(replacement),
                None => {
                    cleaned.push('\\');
                    cleaned.push(escaped);
                }
            },
        }
    }
    cleaned
}

fn escape_replacement(c: char) -> Option<char> {
    match c {
        '"' => Some('"'),
        '\'' => Some('\''),
        '\\' => Some('\\'),
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'b' => Some('\u{0008}'),
        'f' => Some('\u{000c}'),
        'v' => Some('\u{000b}'),
        '0' => Some('\0'),
        _ => None,
    }
}

#[derive(Debug)]
pub struct Lexer<'a> {
    filename: &'a str,
    tokens: TokenStream,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &'a str) -> Self {
        Self {
            filename,
            tokens: TokenStream::default(),
        }
    }

    pub fn lex(mut self, source: &str, reporter: &mut ErrorReporter) -> TokenStream {
        for (index, line) in source.lines().enumerate() {
            self.lex_line(line, index + 1, reporter);
        }
        self.tokens
    }

    fn lex_line(&mut self, line: &str, line_number: usize, reporter: &mut ErrorReporter) {
        let bytes = line.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let location = (line_number, pos + 1);
            let c = bytes[pos];
            // Eat whitespace
            if is_whitespace_char(c) {
                while pos < bytes.len() && is_whitespace_char(bytes[pos]) {
                    pos += 1;
                }
                continue;
            }
            // Start of a string literal
            if is_string_delim(c) {
                pos = self.lex_string(line, pos, line_number, reporter);
                continue;
            }
            // Single or multi character operator, matched against the
            // maximal run of operator characters
            if is_operator_char(c) {
                let mut end = pos;
                while end < bytes.len() && is_operator_char(bytes[end]) {
                    end += 1;
                }
                let run = &line[pos..end];
                match OPERATORS.get(run) {
                    Some(kind) => self.tokens.push(Token::simple(*kind, location)),
                    None => {
                        reporter.add(
                            ErrorCategory::Lexical,
                            self.filename,
                            location,
                            format!("unknown operator \"{run}\""),
                        );
                        self.tokens.push(Token::simple(TokenKind::Unknown, location));
                    }
                }
                pos = end;
                continue;
            }
            // Number
            if c.is_ascii_digit() {
                let mut end = pos;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                let run = &line[pos..end];
                if run.parse::<i64>().is_ok() {
                    self.tokens.push(Token::new(TokenKind::Number, run, location));
                } else {
                    reporter.add(
                        ErrorCategory::Lexical,
                        self.filename,
                        location,
                        format!("number {run} does not fit into a 64-bit signed integer"),
                    );
                    self.tokens.push(Token::simple(TokenKind::Unknown, location));
                }
                pos = end;
                continue;
            }
            // Keyword or identifier
            if c.is_ascii_alphabetic() {
                let mut end = pos;
                while end < bytes.len() && is_word_char(bytes[end]) {
                    end += 1;
                }
                let word = &line[pos..end];
                match KEYWORDS.get(word) {
                    Some(kind) => self.tokens.push(Token::simple(*kind, location)),
                    None => self.tokens.push(Token::new(TokenKind::Ident, word, location)),
                }
                pos = end;
                continue;
            }
            // Nothing matched; report the byte and move on
            reporter.add(
                ErrorCategory::Lexical,
                self.filename,
                location,
                format!(
                    "invalid character \"{}\" (hex code {:02X}); only basic ASCII is accepted",
                    c as char, c
                ),
            );
            self.tokens.push(Token::simple(TokenKind::Unknown, location));
            pos += 1;
        }
    }

    /// Scan a string literal starting at the opening delimiter. Returns the
    /// byte position scanning should resume at. A backslash immediately
    /// before the closing delimiter escapes it; the full escape set is
    /// cleaned in a second pass over the raw text.
    fn lex_string(
        &mut self,
        line: &str,
        delim_pos: usize,
        line_number: usize,
        reporter: &mut ErrorReporter,
    ) -> usize {
        let bytes = line.as_bytes();
        let delim = bytes[delim_pos];
        let start = delim_pos + 1;
        let location = (line_number, start + 1);

        let mut current = start;
        loop {
            while current < bytes.len() && bytes[current] != delim {
                current += 1;
            }
            if current >= bytes.len() {
                let message = if start == bytes.len() {
                    format!(
                        "unterminated empty string; remove the dangling delimiter ({}) at the end of the line",
                        delim as char
                    )
                } else {
                    format!(
                        "unterminated string \"{}\"; end the string with the delimiter {}",
                        &line[start..],
                        delim as char
                    )
                };
                reporter.add(ErrorCategory::Lexical, self.filename, location, message);
                self.tokens.push(Token::simple(TokenKind::Unknown, location));
                return bytes.len();
            }
            // Escaped delimiter, keep scanning
            if current > start && bytes[current - 1] == ESCAPE_CHAR {
                current += 1;
                continue;
            }
            break;
        }

        let cleaned = clean_escape_sequences(&line[start..current]);
        self.tokens.push(Token::new(TokenKind::Str, cleaned, location));
        current + 1
    }
}
