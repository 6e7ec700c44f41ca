//! Diagnostic accumulation for the compiler.
//!
//! Every phase reports into the same [`ErrorReporter`]; the driver checks it
//! between phases and aborts compilation once any phase has produced errors.
use std::fmt::Display;
use std::io::{self, Write};

use colored::Colorize;

use crate::lexer::Position;

/// Upper bound on stored diagnostics. Pathological input can produce an error
/// per byte; once the cap is hit a single terminal diagnostic is recorded and
/// everything after it is dropped.
pub const MAX_DIAGNOSTICS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lexical,
    Grammar,
    Semantic,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorCategory::Lexical => "Lexical",
            ErrorCategory::Grammar => "Grammar",
            ErrorCategory::Semantic => "Semantic",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub file: String,
    pub pos: Position,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (line, col) = self.pos;
        f.write_fmt(format_args!(
            "{} In file {}:{}:{}: {} error - {}",
            "[COMPILER ERROR]".red(),
            self.file,
            line,
            col,
            self.category,
            self.message
        ))
    }
}

/// Accumulates diagnostics in insertion order. The reporter is a plain value
/// threaded through the phases; [`ErrorReporter::reset`] gives tests a clean
/// slate when running the pipeline repeatedly in one process.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    truncated: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        category: ErrorCategory,
        file: &str,
        pos: Position,
        message: impl Into<String>,
    ) {
        if self.truncated {
            return;
        }
        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.truncated = true;
            self.diagnostics.push(Diagnostic {
                category,
                file: file.to_owned(),
                pos,
                message: "too many errors, further diagnostics suppressed".to_owned(),
            });
            return;
        }
        self.diagnostics.push(Diagnostic {
            category,
            file: file.to_owned(),
            pos,
            message: message.into(),
        });
    }

    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Print all diagnostics, in insertion order, to the given stream.
    pub fn print_all(&self, out: &mut impl Write) -> io::Result<()> {
        for diagnostic in &self.diagnostics {
            writeln!(out, "{diagnostic}\n")?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.diagnostics.clear();
        self.truncated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_after_reset_is_zero() {
        let mut reporter = ErrorReporter::new();
        reporter.add(ErrorCategory::Lexical, "test.teeny", (1, 1), "bad char");
        reporter.add(ErrorCategory::Grammar, "test.teeny", (2, 5), "bad token");
        assert_eq!(2, reporter.count());

        reporter.reset();
        assert_eq!(0, reporter.count());
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut reporter = ErrorReporter::new();
        reporter.add(ErrorCategory::Lexical, "a", (1, 1), "first");
        reporter.add(ErrorCategory::Semantic, "a", (1, 2), "second");

        let messages = reporter
            .iter()
            .map(|d| d.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["first", "second"], messages);
    }

    #[test]
    fn test_diagnostic_format() {
        let diagnostic = Diagnostic {
            category: ErrorCategory::Semantic,
            file: "prog.teeny".to_owned(),
            pos: (3, 7),
            message: "label nowhere does not exist".to_owned(),
        };

        let rendered = format!("{diagnostic}");
        assert!(rendered.contains("[COMPILER ERROR]"));
        assert!(rendered.contains("In file prog.teeny:3:7:"));
        assert!(rendered.contains("Semantic error - label nowhere does not exist"));
    }

    #[test]
    fn test_cap_appends_terminal_diagnostic() {
        let mut reporter = ErrorReporter::new();
        for _ in 0..MAX_DIAGNOSTICS + 50 {
            reporter.add(ErrorCategory::Lexical, "x", (1, 1), "boom");
        }

        assert_eq!(MAX_DIAGNOSTICS + 1, reporter.count());
        let last = reporter.iter().last().unwrap();
        assert!(last.message.contains("too many errors"));
    }
}
