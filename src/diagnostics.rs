//! Diagnostic records and terminal rendering
//!
//! Every diagnostic renders as three lines:
//!
//! ```text
//! main.nif:L3,C11: Parse error: expected ';' after expression, got identifier 'y' instead
//! 3 | let x = 1 y
//!   | ~~~~~~~~~~^
//! ```
//!
//! The underline has one `~` per column before the token and one `^` per
//! column the token covers, so it lines up under the token once the gutter is
//! accounted for. Colors are applied with `crossterm` and never change the
//! visible text.

use crate::parser::ast::SourceLocation;
use crossterm::style::Stylize;
use std::fmt::Write as _;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "Parse error",
            Severity::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
    /// Columns covered by the offending token, at least 1.
    pub length: usize,
    /// Text of the offending line, if it exists in the buffer.
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render the header, excerpt, and underline, newline-terminated.
    pub fn render(&self, colors: bool) -> String {
        let mut out = String::new();
        let label = self.severity.label();
        let label = match (colors, self.severity) {
            (false, _) => label.to_string(),
            (true, Severity::Error) => label.red().bold().to_string(),
            (true, Severity::Warning) => label.yellow().bold().to_string(),
        };
        let _ = writeln!(out, "{}: {}: {}", self.location, label, self.message);

        let Some(text) = &self.source_line else {
            return out;
        };

        let line_number = self.location.line.to_string();
        let gutter = format!("{line_number} | ");
        let blank_gutter = format!("{} | ", " ".repeat(line_number.len()));
        let marks = underline(self.location.column, self.length);

        if colors {
            let _ = writeln!(out, "{}{}", gutter.green(), text);
            let _ = writeln!(out, "{}{}", blank_gutter.green(), marks.green());
        } else {
            let _ = writeln!(out, "{gutter}{text}");
            let _ = writeln!(out, "{blank_gutter}{marks}");
        }
        out
    }
}

/// `column - 1` fill characters followed by `length` markers.
pub fn underline(column: u32, length: usize) -> String {
    let fill = column.saturating_sub(1) as usize;
    format!("{}{}", "~".repeat(fill), "^".repeat(length.max(1)))
}

/// Anything the parser can hand diagnostics to.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics for later inspection or ordered printing.
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Writes each diagnostic as soon as it is reported.
pub struct Reporter<W: Write> {
    out: W,
    colors: bool,
}

impl Reporter<io::Stderr> {
    pub fn stderr(colors: bool) -> Self {
        Self::new(io::stderr(), colors)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, colors: bool) -> Self {
        Self { out, colors }
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        self.out.write_all(diagnostic.render(self.colors).as_bytes())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for Reporter<W> {
    fn report(&mut self, diagnostic: Diagnostic) {
        // Nowhere left to report a failed write to.
        let _ = self.emit(&diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(severity: Severity) -> Diagnostic {
        Diagnostic {
            severity,
            message: "expected ';' after expression, got identifier 'foo' instead".to_string(),
            location: SourceLocation::new(Arc::from("main.nif"), 12, 5),
            length: 3,
            source_line: Some("abc foo".to_string()),
        }
    }

    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_underline_alignment() {
        assert_eq!(underline(5, 3), "~~~~^^^");
        assert_eq!(underline(1, 1), "^");
        assert_eq!(underline(3, 0), "~~^");
    }

    #[test]
    fn test_plain_render() {
        let rendered = sample(Severity::Error).render(false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines[0],
            "main.nif:L12,C5: Parse error: expected ';' after expression, got identifier 'foo' instead"
        );
        assert_eq!(lines[1], "12 | abc foo");
        assert_eq!(lines[2], "   | ~~~~^^^");
    }

    #[test]
    fn test_colors_do_not_change_text() {
        for severity in [Severity::Error, Severity::Warning] {
            let plain = sample(severity).render(false);
            let colored = sample(severity).render(true);
            assert_eq!(strip_ansi(&colored), plain);
        }
    }

    #[test]
    fn test_missing_source_line() {
        let mut diagnostic = sample(Severity::Warning);
        diagnostic.source_line = None;
        assert_eq!(diagnostic.render(false).lines().count(), 1);
    }

    #[test]
    fn test_reporter_writes() {
        let mut reporter = Reporter::new(Vec::new(), false);
        reporter.report(sample(Severity::Warning));
        let written = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(written.starts_with("main.nif:L12,C5: Warning: "));
    }
}
