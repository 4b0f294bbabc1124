//! Source buffers
//!
//! A [`SourceBuffer`] is the whole contents of one file, loaded once and never
//! mutated afterwards. Tokens borrow their lexemes straight out of it, so the
//! buffer must outlive every token and AST built from it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Fatal errors that stop the front end before lexing begins.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not open '{}' for reading: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}' is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },
}

/// Immutable, newline-normalized file contents.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    name: Arc<str>,
    text: String,
}

impl SourceBuffer {
    /// Build a buffer from in-memory text. `name` is what diagnostics print
    /// as the file name.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            text: normalize_newlines(text.into()),
        }
    }

    /// Read a file from disk.
    ///
    /// Diagnostics use the file name only, not the full path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| SourceError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| SourceError::NotUtf8 {
            path: path.to_path_buf(),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, text))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the file name, cloned into every AST location.
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of a 1-based line without its trailing newline.
    pub fn line(&self, line: u32) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.text.split('\n').nth(line as usize - 1)
    }
}

fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_is_normalized() {
        let source = SourceBuffer::new("a.nif", "let a = 1;\r\nlet b = 2;\r\n");
        assert_eq!(source.text(), "let a = 1;\nlet b = 2;\n");
    }

    #[test]
    fn test_line_lookup() {
        let source = SourceBuffer::new("a.nif", "first\nsecond\nthird");
        assert_eq!(source.line(1), Some("first"));
        assert_eq!(source.line(3), Some("third"));
        assert_eq!(source.line(0), None);
        assert_eq!(source.line(4), None);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = SourceBuffer::load("definitely/not/here.nif").unwrap_err();
        assert!(matches!(err, SourceError::Unreadable { .. }));
        assert!(err.to_string().contains("could not open"));
    }
}
