//! Source file spans and locations

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Default, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[display("file#{_0}")]
pub struct FileId(pub u32);

impl FileId {
    /// Creates a file id from its raw index
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A byte offset span in a source file
#[derive(Copy, Clone, Debug, Default, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[display("{start}..{end}")]
pub struct Span {
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl Span {
    /// Creates a span covering `start..end`
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// A span with associated file
#[derive(Copy, Clone, Debug, Default, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[display("{file}@{span}")]
pub struct FileSpan {
    /// File the span points into
    pub file: FileId,
    /// Byte range inside the file
    pub span: Span,
}

impl FileSpan {
    /// Creates a span inside `file`
    pub fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let file_span = FileSpan::new(FileId::new(3), Span::new(2, 9));
        assert_eq!(file_span.to_string(), "file#3@2..9");
        assert_eq!(Span::default().to_string(), "0..0");
    }
}
