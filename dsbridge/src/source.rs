//! Types related to locations in loaded documents.

use codespan_reporting::diagnostic::Label;
use std::fmt;
use std::ops::Range;

/// File id assigned by the driver's file database.
pub type FileId = usize;

/// Byte offsets into source documents.
pub type BytePos = u32;

/// A byte range in a loaded document.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    file_id: FileId,
    start: BytePos,
    end: BytePos,
}

impl ByteRange {
    pub const fn new(file_id: FileId, start: BytePos, end: BytePos) -> ByteRange {
        ByteRange {
            file_id,
            start,
            end,
        }
    }

    pub const fn file_id(&self) -> FileId {
        self.file_id
    }

    pub const fn start(&self) -> BytePos {
        self.start
    }

    pub const fn end(&self) -> BytePos {
        self.end
    }

    /// Merge two ranges in the same file into one covering both.
    pub fn merge(&self, other: &ByteRange) -> ByteRange {
        debug_assert_eq!(self.file_id, other.file_id);
        ByteRange::new(
            self.file_id,
            self.start.min(other.start),
            self.end.max(other.end),
        )
    }

    pub fn primary(&self) -> Label<FileId> {
        Label::primary(self.file_id, *self)
    }

    pub fn secondary(&self) -> Label<FileId> {
        Label::secondary(self.file_id, *self)
    }
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteRange({}, {}..{})", self.file_id, self.start, self.end)
    }
}

impl From<ByteRange> for Range<usize> {
    fn from(range: ByteRange) -> Range<usize> {
        (range.start as usize)..(range.end as usize)
    }
}

/// An optional location: nodes created by the compiler rather than the
/// parser carry no range.
#[derive(Debug, Copy, Clone)]
pub enum Span {
    Range(ByteRange),
    Empty,
}

impl Span {
    pub fn range(&self) -> Option<ByteRange> {
        match self {
            Span::Range(range) => Some(*range),
            Span::Empty => None,
        }
    }

    pub fn merge(&self, other: &Span) -> Span {
        match (self, other) {
            (Span::Range(a), Span::Range(b)) => Span::Range(a.merge(b)),
            (_, _) => Span::Empty,
        }
    }

    /// A primary label when the span has a range, nothing otherwise.
    pub fn primary(&self) -> Option<Label<FileId>> {
        self.range().map(|range| range.primary())
    }
}

impl From<ByteRange> for Span {
    fn from(range: ByteRange) -> Span {
        Span::Range(range)
    }
}

impl From<Option<ByteRange>> for Span {
    fn from(range: Option<ByteRange>) -> Span {
        range.map_or(Span::Empty, Span::Range)
    }
}
