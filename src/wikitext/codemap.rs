//! A data structure for tracking source positions, heavily adapted from
//! [codemap](https://crates.io/crates/codemap).

use serde::Serialize;

/// A range of text within a string.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Span {
    /// The position representing the first byte of the span.
    pub start: usize,

    /// The position after the last byte of the span.
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Returns true if this span is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// The length of the span, in bytes.
    #[inline]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// Returns true if `other` lies entirely within this span.
    #[inline]
    pub fn encloses(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the two spans share at least one byte.
    #[inline]
    pub fn overlaps(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Converts the span into a range that can be used for string indexing.
    // This is not just using `From<core::ops::Range<usize>` because type
    // resolution fails in common use with `.into()` which eliminates any
    // benefit of using a standard conversion trait
    #[inline]
    pub fn into_range(self) -> core::ops::Range<usize> {
        self.start..self.end
    }
}

/// A one-based line and column position.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct LineCol {
    /// The line number, starting at 1.
    pub line: usize,
    /// The column number in characters, starting at 1.
    pub column: usize,
    /// The byte offset.
    pub offset: usize,
}

impl core::fmt::Display for LineCol {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A record of a source text’s lines.
#[derive(Clone)]
pub struct FileMap<'a> {
    /// The source text.
    source: &'a str,

    /// Byte positions of line beginnings.
    lines: Vec<usize>,
}

impl core::fmt::Debug for FileMap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let limit = self.source.floor_char_boundary(100);

        f.debug_struct("FileMap")
            .field(
                "source",
                &format!(
                    "{}{}",
                    &self.source[..limit],
                    if self.source.len() > limit { "…" } else { "" }
                ),
            )
            .field("lines", &self.lines.len())
            .finish()
    }
}

impl<'a> FileMap<'a> {
    /// Creates a new line map for the given source.
    pub fn new(source: &'a str) -> Self {
        let lines = core::iter::once(0)
            .chain(memchr::memchr_iter(b'\n', source.as_bytes()).map(|p| p + 1))
            .collect();

        Self { source, lines }
    }

    /// Gets the line and column of a byte offset.
    ///
    /// # Panics
    ///
    /// * If `pos` is not within the source
    /// * If `pos` points to a byte in the middle of a UTF-8 character
    pub fn find_line_col(&self, pos: usize) -> LineCol {
        assert!(pos <= self.source.len());
        let line = match self.lines.binary_search(&pos) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = self.source[self.lines[line]..pos].chars().count();
        LineCol {
            line: line + 1,
            column: column + 1,
            offset: pos,
        }
    }
}
