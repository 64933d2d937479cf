//! Source files, byte spans, and position arithmetic.
//!
//! Every token and every AST node carries a [`Span`]: a byte range into the
//! text of a [`SourceFile`]. Spans are non-owning views, so the driver must
//! keep the `SourceFile` alive for the whole compilation; the `'i` lifetime
//! threads that requirement through the token and expression types.

use std::cmp::{max, min};
use std::fmt;

use memchr::{memchr_iter, memrchr};

/// A named source buffer.
///
/// Owns the text that all spans of one compilation point into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        SourceFile {
            name: name.into(),
            text: text.into(),
        }
    }

    /// A zero-width span at the very end of the text.
    pub fn end_span(&self) -> Span<'_> {
        Span::new(self, self.text.len(), self.text.len())
    }

    /// Convert a byte offset into a 0-based `(line, column)` pair by linear
    /// scan, counting `'\n'` as the only line break. Columns are counted in
    /// characters, not bytes. Offsets past the end of the text clamp to the
    /// position of the final character.
    pub fn line_col(&self, offset: usize) -> LineCol {
        let offset = min(offset, self.text.len());
        let bytes = &self.text.as_bytes()[..offset];
        let line = memchr_iter(b'\n', bytes).count();
        let line_start = memrchr(b'\n', bytes).map_or(0, |idx| idx + 1);
        let column = self.text[line_start..offset].chars().count();
        LineCol { line, column }
    }
}

/// A 0-based line/column position. Display is 1-based, matching the
/// `file:line:col` banners in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A byte range `start..end` within one source file.
#[derive(Clone, Copy)]
pub struct Span<'i> {
    file: &'i SourceFile,
    pub start: usize,
    pub end: usize,
}

impl<'i> Span<'i> {
    pub fn new(file: &'i SourceFile, start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span with start {start} past end {end}");
        Span { file, start, end }
    }

    pub fn file(&self) -> &'i SourceFile {
        self.file
    }

    pub fn filename(&self) -> &'i str {
        &self.file.name
    }

    pub fn text(&self) -> &'i str {
        &self.file.text
    }

    /// The spanned substring. A span reaching past the end of the text
    /// degrades to the longest available prefix rather than failing.
    pub fn content(&self) -> &'i str {
        let end = min(self.end, self.file.text.len());
        let start = min(self.start, end);
        &self.file.text[start..end]
    }

    /// A zero-width span at this span's end.
    pub fn collapsed_to_end(&self) -> Span<'i> {
        Span::new(self.file, self.end, self.end)
    }

    /// The bounding span of one or more spans: `[min(start), max(end)]`,
    /// sharing the first span's file.
    ///
    /// All spans must come from the same file; merging across files is
    /// meaningless and is rejected in debug builds.
    ///
    /// # Panics
    ///
    /// Panics when called with no spans.
    pub fn merge<I>(spans: I) -> Span<'i>
    where
        I: IntoIterator<Item = Span<'i>>,
    {
        let mut iter = spans.into_iter();
        let first = match iter.next() {
            Some(span) => span,
            None => panic!("Span::merge called with no spans"),
        };
        iter.fold(first, |acc, span| {
            debug_assert!(
                std::ptr::eq(acc.file, span.file),
                "merging spans from different source files"
            );
            Span::new(acc.file, min(acc.start, span.start), max(acc.end, span.end))
        })
    }
}

impl fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}:{}..{})", self.file.name, self.start, self.end)
    }
}

impl PartialEq for Span<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.file, other.file)
            && self.start == other.start
            && self.end == other.end
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn file() -> SourceFile {
        SourceFile::new("demo.esc", "let x = 1\nlet y = 2\n")
    }

    #[test]
    fn content_is_the_spanned_substring() {
        let file = file();
        assert_eq!(Span::new(&file, 4, 5).content(), "x");
        assert_eq!(Span::new(&file, 10, 13).content(), "let");
        assert_eq!(Span::new(&file, 0, 0).content(), "");
    }

    #[test]
    fn content_degrades_past_the_end() {
        let file = file();
        assert_eq!(Span::new(&file, 18, 999).content(), "2\n");
    }

    #[test]
    fn merge_takes_min_start_and_max_end() {
        let file = file();
        let a = Span::new(&file, 4, 5);
        let b = Span::new(&file, 10, 13);
        let c = Span::new(&file, 8, 9);
        let merged = Span::merge([a, b, c]);
        assert_eq!(merged.start, 4);
        assert_eq!(merged.end, 13);
        assert_eq!(merged.filename(), "demo.esc");
    }

    #[test]
    #[should_panic(expected = "no spans")]
    fn merge_of_nothing_panics() {
        let file = file();
        let none: [Span<'_>; 0] = [];
        let _ = Span::merge(none);
        let _ = &file;
    }

    #[test]
    fn line_col_walks_newlines() {
        let file = file();
        assert_eq!(file.line_col(0), LineCol { line: 0, column: 0 });
        assert_eq!(file.line_col(4), LineCol { line: 0, column: 4 });
        assert_eq!(file.line_col(10), LineCol { line: 1, column: 0 });
        assert_eq!(file.line_col(14), LineCol { line: 1, column: 4 });
    }

    #[test]
    fn line_col_counts_characters_not_bytes() {
        let file = SourceFile::new("u.esc", "é é\n");
        // "é" is two bytes; the second "é" starts at byte 3, column 2.
        assert_eq!(file.line_col(3), LineCol { line: 0, column: 2 });
    }

    #[test]
    fn end_span_is_zero_width() {
        let file = file();
        let span = file.end_span();
        assert_eq!(span.start, span.end);
        assert_eq!(span.content(), "");
    }
}
