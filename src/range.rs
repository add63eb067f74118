use std::ops::Range;

/// A half-open `start..end` window into a caller-owned buffer.
///
/// Readers never copy; they hand out `ByteRange`s that index the buffer they
/// were built over. The default value `(0, 0)` is what readers report for
/// "nothing", a real empty match is `(x, x)` at the offset it was found.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn new(start: usize, end: usize) -> ByteRange {
        ByteRange { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Borrows the bytes this range points at.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds for `bytes`, i.e. it was produced
    /// by a reader over a different buffer.
    pub fn slice<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.range()]
    }

    /// Like [`slice`](ByteRange::slice) but returns `None` when out of bounds.
    pub fn get<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        bytes.get(self.range())
    }

    /// Borrows the range as UTF-8 text.
    pub fn as_str<'a>(&self, bytes: &'a [u8]) -> Option<&'a str> {
        self.get(bytes).and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl From<Range<usize>> for ByteRange {
    fn from(range: Range<usize>) -> Self {
        ByteRange::new(range.start, range.end)
    }
}

impl From<ByteRange> for Range<usize> {
    fn from(range: ByteRange) -> Self {
        range.range()
    }
}
