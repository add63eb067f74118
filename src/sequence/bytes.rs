use std::cmp::{max, min};
use std::fmt::{self, Debug, Formatter};

use bytes::Bytes;

use super::matcher::PartialMatch;
use crate::source::Source;
use crate::trim::WhiteSpace;

/// A position in a chunked input: the chunk index and the offset in it.
///
/// Positions handed out by a [`ByteSequence`] are canonical: the offset is
/// always inside its chunk, and the end of the input is `(chunks.len(), 0)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequencePosition {
    pub chunk: usize,
    pub offset: usize,
}

impl SequencePosition {
    pub const fn new(chunk: usize, offset: usize) -> SequencePosition {
        SequencePosition { chunk, offset }
    }
}

/// A window over an ordered list of byte chunks, read as one input.
///
/// Chunks can be anything that borrows as bytes: `&[u8]`, `Vec<u8>` or
/// [`Bytes`]. Nothing is copied; slicing a sequence only narrows the window.
pub struct ByteSequence<'a, B> {
    chunks: &'a [B],
    start: SequencePosition,
    end: SequencePosition,
}

impl<'a, B> Clone for ByteSequence<'a, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, B> Copy for ByteSequence<'a, B> {}

impl<'a, B: AsRef<[u8]>> ByteSequence<'a, B> {
    pub fn new(chunks: &'a [B]) -> ByteSequence<'a, B> {
        let mut sequence = ByteSequence {
            chunks,
            start: SequencePosition::default(),
            end: SequencePosition::new(chunks.len(), 0),
        };
        sequence.start = sequence.normalize(sequence.start);
        sequence
    }

    fn chunk(&self, idx: usize) -> &'a [u8] {
        self.chunks.get(idx).map_or(&[][..], |chunk| chunk.as_ref())
    }

    // Carries offsets past the end of a chunk into the following chunks.
    fn normalize(&self, mut pos: SequencePosition) -> SequencePosition {
        while pos.chunk < self.chunks.len() {
            let len = self.chunk(pos.chunk).len();
            if pos.offset < len {
                return pos;
            }
            pos.offset -= len;
            pos.chunk += 1;
        }
        SequencePosition::new(self.chunks.len(), 0)
    }

    pub fn start(&self) -> SequencePosition {
        self.start
    }

    pub fn end(&self) -> SequencePosition {
        self.end
    }

    pub fn len(&self) -> usize {
        self.segments(self.start, self.end).map(|(_, segment)| segment.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The sub-sequence between two positions of this sequence, clamped to
    /// its window.
    pub fn slice(&self, from: SequencePosition, to: SequencePosition) -> ByteSequence<'a, B> {
        let from = min(max(self.normalize(from), self.start), self.end);
        let to = min(max(self.normalize(to), from), self.end);
        ByteSequence {
            chunks: self.chunks,
            start: from,
            end: to,
        }
    }

    pub fn slice_from(&self, from: SequencePosition) -> ByteSequence<'a, B> {
        self.slice(from, self.end)
    }

    /// The non-empty pieces of the chunks this window covers.
    pub fn chunks(&self) -> Chunks<'a, B> {
        Chunks {
            segments: self.segments(self.start, self.end),
        }
    }

    fn segments(&self, from: SequencePosition, to: SequencePosition) -> Segments<'a, B> {
        Segments {
            sequence: *self,
            pos: from,
            to,
        }
    }

    /// Moves `n` bytes forward; `None` past the end of the window.
    pub fn advance(&self, mut pos: SequencePosition, mut n: usize) -> Option<SequencePosition> {
        pos = self.normalize(pos);
        while n > 0 {
            if pos.chunk >= self.chunks.len() {
                return None;
            }
            let available = self.chunk(pos.chunk).len() - pos.offset;
            if n < available {
                pos.offset += n;
                n = 0;
            } else {
                n -= available;
                pos = self.normalize(SequencePosition::new(pos.chunk + 1, 0));
            }
        }

        if pos <= self.end {
            Some(pos)
        } else {
            None
        }
    }

    pub(crate) fn retreat(&self, mut pos: SequencePosition, mut n: usize) -> Option<SequencePosition> {
        while n > 0 {
            if pos.offset >= n {
                pos.offset -= n;
                n = 0;
            } else {
                n -= pos.offset;
                pos.chunk = pos.chunk.checked_sub(1)?;
                pos.offset = self.chunk(pos.chunk).len();
            }
        }
        Some(self.normalize(pos))
    }

    /// The position of the first occurrence of `needle`, even when it spans
    /// several chunks.
    pub fn position_of(&self, needle: &[u8]) -> Option<SequencePosition> {
        self.find(needle, self.start, self.end)
    }

    pub fn starts_with(&self, needle: &[u8]) -> bool {
        Source::starts_with(self, needle, self.start)
    }

    /// Compares the content of this sequence with `other`.
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        self.equals(self.start, self.end, other)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        for chunk in self.chunks() {
            buf.extend_from_slice(chunk);
        }
        buf
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_vec())
    }
}

impl<'a, B: AsRef<[u8]>> Source for ByteSequence<'a, B> {
    type Pos = SequencePosition;

    fn start(&self) -> SequencePosition {
        self.start
    }

    fn end(&self) -> SequencePosition {
        self.end
    }

    fn window(&self, from: SequencePosition, to: SequencePosition) -> Self {
        ByteSequence {
            chunks: self.chunks,
            start: from,
            end: to,
        }
    }

    fn byte_at(&self, pos: SequencePosition) -> Option<u8> {
        if pos >= self.end {
            return None;
        }
        self.chunk(pos.chunk).get(pos.offset).copied()
    }

    fn next_pos(&self, pos: SequencePosition) -> SequencePosition {
        self.normalize(SequencePosition::new(pos.chunk, pos.offset + 1))
    }

    fn prev_pos(&self, pos: SequencePosition) -> SequencePosition {
        self.retreat(pos, 1).unwrap_or(pos)
    }

    fn advance(&self, pos: SequencePosition, n: usize) -> Option<SequencePosition> {
        ByteSequence::advance(self, pos, n)
    }

    fn find(&self, needle: &[u8], from: SequencePosition, to: SequencePosition) -> Option<SequencePosition> {
        if from > to {
            return None;
        }
        if needle.is_empty() {
            return Some(from);
        }

        let mut matcher = PartialMatch::new(needle);
        for (at, segment) in self.segments(from, to) {
            if let Some(end) = matcher.feed(segment) {
                let end = self.normalize(SequencePosition::new(at.chunk, at.offset + end));
                return self.retreat(end, needle.len());
            }
        }

        trace!("needle of {} bytes not found in sequence", needle.len());
        None
    }

    fn starts_with(&self, needle: &[u8], at: SequencePosition) -> bool {
        let mut rest = needle;
        for (_, segment) in self.segments(at, self.end) {
            if rest.is_empty() {
                break;
            }
            let n = min(rest.len(), segment.len());
            if segment[..n] != rest[..n] {
                return false;
            }
            rest = &rest[n..];
        }
        rest.is_empty()
    }

    fn equals(&self, from: SequencePosition, to: SequencePosition, other: &[u8]) -> bool {
        let mut rest = other;
        for (_, segment) in self.segments(from, to) {
            match rest.get(..segment.len()) {
                Some(head) if head == segment => rest = &rest[segment.len()..],
                _ => return false,
            }
        }
        rest.is_empty()
    }

    fn trim_start(&self, from: SequencePosition, to: SequencePosition, class: WhiteSpace) -> SequencePosition {
        for (at, segment) in self.segments(from, to) {
            if let Some(idx) = segment.iter().position(|&b| !class.contains(b)) {
                return self.normalize(SequencePosition::new(at.chunk, at.offset + idx));
            }
        }
        max(from, to)
    }
}

impl<'a, B: AsRef<[u8]>> PartialEq<[u8]> for ByteSequence<'a, B> {
    fn eq(&self, other: &[u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl<'a, 'b, B: AsRef<[u8]>> PartialEq<&'b [u8]> for ByteSequence<'a, B> {
    fn eq(&self, other: &&'b [u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl<'a, B: AsRef<[u8]>> Debug for ByteSequence<'a, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSequence")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("len", &self.len())
            .finish()
    }
}

/// Iterator returned by [`ByteSequence::chunks`].
pub struct Chunks<'a, B> {
    segments: Segments<'a, B>,
}

impl<'a, B: AsRef<[u8]>> Iterator for Chunks<'a, B> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.segments.find(|(_, segment)| !segment.is_empty()).map(|(_, segment)| segment)
    }
}

struct Segments<'a, B> {
    sequence: ByteSequence<'a, B>,
    pos: SequencePosition,
    to: SequencePosition,
}

impl<'a, B: AsRef<[u8]>> Iterator for Segments<'a, B> {
    type Item = (SequencePosition, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.pos;
        if pos >= self.to || pos.chunk >= self.sequence.chunks.len() {
            return None;
        }

        let chunk = self.sequence.chunk(pos.chunk);
        let end = if pos.chunk == self.to.chunk {
            self.to.offset
        } else {
            chunk.len()
        };

        self.pos = self.sequence.normalize(SequencePosition::new(pos.chunk + 1, 0));
        Some((pos, chunk.get(pos.offset..end).unwrap_or_default()))
    }
}
