use std::fmt::Debug;

use memchr::memmem;

use crate::trim::{TrimOptions, WhiteSpace};

/// Random access to a window of input bytes.
///
/// The readers are written once against this trait and instantiated both for
/// a contiguous buffer ([`Span`]) and for a chunked
/// [`ByteSequence`](crate::sequence::ByteSequence), so both families agree
/// byte for byte. Positions are absolute in the underlying input; windows
/// only narrow where reads may look.
pub(crate) trait Source: Copy {
    type Pos: Copy + Ord + Debug;

    fn start(&self) -> Self::Pos;

    fn end(&self) -> Self::Pos;

    /// The same input narrowed to `from..to`.
    fn window(&self, from: Self::Pos, to: Self::Pos) -> Self;

    /// The byte at `pos`, or `None` at or past the end of the window.
    fn byte_at(&self, pos: Self::Pos) -> Option<u8>;

    /// The position right after `pos`, which must be before the end.
    fn next_pos(&self, pos: Self::Pos) -> Self::Pos;

    /// The position right before `pos`, which must be after the start.
    fn prev_pos(&self, pos: Self::Pos) -> Self::Pos;

    /// Moves `n` bytes forward, `None` if that leaves the window.
    fn advance(&self, pos: Self::Pos, n: usize) -> Option<Self::Pos>;

    /// The start of the first occurrence of `needle` lying entirely in `from..to`.
    fn find(&self, needle: &[u8], from: Self::Pos, to: Self::Pos) -> Option<Self::Pos>;

    fn starts_with(&self, needle: &[u8], at: Self::Pos) -> bool;

    fn equals(&self, from: Self::Pos, to: Self::Pos, other: &[u8]) -> bool;

    fn trim_start(&self, from: Self::Pos, to: Self::Pos, class: WhiteSpace) -> Self::Pos {
        let mut pos = from;
        while pos < to {
            match self.byte_at(pos) {
                Some(b) if class.contains(b) => pos = self.next_pos(pos),
                _ => break,
            }
        }
        pos
    }

    fn trim_end(&self, from: Self::Pos, to: Self::Pos, class: WhiteSpace) -> Self::Pos {
        let mut pos = from;
        let mut last = from;
        while pos < to {
            let b = match self.byte_at(pos) {
                Some(b) => b,
                None => break,
            };
            pos = self.next_pos(pos);
            if !class.contains(b) {
                last = pos;
            }
        }
        last
    }

    /// Applies `opts` to `from..to`.
    fn trim(&self, from: Self::Pos, to: Self::Pos, opts: TrimOptions) -> (Self::Pos, Self::Pos) {
        let from = if opts.has_start() {
            self.trim_start(from, to, opts.class)
        } else {
            from
        };
        let to = if opts.has_end() {
            self.trim_end(from, to, opts.class)
        } else {
            to
        };
        (from, to)
    }
}

/// A contiguous buffer seen through a `start..end` window.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Span<'a> {
    bytes: &'a [u8],
    start: usize,
    end: usize,
}

impl<'a> Span<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Span<'a> {
        Span {
            bytes,
            start: 0,
            end: bytes.len(),
        }
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    fn get(&self, from: usize, to: usize) -> &'a [u8] {
        self.bytes.get(from..to).unwrap_or_default()
    }
}

impl<'a> Source for Span<'a> {
    type Pos = usize;

    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }

    fn window(&self, from: usize, to: usize) -> Span<'a> {
        Span {
            bytes: self.bytes,
            start: from,
            end: to,
        }
    }

    fn byte_at(&self, pos: usize) -> Option<u8> {
        if pos < self.end {
            self.bytes.get(pos).copied()
        } else {
            None
        }
    }

    fn next_pos(&self, pos: usize) -> usize {
        pos + 1
    }

    fn prev_pos(&self, pos: usize) -> usize {
        pos.saturating_sub(1)
    }

    fn advance(&self, pos: usize, n: usize) -> Option<usize> {
        let pos = pos.checked_add(n)?;
        if pos <= self.end {
            Some(pos)
        } else {
            None
        }
    }

    fn find(&self, needle: &[u8], from: usize, to: usize) -> Option<usize> {
        if from > to {
            return None;
        }
        let found = match needle {
            [b] => memchr::memchr(*b, self.get(from, to)),
            _ => memmem::find(self.get(from, to), needle),
        };
        found.map(|idx| from + idx)
    }

    fn starts_with(&self, needle: &[u8], at: usize) -> bool {
        at <= self.end && self.get(at, self.end).starts_with(needle)
    }

    fn equals(&self, from: usize, to: usize, other: &[u8]) -> bool {
        from <= to && self.get(from, to) == other
    }

    fn trim_end(&self, from: usize, to: usize, class: WhiteSpace) -> usize {
        self.get(from, to)
            .iter()
            .rposition(|&b| !class.contains(b))
            .map_or(from, |idx| from + idx + 1)
    }
}
