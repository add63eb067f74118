use crate::constants;
use crate::error::Error;
use crate::header_fields::to_range;
use crate::range::ByteRange;
use crate::source::{Source, Span};
use crate::trim::TrimOptions;

/// One `Name: value` line of a section's header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultipartHeader<T = ByteRange> {
    pub name: T,
    pub value: T,
}

impl<T> MultipartHeader<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> MultipartHeader<U> {
        MultipartHeader {
            name: f(self.name),
            value: f(self.value),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HeadersCore<S: Source> {
    src: S,
    cursor: Option<S::Pos>,
    headers: usize,
    failed: Option<Error>,
}

type Header<P> = MultipartHeader<(P, P)>;

impl<S: Source> HeadersCore<S> {
    pub(crate) fn new(src: S) -> Self {
        HeadersCore {
            src,
            cursor: Some(src.start()),
            headers: 0,
            failed: None,
        }
    }

    pub(crate) fn source(&self) -> S {
        self.src
    }

    pub(crate) fn cursor(&self) -> Option<S::Pos> {
        self.cursor
    }

    pub(crate) fn reset(&mut self) {
        self.cursor = Some(self.src.start());
        self.headers = 0;
        self.failed = None;
    }

    fn exhausted(&self) -> crate::Result<Option<Header<S::Pos>>> {
        if self.headers == 0 {
            Err(Error::HeadersNotFound)
        } else {
            Ok(None)
        }
    }

    pub(crate) fn next_header(&mut self, trim_value: TrimOptions) -> crate::Result<Option<Header<S::Pos>>> {
        if let Some(err) = self.failed {
            return Err(err);
        }

        let src = self.src;
        let start = match self.cursor {
            Some(start) if start < src.end() => start,
            _ => {
                self.cursor = None;
                return self.exhausted();
            }
        };

        let (line_end, next) = match src.find(constants::CRLF, start, src.end()) {
            Some(crlf) => (crlf, src.advance(crlf, constants::CRLF.len())),
            None => (src.end(), None),
        };

        let colon = match src.find(&[constants::HEADER_SEPARATOR], start, line_end) {
            Some(colon) => colon,
            None => return Err(self.fail(Error::HeaderSeparatorNotFound)),
        };
        if colon == start {
            return Err(self.fail(Error::HeaderNameNotFound));
        }

        self.cursor = next;
        self.headers += 1;

        Ok(Some(MultipartHeader {
            name: (start, colon),
            value: src.trim(src.next_pos(colon), line_end, trim_value),
        }))
    }

    fn fail(&mut self, err: Error) -> Error {
        self.failed = Some(err);
        self.cursor = None;
        err
    }

    pub(crate) fn next_header_value_by_name(
        &mut self,
        name: &[u8],
        trim_value: TrimOptions,
    ) -> crate::Result<Option<(S::Pos, S::Pos)>> {
        let (cursor, headers) = (self.cursor, self.headers);
        match self.next_header(trim_value)? {
            Some(header) if self.src.equals(header.name.0, header.name.1, name) => Ok(Some(header.value)),
            Some(_) => {
                self.cursor = cursor;
                self.headers = headers;
                Err(Error::HeaderNameNotSame)
            }
            None => Ok(None),
        }
    }

    pub(crate) fn find_header_value_by_name(
        &mut self,
        name: &[u8],
        trim_value: TrimOptions,
    ) -> crate::Result<Option<(S::Pos, S::Pos)>> {
        loop {
            match self.next_header(trim_value) {
                Ok(Some(header)) if self.src.equals(header.name.0, header.name.1, name) => {
                    return Ok(Some(header.value))
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(Error::HeadersNotFound) => return Ok(None),
                Err(err) => return Err(err),
            }
        }
    }
}

/// Reads the `\r\n`-separated header lines of one section.
///
/// Header names are matched byte for byte, so `content-disposition` is not
/// `Content-Disposition`. Values are trimmed with [`TrimOptions::MIN_START`]
/// unless a `_with` variant says otherwise.
#[derive(Debug, Clone)]
pub struct HeadersReader<'a> {
    core: HeadersCore<Span<'a>>,
}

impl<'a> HeadersReader<'a> {
    pub fn new(bytes: &'a [u8]) -> HeadersReader<'a> {
        HeadersReader {
            core: HeadersCore::new(Span::new(bytes)),
        }
    }

    /// The header block the returned ranges point into.
    pub fn bytes(&self) -> &'a [u8] {
        self.core.source().bytes()
    }

    /// The offset of the next unread line, or `None` once the block is
    /// exhausted.
    pub fn offset(&self) -> Option<usize> {
        self.core.cursor()
    }

    /// Rewinds to the first line and clears any stored failure.
    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Returns the next header.
    ///
    /// An empty header block yields [`Error::HeadersNotFound`]; once at least
    /// one header has been read, running out of lines yields `Ok(None)`.
    pub fn next_header(&mut self) -> crate::Result<Option<MultipartHeader>> {
        self.next_header_with(TrimOptions::MIN_START)
    }

    pub fn next_header_with(&mut self, trim_value: TrimOptions) -> crate::Result<Option<MultipartHeader>> {
        Ok(self.core.next_header(trim_value)?.map(|header| header.map(to_range)))
    }

    pub fn next_header_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteRange>> {
        self.next_header_value_by_name_with(name, TrimOptions::MIN_START)
    }

    pub fn next_header_value_by_name_with(
        &mut self,
        name: &[u8],
        trim_value: TrimOptions,
    ) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.next_header_value_by_name(name, trim_value)?.map(to_range))
    }

    pub fn find_header_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteRange>> {
        self.find_header_value_by_name_with(name, TrimOptions::MIN_START)
    }

    pub fn find_header_value_by_name_with(
        &mut self,
        name: &[u8],
        trim_value: TrimOptions,
    ) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.find_header_value_by_name(name, trim_value)?.map(to_range))
    }

    pub fn next_content_disposition(&mut self) -> crate::Result<Option<ByteRange>> {
        self.next_header_value_by_name(constants::CONTENT_DISPOSITION)
    }

    pub fn next_content_type(&mut self) -> crate::Result<Option<ByteRange>> {
        self.next_header_value_by_name(constants::CONTENT_TYPE)
    }

    pub fn find_content_disposition(&mut self) -> crate::Result<Option<ByteRange>> {
        self.find_header_value_by_name(constants::CONTENT_DISPOSITION)
    }

    pub fn find_content_type(&mut self) -> crate::Result<Option<ByteRange>> {
        self.find_header_value_by_name(constants::CONTENT_TYPE)
    }
}
