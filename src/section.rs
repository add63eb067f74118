use crate::boundary::Boundary;
use crate::constants;
use crate::content_disposition::DispositionCore;
use crate::error::Error;
use crate::header_fields::to_range;
use crate::headers::{HeadersCore, HeadersReader};
use crate::range::ByteRange;
use crate::source::{Source, Span};
use crate::trim::TrimOptions;

/// One part of a multipart payload.
///
/// Both ranges index the whole payload. `headers` excludes the blank line
/// that ends the header block; `body` excludes the `\r\n` that precedes the
/// next delimiter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultipartSection {
    pub headers: ByteRange,
    pub body: ByteRange,
}

impl MultipartSection {
    /// A reader over this section's header block in `payload`.
    ///
    /// The ranges it yields are relative to the header block, not to the
    /// payload.
    pub fn headers_reader<'a>(&self, payload: &'a [u8]) -> HeadersReader<'a> {
        HeadersReader::new(self.headers.get(payload).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State<P> {
    NotStarted,
    InSection(P),
    Terminated,
    Failed(Error),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SectionSpan<P> {
    pub(crate) content: P,
    pub(crate) separator: P,
    pub(crate) body: P,
    pub(crate) end: P,
}

#[derive(Debug, Clone)]
pub(crate) struct SectionCore<'b, S: Source> {
    src: S,
    delimiter: &'b [u8],
    strict: bool,
    state: State<S::Pos>,
    sections: usize,
}

impl<'b, S: Source> SectionCore<'b, S> {
    pub(crate) fn new(src: S, boundary: &'b Boundary, strict: bool) -> Self {
        SectionCore {
            src,
            delimiter: boundary.with_crlf(),
            strict,
            state: State::NotStarted,
            sections: 0,
        }
    }

    pub(crate) fn source(&self) -> S {
        self.src
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.strict
    }

    pub(crate) fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub(crate) fn position(&self) -> Option<S::Pos> {
        match self.state {
            State::InSection(pos) => Some(pos),
            _ => None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.state = State::NotStarted;
        self.sections = 0;
    }

    fn fail(&mut self, err: Error) -> Error {
        trace!("multipart section reader failed: {}", err);
        self.state = State::Failed(err);
        err
    }

    pub(crate) fn next_section(&mut self) -> crate::Result<Option<SectionSpan<S::Pos>>> {
        let content = match self.state {
            State::Failed(err) => return Err(err),
            State::Terminated if self.sections == 0 => return Err(Error::SectionsNotFound),
            State::Terminated => return Ok(None),
            State::InSection(pos) => pos,
            State::NotStarted => match self.open() {
                Ok(Some(pos)) => pos,
                Ok(None) => {
                    trace!("multipart payload holds no sections");
                    self.state = State::Terminated;
                    return Err(Error::SectionsNotFound);
                }
                Err(err) => return Err(self.fail(err)),
            },
        };

        match self.read_section(content) {
            Ok((section, next)) => {
                self.state = next;
                self.sections += 1;
                if next == State::Terminated {
                    trace!("multipart close delimiter reached after {} sections", self.sections);
                }
                Ok(Some(section))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    // Finds the opening delimiter; `None` means the payload is empty or
    // closes right away.
    fn open(&self) -> crate::Result<Option<S::Pos>> {
        let src = self.src;
        if src.start() >= src.end() {
            return Ok(None);
        }

        let opening = &self.delimiter[constants::CRLF.len()..];
        let found = if self.strict {
            Some(src.start()).filter(|&start| src.starts_with(opening, start))
        } else {
            src.find(opening, src.start(), src.end())
        };

        let after = found
            .and_then(|pos| src.advance(pos, opening.len()))
            .ok_or(Error::StartBoundaryNotFound)?;

        if src.starts_with(constants::BOUNDARY_EXT, after) {
            self.close(after)?;
            return Ok(None);
        }

        if !src.starts_with(constants::CRLF, after) {
            return Err(Error::StartBoundaryCRLFNotFound);
        }

        let content = src
            .advance(after, constants::CRLF.len())
            .ok_or(Error::StartBoundaryCRLFNotFound)?;
        Ok(Some(content))
    }

    // `dashes` points at the `--` of a close delimiter.
    fn close(&self, dashes: S::Pos) -> crate::Result<()> {
        if !self.strict {
            return Ok(());
        }

        let src = self.src;
        let tail = src
            .advance(dashes, constants::BOUNDARY_EXT.len())
            .ok_or(Error::EndBoundaryNotFound)?;

        if src.starts_with(constants::CRLF, tail) && src.advance(tail, constants::CRLF.len()) == Some(src.end()) {
            Ok(())
        } else {
            Err(Error::EndBoundaryNotFound)
        }
    }

    fn read_section(&self, content: S::Pos) -> crate::Result<(SectionSpan<S::Pos>, State<S::Pos>)> {
        let src = self.src;

        let end = src
            .find(self.delimiter, content, src.end())
            .ok_or(Error::BoundaryNotFound)?;
        let after = src
            .advance(end, self.delimiter.len())
            .ok_or(Error::BoundaryNotFound)?;

        let next = if src.starts_with(constants::CRLF, after) {
            let next = src
                .advance(after, constants::CRLF.len())
                .ok_or(Error::EndBoundaryNotFound)?;
            State::InSection(next)
        } else if src.starts_with(constants::BOUNDARY_EXT, after) {
            self.close(after)?;
            State::Terminated
        } else {
            return Err(Error::EndBoundaryNotFound);
        };

        let separator = src
            .find(constants::CRLF_CRLF, content, end)
            .ok_or(Error::SectionSeparatorNotFound)?;
        let body = src
            .advance(separator, constants::CRLF_CRLF.len())
            .ok_or(Error::SectionSeparatorNotFound)?;

        Ok((
            SectionSpan {
                content,
                separator,
                body,
                end,
            },
            next,
        ))
    }

    fn has_content_disposition(&self, section: &SectionSpan<S::Pos>, kind: &[u8], name: &[u8]) -> bool {
        let mut headers = HeadersCore::new(self.src.window(section.content, section.separator));

        while let Ok(Some((from, to))) =
            headers.find_header_value_by_name(constants::CONTENT_DISPOSITION, TrimOptions::MIN_START)
        {
            let mut disposition = DispositionCore::new(self.src.window(from, to));
            if !disposition.is_type(kind) {
                continue;
            }
            if let Ok(Some((from, to))) = disposition.find_field(constants::FIELD_NAME) {
                if self.src.equals(from, to, name) {
                    return true;
                }
            }
        }

        false
    }

    pub(crate) fn next_section_by_content_disposition(
        &mut self,
        kind: &[u8],
        name: &[u8],
    ) -> crate::Result<Option<SectionSpan<S::Pos>>> {
        match self.next_section()? {
            Some(section) if self.has_content_disposition(&section, kind, name) => Ok(Some(section)),
            Some(_) => Err(Error::ContentDispositionNotSame),
            None => Ok(None),
        }
    }

    pub(crate) fn find_section_by_content_disposition(
        &mut self,
        kind: &[u8],
        name: &[u8],
    ) -> crate::Result<Option<SectionSpan<S::Pos>>> {
        while let Some(section) = self.next_section()? {
            if self.has_content_disposition(&section, kind, name) {
                return Ok(Some(section));
            }
        }
        Ok(None)
    }
}

fn to_section(span: SectionSpan<usize>) -> MultipartSection {
    MultipartSection {
        headers: to_range((span.content, span.separator)),
        body: to_range((span.body, span.end)),
    }
}

/// Splits a whole multipart payload into its sections.
///
/// In strict mode (the default) the payload must start with `--boundary` and
/// end with `--boundary--\r\n`. A lenient reader skips any preamble before
/// the first delimiter and any epilogue after the last one.
///
/// Once a call fails, every later call returns the same error until
/// [`reset`](SectionReader::reset).
///
/// # Examples
///
/// ```
/// use partwise::{Boundary, SectionReader};
///
/// let payload = b"--B\r\nContent-Disposition: form-data; name=a\r\n\r\nv\r\n--B--\r\n";
/// let boundary = Boundary::parse("B").unwrap();
/// let mut reader = SectionReader::new(payload, &boundary);
///
/// let section = reader.next_section().unwrap().unwrap();
/// assert_eq!(section.headers.slice(payload), b"Content-Disposition: form-data; name=a");
/// assert_eq!(section.body.slice(payload), b"v");
///
/// assert_eq!(reader.next_section(), Ok(None));
/// ```
#[derive(Debug, Clone)]
pub struct SectionReader<'a> {
    core: SectionCore<'a, Span<'a>>,
}

impl<'a> SectionReader<'a> {
    /// Creates a strict reader.
    pub fn new(bytes: &'a [u8], boundary: &'a Boundary) -> SectionReader<'a> {
        SectionReader {
            core: SectionCore::new(Span::new(bytes), boundary, true),
        }
    }

    /// Creates a reader that tolerates a preamble and an epilogue.
    pub fn lenient(bytes: &'a [u8], boundary: &'a Boundary) -> SectionReader<'a> {
        SectionReader::new(bytes, boundary).with_strict(false)
    }

    /// Switches between strict and lenient framing.
    ///
    /// A strict reader wants the payload to start with `--boundary` and end
    /// right after `--boundary--\r\n`; a lenient one skips a preamble and
    /// ignores the epilogue.
    pub fn with_strict(mut self, strict: bool) -> SectionReader<'a> {
        self.core.set_strict(strict);
        self
    }

    /// Returns `true` unless the reader tolerates a preamble and an epilogue.
    pub fn is_strict(&self) -> bool {
        self.core.is_strict()
    }

    /// The payload the returned ranges point into.
    pub fn bytes(&self) -> &'a [u8] {
        self.core.source().bytes()
    }

    /// The offset where the next section starts, if one is pending.
    pub fn position(&self) -> Option<usize> {
        self.core.position()
    }

    /// Rewinds to the start of the payload and clears any stored failure.
    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Returns the next section.
    ///
    /// A payload with no sections at all yields [`Error::SectionsNotFound`];
    /// reaching the close delimiter after at least one section yields
    /// `Ok(None)`.
    pub fn next_section(&mut self) -> crate::Result<Option<MultipartSection>> {
        Ok(self.core.next_section()?.map(to_section))
    }

    /// Reads the next section and checks that it has a `Content-Disposition`
    /// of type `kind` with the field `name`.
    pub fn next_section_by_content_disposition(
        &mut self,
        kind: &[u8],
        name: &[u8],
    ) -> crate::Result<Option<MultipartSection>> {
        Ok(self.core.next_section_by_content_disposition(kind, name)?.map(to_section))
    }

    /// Skips sections until one matches `kind` and `name`.
    pub fn find_section_by_content_disposition(
        &mut self,
        kind: &[u8],
        name: &[u8],
    ) -> crate::Result<Option<MultipartSection>> {
        Ok(self.core.find_section_by_content_disposition(kind, name)?.map(to_section))
    }

    pub fn next_section_by_form_data(&mut self, name: &[u8]) -> crate::Result<Option<MultipartSection>> {
        self.next_section_by_content_disposition(constants::FORM_DATA, name)
    }

    pub fn find_section_by_form_data(&mut self, name: &[u8]) -> crate::Result<Option<MultipartSection>> {
        self.find_section_by_content_disposition(constants::FORM_DATA, name)
    }

    /// Iterates over the remaining sections.
    ///
    /// A failure is yielded once, after which the iterator is done. An empty
    /// payload simply yields nothing.
    pub fn sections(&mut self) -> Sections<'_, 'a> {
        Sections {
            reader: self,
            done: false,
        }
    }
}

/// Iterator returned by [`SectionReader::sections`].
#[derive(Debug)]
pub struct Sections<'r, 'a> {
    reader: &'r mut SectionReader<'a>,
    done: bool,
}

impl<'r, 'a> Iterator for Sections<'r, 'a> {
    type Item = crate::Result<MultipartSection>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_section() {
            Ok(Some(section)) => Some(Ok(section)),
            Ok(None) | Err(Error::SectionsNotFound) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary() -> Boundary {
        Boundary::parse("B").unwrap()
    }

    fn first(payload: &[u8], strict: bool) -> crate::Result<Option<MultipartSection>> {
        let boundary = boundary();
        let mut reader = SectionReader::new(payload, &boundary).with_strict(strict);
        reader.next_section()
    }

    #[test]
    fn test_single_section() {
        let payload = b"--B\r\nContent-Disposition: form-data; name=a\r\n\r\nv\r\n--B--\r\n";
        let boundary = boundary();
        let mut reader = SectionReader::new(payload, &boundary);

        let section = reader.next_section().unwrap().unwrap();
        assert_eq!(section.headers.slice(payload), b"Content-Disposition: form-data; name=a");
        assert_eq!(section.body.slice(payload), b"v");
        assert_eq!(reader.position(), None);
        assert_eq!(reader.next_section(), Ok(None));
        assert_eq!(reader.next_section(), Ok(None));
    }

    #[test]
    fn test_multiple_sections() {
        let payload = b"--B\r\nA: 1\r\n\r\none\r\n--B\r\nA: 2\r\n\r\n\r\n--B\r\n\r\n\r\nthree\r\n\r\n--B--\r\n";
        let boundary = boundary();
        let mut reader = SectionReader::new(payload, &boundary);

        let section = reader.next_section().unwrap().unwrap();
        assert_eq!(section.headers.slice(payload), b"A: 1");
        assert_eq!(section.body.slice(payload), b"one");
        assert!(reader.position().is_some());

        let section = reader.next_section().unwrap().unwrap();
        assert_eq!(section.headers.slice(payload), b"A: 2");
        assert!(section.body.is_empty());

        let section = reader.next_section().unwrap().unwrap();
        assert!(section.headers.is_empty());
        assert_eq!(section.body.slice(payload), b"three\r\n");

        assert_eq!(reader.next_section(), Ok(None));
    }

    #[test]
    fn test_sections_not_found() {
        assert_eq!(first(b"", true), Err(Error::SectionsNotFound));
        assert_eq!(first(b"--B--\r\n", true), Err(Error::SectionsNotFound));
        assert_eq!(first(b"--B--", false), Err(Error::SectionsNotFound));
        assert_eq!(first(b"--B--", true), Err(Error::EndBoundaryNotFound));

        let boundary = boundary();
        let mut reader = SectionReader::new(b"", &boundary);
        assert_eq!(reader.next_section(), Err(Error::SectionsNotFound));
        assert_eq!(reader.next_section(), Err(Error::SectionsNotFound));
    }

    #[test]
    fn test_start_boundary() {
        assert_eq!(first(b"[[[[--B\r\n\r\n\r\nv\r\n--B--\r\n", true), Err(Error::StartBoundaryNotFound));
        assert!(first(b"[[[[--B\r\n\r\n\r\nv\r\n--B--\r\n", false).unwrap().is_some());
        assert_eq!(first(b"--X\r\n\r\n\r\nv\r\n--X--\r\n", false), Err(Error::StartBoundaryNotFound));
        assert_eq!(first(b"--B \r\n\r\n\r\nv\r\n--B--\r\n", true), Err(Error::StartBoundaryCRLFNotFound));
        assert_eq!(first(b"--B", true), Err(Error::StartBoundaryCRLFNotFound));
    }

    #[test]
    fn test_boundary_not_found() {
        assert_eq!(first(b"--B\r\nA: 1\r\n\r\nv", true), Err(Error::BoundaryNotFound));
        assert_eq!(first(b"--B\r\nA: 1\r\n\r\nv--B--\r\n", true), Err(Error::BoundaryNotFound));
    }

    #[test]
    fn test_end_boundary_not_found() {
        assert_eq!(first(b"--B\r\nA: 1\r\n\r\nv\r\n--B", true), Err(Error::EndBoundaryNotFound));
        assert_eq!(first(b"--B\r\nA: 1\r\n\r\nv\r\n--Bx", true), Err(Error::EndBoundaryNotFound));
        assert_eq!(first(b"--B\r\nA: 1\r\n\r\nv\r\n--B--", true), Err(Error::EndBoundaryNotFound));
        assert_eq!(first(b"--B\r\nA: 1\r\n\r\nv\r\n--B--\r\n]]]]", true), Err(Error::EndBoundaryNotFound));
        assert!(first(b"--B\r\nA: 1\r\n\r\nv\r\n--B--\r\n]]]]", false).unwrap().is_some());
        assert!(first(b"--B\r\nA: 1\r\n\r\nv\r\n--B--", false).unwrap().is_some());
    }

    #[test]
    fn test_section_separator_not_found() {
        assert_eq!(first(b"--B\r\nA: 1\r\nv\r\n--B--\r\n", true), Err(Error::SectionSeparatorNotFound));
    }

    #[test]
    fn test_failure_is_cached() {
        let payload = b"--B\r\nA: 1\r\n\r\none\r\n--B\r\nA: 2\r\ntwo\r\n--B--\r\n";
        let boundary = boundary();
        let mut reader = SectionReader::new(payload, &boundary);

        assert!(reader.next_section().unwrap().is_some());
        assert_eq!(reader.next_section(), Err(Error::SectionSeparatorNotFound));
        assert_eq!(reader.next_section(), Err(Error::SectionSeparatorNotFound));

        reader.reset();
        let section = reader.next_section().unwrap().unwrap();
        assert_eq!(section.body.slice(payload), b"one");
    }

    #[test]
    fn test_by_content_disposition() {
        let payload = b"--B\r\n\
            Content-Disposition: form-data; name=\"first\"\r\n\r\n1\r\n\
            --B\r\n\
            Content-Type: text/plain\r\n\
            Content-Disposition: form-data; name=\"second\"; filename=\"2.txt\"\r\n\r\n2\r\n\
            --B--\r\n";
        let boundary = boundary();
        let mut reader = SectionReader::new(payload, &boundary);

        assert_eq!(
            reader.next_section_by_form_data(b"second"),
            Err(Error::ContentDispositionNotSame)
        );
        let section = reader.next_section_by_form_data(b"second").unwrap().unwrap();
        assert_eq!(section.body.slice(payload), b"2");

        reader.reset();
        let section = reader.find_section_by_form_data(b"second").unwrap().unwrap();
        assert_eq!(section.body.slice(payload), b"2");
        assert_eq!(reader.find_section_by_form_data(b"first"), Ok(None));

        reader.reset();
        assert_eq!(reader.find_section_by_content_disposition(b"attachment", b"first"), Ok(None));

        reader.reset();
        let section = reader.next_section_by_content_disposition(b"form-data", b"first").unwrap().unwrap();
        assert_eq!(section.body.slice(payload), b"1");
    }

    #[test]
    fn test_sections_iterator() {
        let payload = b"--B\r\nA: 1\r\n\r\none\r\n--B\r\nA: 2\r\n\r\ntwo\r\n--B--\r\n";
        let boundary = boundary();
        let mut reader = SectionReader::new(payload, &boundary);
        let bodies: Vec<_> = reader
            .sections()
            .map(|section| section.unwrap().body.slice(payload))
            .collect();
        assert_eq!(bodies, vec![&b"one"[..], b"two"]);

        let mut reader = SectionReader::new(b"--B\r\nA: 1\r\n\r\none", &boundary);
        let results: Vec<_> = reader.sections().collect();
        assert_eq!(results, vec![Err(Error::BoundaryNotFound)]);

        let mut reader = SectionReader::new(b"", &boundary);
        assert_eq!(reader.sections().count(), 0);
    }

    #[test]
    fn test_headers_reader() {
        let payload = b"--B\r\nContent-Type: text/plain\r\n\r\nv\r\n--B--\r\n";
        let boundary = boundary();
        let section = SectionReader::new(payload, &boundary).next_section().unwrap().unwrap();

        let mut headers = section.headers_reader(payload);
        let value = headers.next_content_type().unwrap().unwrap();
        assert_eq!(value.slice(headers.bytes()), b"text/plain");
    }
}
