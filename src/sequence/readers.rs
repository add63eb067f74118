use super::bytes::{ByteSequence, SequencePosition};
use crate::boundary::Boundary;
use crate::charset::{CharsetDecoder, EncodingRsDecoder};
use crate::constants;
use crate::content_disposition::{decode_file_name, ContentDisposition, DispositionCore};
use crate::error::Error;
use crate::header_fields::{FieldsCore, MultipartHeaderField};
use crate::headers::{HeadersCore, MultipartHeader};
use crate::section::{SectionCore, SectionSpan};
use crate::source::Source;
use crate::trim::TrimOptions;

pub type SequenceHeaderField<'a, B> = MultipartHeaderField<ByteSequence<'a, B>>;
pub type SequenceHeader<'a, B> = MultipartHeader<ByteSequence<'a, B>>;
pub type SequenceContentDisposition<'a, B> = ContentDisposition<ByteSequence<'a, B>>;

impl<'a, B: AsRef<[u8]>> ContentDisposition<ByteSequence<'a, B>> {
    /// Decodes the file name the same way as the contiguous
    /// [`ContentDisposition::decoded_file_name`].
    pub fn decoded_file_name(&self) -> Option<String> {
        self.decoded_file_name_with(&EncodingRsDecoder)
    }

    pub fn decoded_file_name_with<D: CharsetDecoder + ?Sized>(&self, decoder: &D) -> Option<String> {
        let star = self.file_name_star.map(|seq| seq.to_vec());
        let plain = self.file_name.map(|seq| seq.to_vec());
        decode_file_name(star.as_deref(), plain.as_deref(), decoder)
    }
}

/// [`HeaderFieldsReader`](crate::HeaderFieldsReader) over a [`ByteSequence`].
#[derive(Debug, Clone)]
pub struct SequenceHeaderFieldsReader<'a, B: AsRef<[u8]>> {
    core: FieldsCore<ByteSequence<'a, B>>,
}

impl<'a, B: AsRef<[u8]>> SequenceHeaderFieldsReader<'a, B> {
    pub fn new(sequence: ByteSequence<'a, B>) -> SequenceHeaderFieldsReader<'a, B> {
        SequenceHeaderFieldsReader {
            core: FieldsCore::new(sequence),
        }
    }

    pub fn sequence(&self) -> ByteSequence<'a, B> {
        self.core.source()
    }

    pub fn position(&self) -> Option<SequencePosition> {
        self.core.cursor()
    }

    pub fn reset(&mut self) {
        self.core.reset();
    }

    fn window(&self, (from, to): (SequencePosition, SequencePosition)) -> ByteSequence<'a, B> {
        self.core.source().window(from, to)
    }

    pub fn next_value(&mut self) -> Option<ByteSequence<'a, B>> {
        self.next_value_with(TrimOptions::MAX)
    }

    pub fn next_value_with(&mut self, trim: TrimOptions) -> Option<ByteSequence<'a, B>> {
        let value = self.core.next_value(trim)?;
        Some(self.window(value))
    }

    pub fn next_field(&mut self) -> crate::Result<Option<SequenceHeaderField<'a, B>>> {
        self.next_field_with(TrimOptions::MAX, TrimOptions::MAX)
    }

    pub fn next_field_with(
        &mut self,
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<SequenceHeaderField<'a, B>>> {
        let src = self.core.source();
        Ok(self
            .core
            .next_field(trim, trim_field)?
            .map(|field| field.map(|(from, to)| src.window(from, to))))
    }

    pub fn next_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.next_value_by_name_with(name, TrimOptions::MAX, TrimOptions::MAX)
    }

    pub fn next_value_by_name_with(
        &mut self,
        name: &[u8],
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<ByteSequence<'a, B>>> {
        let value = self.core.next_value_by_name(name, trim, trim_field)?;
        Ok(value.map(|value| self.window(value)))
    }

    pub fn find_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.find_value_by_name_with(name, TrimOptions::MAX, TrimOptions::MAX)
    }

    pub fn find_value_by_name_with(
        &mut self,
        name: &[u8],
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<ByteSequence<'a, B>>> {
        let value = self.core.find_value_by_name(name, trim, trim_field)?;
        Ok(value.map(|value| self.window(value)))
    }
}

/// [`HeadersReader`](crate::HeadersReader) over a [`ByteSequence`].
#[derive(Debug, Clone)]
pub struct SequenceHeadersReader<'a, B: AsRef<[u8]>> {
    core: HeadersCore<ByteSequence<'a, B>>,
}

impl<'a, B: AsRef<[u8]>> SequenceHeadersReader<'a, B> {
    pub fn new(sequence: ByteSequence<'a, B>) -> SequenceHeadersReader<'a, B> {
        SequenceHeadersReader {
            core: HeadersCore::new(sequence),
        }
    }

    pub fn sequence(&self) -> ByteSequence<'a, B> {
        self.core.source()
    }

    pub fn position(&self) -> Option<SequencePosition> {
        self.core.cursor()
    }

    pub fn reset(&mut self) {
        self.core.reset();
    }

    fn window(&self, (from, to): (SequencePosition, SequencePosition)) -> ByteSequence<'a, B> {
        self.core.source().window(from, to)
    }

    pub fn next_header(&mut self) -> crate::Result<Option<SequenceHeader<'a, B>>> {
        self.next_header_with(TrimOptions::MIN_START)
    }

    pub fn next_header_with(&mut self, trim_value: TrimOptions) -> crate::Result<Option<SequenceHeader<'a, B>>> {
        let src = self.core.source();
        Ok(self
            .core
            .next_header(trim_value)?
            .map(|header| header.map(|(from, to)| src.window(from, to))))
    }

    pub fn next_header_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.next_header_value_by_name_with(name, TrimOptions::MIN_START)
    }

    pub fn next_header_value_by_name_with(
        &mut self,
        name: &[u8],
        trim_value: TrimOptions,
    ) -> crate::Result<Option<ByteSequence<'a, B>>> {
        let value = self.core.next_header_value_by_name(name, trim_value)?;
        Ok(value.map(|value| self.window(value)))
    }

    pub fn find_header_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.find_header_value_by_name_with(name, TrimOptions::MIN_START)
    }

    pub fn find_header_value_by_name_with(
        &mut self,
        name: &[u8],
        trim_value: TrimOptions,
    ) -> crate::Result<Option<ByteSequence<'a, B>>> {
        let value = self.core.find_header_value_by_name(name, trim_value)?;
        Ok(value.map(|value| self.window(value)))
    }

    pub fn next_content_disposition(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.next_header_value_by_name(constants::CONTENT_DISPOSITION)
    }

    pub fn next_content_type(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.next_header_value_by_name(constants::CONTENT_TYPE)
    }

    pub fn find_content_disposition(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.find_header_value_by_name(constants::CONTENT_DISPOSITION)
    }

    pub fn find_content_type(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.find_header_value_by_name(constants::CONTENT_TYPE)
    }
}

/// [`ContentDispositionReader`](crate::ContentDispositionReader) over a
/// [`ByteSequence`].
#[derive(Debug, Clone)]
pub struct SequenceContentDispositionReader<'a, B: AsRef<[u8]>> {
    core: DispositionCore<ByteSequence<'a, B>>,
}

impl<'a, B: AsRef<[u8]>> SequenceContentDispositionReader<'a, B> {
    pub fn new(sequence: ByteSequence<'a, B>) -> SequenceContentDispositionReader<'a, B> {
        SequenceContentDispositionReader {
            core: DispositionCore::new(sequence),
        }
    }

    pub fn sequence(&self) -> ByteSequence<'a, B> {
        self.core.source()
    }

    pub fn reset(&mut self) {
        self.core.reset();
    }

    fn window(&self, (from, to): (SequencePosition, SequencePosition)) -> ByteSequence<'a, B> {
        self.core.source().window(from, to)
    }

    pub fn read_type(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        let value = self.core.read_type()?;
        Ok(value.map(|value| self.window(value)))
    }

    pub fn is_type(&mut self, kind: &[u8]) -> bool {
        self.core.is_type(kind)
    }

    pub fn is_form_data(&mut self) -> bool {
        self.is_type(constants::FORM_DATA)
    }

    pub fn is_attachment(&mut self) -> bool {
        self.is_type(constants::ATTACHMENT)
    }

    fn read_field(&mut self, name: &[u8]) -> crate::Result<Option<ByteSequence<'a, B>>> {
        let value = self.core.read_field(name)?;
        Ok(value.map(|value| self.window(value)))
    }

    fn find_field(&mut self, name: &[u8]) -> crate::Result<Option<ByteSequence<'a, B>>> {
        let value = self.core.find_field(name)?;
        Ok(value.map(|value| self.window(value)))
    }

    pub fn read_name(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.read_field(constants::FIELD_NAME)
    }

    pub fn read_file_name(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.read_field(constants::FIELD_FILE_NAME)
    }

    pub fn read_file_name_star(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.read_field(constants::FIELD_FILE_NAME_STAR)
    }

    pub fn find_name(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.find_field(constants::FIELD_NAME)
    }

    pub fn find_file_name(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.find_field(constants::FIELD_FILE_NAME)
    }

    pub fn find_file_name_star(&mut self) -> crate::Result<Option<ByteSequence<'a, B>>> {
        self.find_field(constants::FIELD_FILE_NAME_STAR)
    }

    pub fn read(&mut self) -> crate::Result<SequenceContentDisposition<'a, B>> {
        let src = self.core.source();
        Ok(self.core.read()?.map(|(from, to)| src.window(from, to)))
    }

    pub fn try_read(&mut self) -> Option<SequenceContentDisposition<'a, B>> {
        self.read().ok()
    }
}

/// One part of a chunked multipart payload.
///
/// Only the span of the part and the position of its blank line are kept;
/// headers and body are cut out of it on demand.
pub struct MultipartSequenceSection<'a, B> {
    sequence: ByteSequence<'a, B>,
    separator: SequencePosition,
}

impl<'a, B> Clone for MultipartSequenceSection<'a, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, B> Copy for MultipartSequenceSection<'a, B> {}

impl<'a, B: AsRef<[u8]>> std::fmt::Debug for MultipartSequenceSection<'a, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartSequenceSection")
            .field("sequence", &self.sequence)
            .field("separator", &self.separator)
            .finish()
    }
}

impl<'a, B: AsRef<[u8]>> MultipartSequenceSection<'a, B> {
    /// Everything between the delimiter line and the next delimiter.
    pub fn sequence(&self) -> ByteSequence<'a, B> {
        self.sequence
    }

    pub fn separator(&self) -> SequencePosition {
        self.separator
    }

    pub fn headers(&self) -> ByteSequence<'a, B> {
        self.sequence.slice(self.sequence.start(), self.separator)
    }

    pub fn body(&self) -> ByteSequence<'a, B> {
        let body = self
            .sequence
            .advance(self.separator, constants::CRLF_CRLF.len())
            .unwrap_or_else(|| self.sequence.end());
        self.sequence.slice_from(body)
    }

    pub fn headers_reader(&self) -> SequenceHeadersReader<'a, B> {
        SequenceHeadersReader::new(self.headers())
    }
}

/// [`SectionReader`](crate::SectionReader) over a [`ByteSequence`].
///
/// Delimiters may be split across any number of chunks.
///
/// # Examples
///
/// ```
/// use partwise::sequence::{ByteSequence, SequenceSectionReader};
/// use partwise::Boundary;
///
/// let chunks: Vec<&[u8]> = vec![&b"--B\r\nA: 1\r\n\r\nva"[..], b"lue\r\n-", b"-B--\r\n"];
/// let boundary = Boundary::parse("B").unwrap();
/// let mut reader = SequenceSectionReader::new(ByteSequence::new(&chunks), &boundary);
///
/// let section = reader.next_section().unwrap().unwrap();
/// assert_eq!(section.body().to_vec(), b"value");
/// assert!(reader.next_section().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SequenceSectionReader<'a, B: AsRef<[u8]>> {
    core: SectionCore<'a, ByteSequence<'a, B>>,
}

impl<'a, B: AsRef<[u8]>> SequenceSectionReader<'a, B> {
    pub fn new(sequence: ByteSequence<'a, B>, boundary: &'a Boundary) -> SequenceSectionReader<'a, B> {
        SequenceSectionReader {
            core: SectionCore::new(sequence, boundary, true),
        }
    }

    pub fn lenient(sequence: ByteSequence<'a, B>, boundary: &'a Boundary) -> SequenceSectionReader<'a, B> {
        SequenceSectionReader::new(sequence, boundary).with_strict(false)
    }

    pub fn with_strict(mut self, strict: bool) -> SequenceSectionReader<'a, B> {
        self.core.set_strict(strict);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.core.is_strict()
    }

    pub fn sequence(&self) -> ByteSequence<'a, B> {
        self.core.source()
    }

    pub fn position(&self) -> Option<SequencePosition> {
        self.core.position()
    }

    pub fn reset(&mut self) {
        self.core.reset();
    }

    fn to_section(&self, span: SectionSpan<SequencePosition>) -> MultipartSequenceSection<'a, B> {
        MultipartSequenceSection {
            sequence: self.core.source().window(span.content, span.end),
            separator: span.separator,
        }
    }

    pub fn next_section(&mut self) -> crate::Result<Option<MultipartSequenceSection<'a, B>>> {
        let span = self.core.next_section()?;
        Ok(span.map(|span| self.to_section(span)))
    }

    pub fn next_section_by_content_disposition(
        &mut self,
        kind: &[u8],
        name: &[u8],
    ) -> crate::Result<Option<MultipartSequenceSection<'a, B>>> {
        let span = self.core.next_section_by_content_disposition(kind, name)?;
        Ok(span.map(|span| self.to_section(span)))
    }

    pub fn find_section_by_content_disposition(
        &mut self,
        kind: &[u8],
        name: &[u8],
    ) -> crate::Result<Option<MultipartSequenceSection<'a, B>>> {
        let span = self.core.find_section_by_content_disposition(kind, name)?;
        Ok(span.map(|span| self.to_section(span)))
    }

    pub fn next_section_by_form_data(&mut self, name: &[u8]) -> crate::Result<Option<MultipartSequenceSection<'a, B>>> {
        self.next_section_by_content_disposition(constants::FORM_DATA, name)
    }

    pub fn find_section_by_form_data(&mut self, name: &[u8]) -> crate::Result<Option<MultipartSequenceSection<'a, B>>> {
        self.find_section_by_content_disposition(constants::FORM_DATA, name)
    }

    pub fn sections(&mut self) -> SequenceSections<'_, 'a, B> {
        SequenceSections {
            reader: self,
            done: false,
        }
    }
}

/// Iterator returned by [`SequenceSectionReader::sections`].
pub struct SequenceSections<'r, 'a, B: AsRef<[u8]>> {
    reader: &'r mut SequenceSectionReader<'a, B>,
    done: bool,
}

impl<'r, 'a, B: AsRef<[u8]>> Iterator for SequenceSections<'r, 'a, B> {
    type Item = crate::Result<MultipartSequenceSection<'a, B>>;

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
