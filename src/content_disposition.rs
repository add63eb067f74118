use crate::charset::{CharsetDecoder, EncodingRsDecoder};
use crate::constants;
use crate::error::Error;
use crate::header_fields::{to_range, FieldsCore};
use crate::range::ByteRange;
use crate::source::{Source, Span};
use crate::trim::TrimOptions;
use crate::{rfc2047, rfc5987};

const FIELD_ORDER: [&[u8]; 3] = [
    constants::FIELD_NAME,
    constants::FIELD_FILE_NAME,
    constants::FIELD_FILE_NAME_STAR,
];

/// The structured form of a `Content-Disposition` value:
/// `type; name=...; filename=...; filename*=...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDisposition<T = ByteRange> {
    /// The disposition type, e.g. `form-data`.
    pub kind: T,
    pub name: Option<T>,
    pub file_name: Option<T>,
    /// The RFC 5987 `filename*` value, still encoded.
    pub file_name_star: Option<T>,
}

impl<T> ContentDisposition<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> ContentDisposition<U> {
        ContentDisposition {
            kind: f(self.kind),
            name: self.name.map(&mut f),
            file_name: self.file_name.map(&mut f),
            file_name_star: self.file_name_star.map(&mut f),
        }
    }
}

impl ContentDisposition {
    /// Decodes the file name using the bytes this disposition was read from.
    ///
    /// `filename*` wins when it decodes; otherwise `filename` is decoded as an
    /// RFC 2047 encoded-word if it looks like one, or taken as UTF-8 text.
    pub fn decoded_file_name(&self, bytes: &[u8]) -> Option<String> {
        self.decoded_file_name_with(bytes, &EncodingRsDecoder)
    }

    pub fn decoded_file_name_with<D: CharsetDecoder + ?Sized>(&self, bytes: &[u8], decoder: &D) -> Option<String> {
        decode_file_name(
            self.file_name_star.and_then(|range| range.get(bytes)),
            self.file_name.and_then(|range| range.get(bytes)),
            decoder,
        )
    }
}

pub(crate) fn decode_file_name<D: CharsetDecoder + ?Sized>(
    star: Option<&[u8]>,
    plain: Option<&[u8]>,
    decoder: &D,
) -> Option<String> {
    let decoded = star
        .and_then(|star| std::str::from_utf8(star).ok())
        .and_then(|star| rfc5987::decode_with(star, decoder));
    if decoded.is_some() {
        return decoded;
    }

    let plain = std::str::from_utf8(plain?).ok()?;
    if rfc2047::is_encoded_word(plain) {
        if let Some(decoded) = rfc2047::decode_word_with(plain, decoder) {
            return Some(decoded);
        }
    }
    Some(plain.to_owned())
}

type Disposition<P> = ContentDisposition<(P, P)>;

#[derive(Debug, Clone)]
pub(crate) struct DispositionCore<S: Source> {
    fields: FieldsCore<S>,
}

impl<S: Source> DispositionCore<S> {
    pub(crate) fn new(src: S) -> Self {
        DispositionCore {
            fields: FieldsCore::new(src),
        }
    }

    pub(crate) fn source(&self) -> S {
        self.fields.source()
    }

    pub(crate) fn reset(&mut self) {
        self.fields.reset();
    }

    pub(crate) fn read_type(&mut self) -> crate::Result<Option<(S::Pos, S::Pos)>> {
        self.fields.next_value_by_name(b"", TrimOptions::MAX, TrimOptions::MAX)
    }

    pub(crate) fn is_type(&mut self, kind: &[u8]) -> bool {
        match self.read_type() {
            Ok(Some((from, to))) => self.source().equals(from, to, kind),
            _ => false,
        }
    }

    pub(crate) fn read_field(&mut self, name: &[u8]) -> crate::Result<Option<(S::Pos, S::Pos)>> {
        self.fields.next_value_by_name(name, TrimOptions::MAX, TrimOptions::MAX)
    }

    pub(crate) fn find_field(&mut self, name: &[u8]) -> crate::Result<Option<(S::Pos, S::Pos)>> {
        self.fields.find_value_by_name(name, TrimOptions::MAX, TrimOptions::MAX)
    }

    pub(crate) fn read(&mut self) -> crate::Result<Disposition<S::Pos>> {
        self.reset();

        let kind = match self.fields.next_field(TrimOptions::MAX, TrimOptions::MAX)? {
            Some(field) if field.is_unnamed() && field.value.0 < field.value.1 => field.value,
            _ => return Err(Error::ContentDispositionTypeNotFound),
        };

        let mut disposition = ContentDisposition {
            kind,
            name: None,
            file_name: None,
            file_name_star: None,
        };

        let mut expected = 0;
        while let Some(field) = self.fields.next_field(TrimOptions::MAX, TrimOptions::MAX)? {
            // stray `;`
            if field.is_unnamed() && field.value.0 == field.value.1 {
                continue;
            }

            let slot = FIELD_ORDER[expected..]
                .iter()
                .position(|name| self.fields.is_named(&field, name))
                .map(|idx| expected + idx)
                .ok_or(Error::FieldNotMappedOrDuplicatedOrOrderWrong)?;

            let value = Some(field.value);
            match slot {
                0 => disposition.name = value,
                1 => disposition.file_name = value,
                _ => disposition.file_name_star = value,
            }
            expected = slot + 1;
        }

        Ok(disposition)
    }
}

/// Reads a `Content-Disposition` header value into its fields.
///
/// Fields must come in the order `type`, `name`, `filename`, `filename*`;
/// each of the last three is optional. [`read`](ContentDispositionReader::read)
/// rejects anything unknown, repeated or out of order.
///
/// # Examples
///
/// ```
/// use partwise::ContentDispositionReader;
///
/// let value = b"form-data; name=\"upload\"; filename=\"a.txt\"";
/// let disposition = ContentDispositionReader::new(value).read().unwrap();
///
/// assert_eq!(disposition.kind.slice(value), b"form-data");
/// assert_eq!(disposition.name.unwrap().slice(value), b"upload");
/// assert_eq!(disposition.file_name.unwrap().slice(value), b"a.txt");
/// assert!(disposition.file_name_star.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ContentDispositionReader<'a> {
    core: DispositionCore<Span<'a>>,
}

impl<'a> ContentDispositionReader<'a> {
    /// Creates a reader over a `Content-Disposition` value, without the
    /// header name.
    pub fn new(bytes: &'a [u8]) -> ContentDispositionReader<'a> {
        ContentDispositionReader {
            core: DispositionCore::new(Span::new(bytes)),
        }
    }

    /// The value the returned ranges point into.
    pub fn bytes(&self) -> &'a [u8] {
        self.core.source().bytes()
    }

    /// Rewinds to the type token and clears any stored failure.
    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Reads the leading unnamed type token.
    pub fn read_type(&mut self) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.read_type()?.map(to_range))
    }

    /// Reads the type token and compares it with `kind`.
    pub fn is_type(&mut self, kind: &[u8]) -> bool {
        self.core.is_type(kind)
    }

    /// Returns `true` if the type token is `form-data`.
    pub fn is_form_data(&mut self) -> bool {
        self.is_type(constants::FORM_DATA)
    }

    /// Returns `true` if the type token is `attachment`.
    pub fn is_attachment(&mut self) -> bool {
        self.is_type(constants::ATTACHMENT)
    }

    /// Reads the next field if it is `name`.
    pub fn read_name(&mut self) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.read_field(constants::FIELD_NAME)?.map(to_range))
    }

    /// Reads the next field if it is `filename`.
    pub fn read_file_name(&mut self) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.read_field(constants::FIELD_FILE_NAME)?.map(to_range))
    }

    /// Reads the next field if it is `filename*`. The value is still
    /// RFC 5987 encoded; see [`rfc5987`](crate::rfc5987).
    pub fn read_file_name_star(&mut self) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.read_field(constants::FIELD_FILE_NAME_STAR)?.map(to_range))
    }

    /// Searches the remaining fields for `name`, in any order.
    pub fn find_name(&mut self) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.find_field(constants::FIELD_NAME)?.map(to_range))
    }

    /// Searches the remaining fields for `filename`, in any order.
    pub fn find_file_name(&mut self) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.find_field(constants::FIELD_FILE_NAME)?.map(to_range))
    }

    /// Searches the remaining fields for `filename*`, in any order.
    pub fn find_file_name_star(&mut self) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.find_field(constants::FIELD_FILE_NAME_STAR)?.map(to_range))
    }

    /// Reads the whole value from the start.
    pub fn read(&mut self) -> crate::Result<ContentDisposition> {
        Ok(self.core.read()?.map(to_range))
    }

    /// Like [`read`](ContentDispositionReader::read), but returns `None`
    /// instead of the error.
    pub fn try_read(&mut self) -> Option<ContentDisposition> {
        self.read().ok()
    }
}
