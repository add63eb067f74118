use crate::constants;
use crate::error::Error;
use crate::range::ByteRange;
use crate::source::{Source, Span};
use crate::trim::{TrimOptions, WhiteSpace};

/// One `;`-separated field of a header value, e.g. `name="file"` in a
/// `Content-Disposition` value.
///
/// `name` is `None` for a bare token such as the disposition type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultipartHeaderField<T = ByteRange> {
    pub name: Option<T>,
    pub value: T,
}

impl<T> MultipartHeaderField<T> {
    pub fn is_unnamed(&self) -> bool {
        self.name.is_none()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> MultipartHeaderField<U> {
        MultipartHeaderField {
            name: self.name.map(&mut f),
            value: f(self.value),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FieldsCore<S: Source> {
    src: S,
    cursor: Option<S::Pos>,
    failed: Option<Error>,
}

type Field<P> = MultipartHeaderField<(P, P)>;

impl<S: Source> FieldsCore<S> {
    pub(crate) fn new(src: S) -> Self {
        FieldsCore {
            src,
            cursor: Some(src.start()),
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
        self.failed = None;
    }

    pub(crate) fn next_value(&mut self, trim: TrimOptions) -> Option<(S::Pos, S::Pos)> {
        if self.failed.is_some() {
            return None;
        }

        let start = self.cursor?;
        if start >= self.src.end() {
            self.cursor = None;
            return None;
        }

        let end = match self.find_separator(start) {
            Some(sep) => {
                self.cursor = Some(self.src.next_pos(sep));
                sep
            }
            None => {
                self.cursor = None;
                self.src.end()
            }
        };

        Some(self.src.trim(start, end, trim))
    }

    // A quote only opens a quoted-string at the start of a token or right
    // after `=`, ignoring whitespace.
    fn find_separator(&self, from: S::Pos) -> Option<S::Pos> {
        let mut pos = from;
        let mut at_value_start = true;
        let mut quoted = false;

        while let Some(b) = self.src.byte_at(pos) {
            if quoted {
                if b == constants::QUOTE {
                    quoted = false;
                }
            } else {
                match b {
                    constants::FIELD_SEPARATOR => return Some(pos),
                    constants::QUOTE if at_value_start => {
                        quoted = true;
                        at_value_start = false;
                    }
                    constants::FIELD_NAME_SEPARATOR => at_value_start = true,
                    b if WhiteSpace::Maximal.contains(b) => {}
                    _ => at_value_start = false,
                }
            }
            pos = self.src.next_pos(pos);
        }

        None
    }

    pub(crate) fn next_field(&mut self, trim: TrimOptions, trim_field: TrimOptions) -> crate::Result<Option<Field<S::Pos>>> {
        if let Some(err) = self.failed {
            return Err(err);
        }

        let (from, to) = match self.next_value(trim) {
            Some(token) => token,
            None => return Ok(None),
        };

        if from < to && self.src.byte_at(from) == Some(constants::QUOTE) {
            return Ok(Some(MultipartHeaderField {
                name: None,
                value: self.strip_quotes(from, to).unwrap_or((from, to)),
            }));
        }

        let eq = match self.src.find(&[constants::FIELD_NAME_SEPARATOR], from, to) {
            Some(eq) => eq,
            None => {
                return Ok(Some(MultipartHeaderField {
                    name: None,
                    value: (from, to),
                }))
            }
        };

        let name = self.src.trim(from, eq, trim_field);
        if name.0 == name.1 {
            return Err(self.fail(Error::HeaderFieldNameNotFound));
        }

        let (value_from, value_to) = self.src.trim(self.src.next_pos(eq), to, trim_field);
        let value = if value_from < value_to && self.src.byte_at(value_from) == Some(constants::QUOTE) {
            match self.strip_quotes(value_from, value_to) {
                Some(value) => value,
                None => self.read_quoted(value_from)?,
            }
        } else {
            (value_from, value_to)
        };

        Ok(Some(MultipartHeaderField {
            name: Some(name),
            value,
        }))
    }

    fn strip_quotes(&self, from: S::Pos, to: S::Pos) -> Option<(S::Pos, S::Pos)> {
        let last = self.src.prev_pos(to);
        if last > from && self.src.byte_at(last) == Some(constants::QUOTE) {
            Some((self.src.next_pos(from), last))
        } else {
            None
        }
    }

    // The token ended before the closing quote (or the closing quote is
    // followed by junk), so scan the rest of the input for it.
    fn read_quoted(&mut self, open: S::Pos) -> crate::Result<(S::Pos, S::Pos)> {
        let src = self.src;
        let mut pos = src.next_pos(open);

        let close = loop {
            match src.byte_at(pos) {
                None => return Err(self.fail(Error::HeaderFieldValueEndQuoteNotFound)),
                Some(constants::QUOTE) => break pos,
                Some(_) => pos = src.next_pos(pos),
            }
        };

        let after = src.trim_start(src.next_pos(close), src.end(), WhiteSpace::Maximal);
        match src.byte_at(after) {
            None => self.cursor = None,
            Some(constants::FIELD_SEPARATOR) => self.cursor = Some(src.next_pos(after)),
            Some(_) => return Err(self.fail(Error::HeaderFieldValueEndQuoteInvalid)),
        }

        Ok((src.next_pos(open), close))
    }

    fn fail(&mut self, err: Error) -> Error {
        self.failed = Some(err);
        err
    }

    pub(crate) fn is_named(&self, field: &Field<S::Pos>, name: &[u8]) -> bool {
        match field.name {
            None => name.is_empty(),
            Some((from, to)) => !name.is_empty() && self.src.equals(from, to, name),
        }
    }

    pub(crate) fn next_value_by_name(
        &mut self,
        name: &[u8],
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<(S::Pos, S::Pos)>> {
        let cursor = self.cursor;
        match self.next_field(trim, trim_field)? {
            Some(field) if self.is_named(&field, name) => Ok(Some(field.value)),
            Some(_) => {
                self.cursor = cursor;
                Err(Error::HeaderFieldNameNotSame)
            }
            None => Ok(None),
        }
    }

    pub(crate) fn find_value_by_name(
        &mut self,
        name: &[u8],
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<(S::Pos, S::Pos)>> {
        while let Some(field) = self.next_field(trim, trim_field)? {
            if self.is_named(&field, name) {
                return Ok(Some(field.value));
            }
        }
        Ok(None)
    }
}

pub(crate) fn to_range((start, end): (usize, usize)) -> ByteRange {
    ByteRange::new(start, end)
}

/// Reads the `;`-separated fields of a single header value.
///
/// Quoted-strings are honoured: a `;` inside `"..."` never splits a field.
/// There is no escape character, the next `"` always closes the string.
///
/// # Examples
///
/// ```
/// use partwise::HeaderFieldsReader;
///
/// let value = b"form-data; name=\"file\"; filename=\"a;b.txt\"";
/// let mut reader = HeaderFieldsReader::new(value);
///
/// let kind = reader.next_field().unwrap().unwrap();
/// assert!(kind.is_unnamed());
/// assert_eq!(kind.value.slice(value), b"form-data");
///
/// let name = reader.find_value_by_name(b"filename").unwrap().unwrap();
/// assert_eq!(name.slice(value), b"a;b.txt");
/// ```
#[derive(Debug, Clone)]
pub struct HeaderFieldsReader<'a> {
    core: FieldsCore<Span<'a>>,
}

impl<'a> HeaderFieldsReader<'a> {
    pub fn new(bytes: &'a [u8]) -> HeaderFieldsReader<'a> {
        HeaderFieldsReader {
            core: FieldsCore::new(Span::new(bytes)),
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.core.source().bytes()
    }

    /// The offset of the next unread byte, `None` once the input is exhausted.
    pub fn offset(&self) -> Option<usize> {
        self.core.cursor()
    }

    /// Rewinds to the start of the value and forgets any failure.
    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Returns the next raw `;`-separated token, trimmed with [`TrimOptions::MAX`].
    pub fn next_value(&mut self) -> Option<ByteRange> {
        self.next_value_with(TrimOptions::MAX)
    }

    pub fn next_value_with(&mut self, trim: TrimOptions) -> Option<ByteRange> {
        self.core.next_value(trim).map(to_range)
    }

    /// Returns the next field split into name and value.
    pub fn next_field(&mut self) -> crate::Result<Option<MultipartHeaderField>> {
        self.next_field_with(TrimOptions::MAX, TrimOptions::MAX)
    }

    /// Like [`next_field`](HeaderFieldsReader::next_field); `trim` applies to
    /// the whole token and `trim_field` to the name and the value around `=`.
    pub fn next_field_with(
        &mut self,
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<MultipartHeaderField>> {
        Ok(self.core.next_field(trim, trim_field)?.map(|field| field.map(to_range)))
    }

    /// Reads the next field and returns its value if it is called `name`.
    ///
    /// An empty `name` matches an unnamed field. On a mismatch the field is
    /// left unread and [`Error::HeaderFieldNameNotSame`] is returned.
    pub fn next_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteRange>> {
        self.next_value_by_name_with(name, TrimOptions::MAX, TrimOptions::MAX)
    }

    pub fn next_value_by_name_with(
        &mut self,
        name: &[u8],
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.next_value_by_name(name, trim, trim_field)?.map(to_range))
    }

    /// Skips fields until one called `name` is found.
    pub fn find_value_by_name(&mut self, name: &[u8]) -> crate::Result<Option<ByteRange>> {
        self.find_value_by_name_with(name, TrimOptions::MAX, TrimOptions::MAX)
    }

    pub fn find_value_by_name_with(
        &mut self,
        name: &[u8],
        trim: TrimOptions,
        trim_field: TrimOptions,
    ) -> crate::Result<Option<ByteRange>> {
        Ok(self.core.find_value_by_name(name, trim, trim_field)?.map(to_range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(input: &[u8]) -> Vec<&[u8]> {
        let mut reader = HeaderFieldsReader::new(input);
        let mut values = Vec::new();
        while let Some(value) = reader.next_value() {
            values.push(value.slice(input));
        }
        values
    }

    #[test]
    fn test_next_value() {
        assert_eq!(values(b"a; b ;c"), vec![&b"a"[..], b"b", b"c"]);
        assert_eq!(values(b"a;"), vec![&b"a"[..]]);
        assert_eq!(values(b" ; "), vec![&b""[..], b""]);
        assert!(values(b"").is_empty());
        assert_eq!(values(b"filename=\"a;b;c\"; x"), vec![&b"filename=\"a;b;c\""[..], b"x"]);
        assert_eq!(values(b"a=\"x\\\";y\";b"), vec![&b"a=\"x\\\""[..], b"y\"", b"b"]);
        assert_eq!(values(b"a\"b;c"), vec![&b"a\"b"[..], b"c"]);
        assert_eq!(values(b"a=\"b;c"), vec![&b"a=\"b;c"[..]]);
    }

    #[test]
    fn test_next_value_stays_exhausted() {
        let mut reader = HeaderFieldsReader::new(b"a");
        assert!(reader.next_value().is_some());
        assert_eq!(reader.offset(), None);
        assert_eq!(reader.next_value(), None);
        assert_eq!(reader.next_value(), None);

        reader.reset();
        assert_eq!(reader.next_value(), Some(ByteRange::new(0, 1)));
    }

    #[test]
    fn test_next_value_ranges_are_ordered() {
        let input = b" a ; b=\"1;2\" ;; c ";
        let mut reader = HeaderFieldsReader::new(input);
        let mut last = 0;
        while let Some(value) = reader.next_value() {
            assert!(value.start >= last);
            assert!(value.end >= value.start);
            last = value.end;
        }
    }

    #[test]
    fn test_next_field() {
        let input = b" form-data; name=\"transform\"; filename=\"Transform-utf8.xsl\"";
        let mut reader = HeaderFieldsReader::new(input);

        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.name, None);
        assert_eq!(field.value.slice(input), b"form-data");

        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.name.unwrap().slice(input), b"name");
        assert_eq!(field.value.slice(input), b"transform");

        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.name.unwrap().slice(input), b"filename");
        assert_eq!(field.value.slice(input), b"Transform-utf8.xsl");

        assert_eq!(reader.next_field(), Ok(None));
        assert_eq!(reader.next_field(), Ok(None));
    }

    #[test]
    fn test_next_field_white_space() {
        let input = b" \r\n\t form-data \r\n\t ; \r\n\t name \r\n\t = \r\n\t \"transform\" \r\n\t ";
        let mut reader = HeaderFieldsReader::new(input);

        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.value.slice(input), b"form-data");

        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.name.unwrap().slice(input), b"name");
        assert_eq!(field.value.slice(input), b"transform");

        let mut reader = HeaderFieldsReader::new(input);
        reader.next_field_with(TrimOptions::MAX, TrimOptions::NONE).unwrap();
        let field = reader.next_field_with(TrimOptions::NONE, TrimOptions::NONE).unwrap().unwrap();
        assert_eq!(field.name.unwrap().slice(input), b" \r\n\t name \r\n\t ");
        assert_eq!(field.value.slice(input), b" \r\n\t \"transform\" \r\n\t ");
    }

    #[test]
    fn test_quoted_separator_is_kept() {
        let input = b"form-data; filename=\"a;b;c\"";
        let mut reader = HeaderFieldsReader::new(input);
        let value = reader.find_value_by_name(b"filename").unwrap().unwrap();
        assert_eq!(value.slice(input), b"a;b;c");
    }

    #[test]
    fn test_quoted_unnamed_field() {
        let input = b"\"form-data\"; name=x";
        let mut reader = HeaderFieldsReader::new(input);
        let field = reader.next_field().unwrap().unwrap();
        assert!(field.is_unnamed());
        assert_eq!(field.value.slice(input), b"form-data");
    }

    #[test]
    fn test_name_not_found() {
        let mut reader = HeaderFieldsReader::new(b"=val");
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldNameNotFound));
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldNameNotFound));
        assert_eq!(reader.next_value(), None);

        let mut reader = HeaderFieldsReader::new(b"a;  =val");
        assert!(reader.next_field().unwrap().is_some());
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldNameNotFound));

        reader.reset();
        assert!(reader.next_field().unwrap().is_some());
    }

    #[test]
    fn test_end_quote_not_found() {
        let mut reader = HeaderFieldsReader::new(b"form-data; name=\"abc; filename=x");
        assert!(reader.next_field().unwrap().is_some());
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldValueEndQuoteNotFound));
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldValueEndQuoteNotFound));

        let mut reader = HeaderFieldsReader::new(b"name=\"abc\\");
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldValueEndQuoteNotFound));
    }

    #[test]
    fn test_backslash_is_not_an_escape() {
        let input = b"form-data; name=\"a\\\"; filename=\"b.txt\"";
        let mut reader = HeaderFieldsReader::new(input);
        assert!(reader.next_field().unwrap().unwrap().is_unnamed());

        let name = reader.next_field().unwrap().unwrap();
        assert_eq!(name.name.unwrap().slice(input), b"name");
        assert_eq!(name.value.slice(input), b"a\\");

        let file_name = reader.next_field().unwrap().unwrap();
        assert_eq!(file_name.name.unwrap().slice(input), b"filename");
        assert_eq!(file_name.value.slice(input), b"b.txt");
        assert_eq!(reader.next_field(), Ok(None));
    }

    #[test]
    fn test_end_quote_invalid() {
        let mut reader = HeaderFieldsReader::new(b"name=\"abc\" x; filename=y");
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldValueEndQuoteInvalid));
        assert_eq!(reader.next_field(), Err(Error::HeaderFieldValueEndQuoteInvalid));
    }

    #[test]
    fn test_end_quote_followed_by_white_space() {
        let input = b"name=\"abc\" \t; filename=y";
        let mut reader = HeaderFieldsReader::new(input);
        let field = reader.next_field_with(TrimOptions::NONE, TrimOptions::NONE).unwrap().unwrap();
        assert_eq!(field.value.slice(input), b"abc");
        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.name.unwrap().slice(input), b"filename");
        assert_eq!(field.value.slice(input), b"y");
        assert_eq!(reader.next_field(), Ok(None));
    }

    #[test]
    fn test_next_value_by_name() {
        let input = b"form-data; name=a; filename=b";
        let mut reader = HeaderFieldsReader::new(input);

        assert_eq!(reader.next_value_by_name(b"").unwrap().unwrap().slice(input), b"form-data");
        assert_eq!(reader.next_value_by_name(b"filename"), Err(Error::HeaderFieldNameNotSame));
        assert_eq!(reader.next_value_by_name(b""), Err(Error::HeaderFieldNameNotSame));
        assert_eq!(reader.next_value_by_name(b"Name"), Err(Error::HeaderFieldNameNotSame));
        assert_eq!(reader.next_value_by_name(b"name").unwrap().unwrap().slice(input), b"a");
        assert_eq!(reader.next_value_by_name(b"filename").unwrap().unwrap().slice(input), b"b");
        assert_eq!(reader.next_value_by_name(b"filename"), Ok(None));
    }

    #[test]
    fn test_find_value_by_name() {
        let input = b"form-data; filename*=utf-8''x; name=a";
        let mut reader = HeaderFieldsReader::new(input);

        assert_eq!(reader.find_value_by_name(b"name").unwrap().unwrap().slice(input), b"a");
        assert_eq!(reader.find_value_by_name(b"filename*"), Ok(None));

        reader.reset();
        assert_eq!(
            reader.find_value_by_name(b"filename*").unwrap().unwrap().slice(input),
            b"utf-8''x"
        );
        assert_eq!(reader.find_value_by_name(b"filename"), Ok(None));
    }
}
