use derive_more::Display;

/// A set of failures and lookup mismatches reported by the readers.
///
/// Every variant is cheap to copy: readers remember the first terminal failure
/// and hand it out again on each later call until they are reset.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// The payload holds no part at all (empty input or `--boundary--`).
    #[display(fmt = "multipart payload contains no sections")]
    SectionsNotFound,

    /// The header block holds no header at all.
    #[display(fmt = "section contains no headers")]
    HeadersNotFound,

    /// The opening `--boundary` is missing (or, in strict mode, is not at the
    /// very start of the payload).
    #[display(fmt = "start boundary not found")]
    StartBoundaryNotFound,

    /// The opening `--boundary` is not followed by `\r\n`.
    #[display(fmt = "CRLF after the start boundary not found")]
    StartBoundaryCRLFNotFound,

    /// No `\r\n--boundary` closes the current part.
    #[display(fmt = "boundary not found")]
    BoundaryNotFound,

    /// A delimiter is followed by neither `\r\n` nor `--`, or the strict close
    /// delimiter is not followed by exactly `\r\n`.
    #[display(fmt = "boundary is not followed by CRLF or '--'")]
    EndBoundaryNotFound,

    /// The blank line between a part's headers and its body is missing.
    #[display(fmt = "section separator '\\r\\n\\r\\n' not found")]
    SectionSeparatorNotFound,

    /// A header line has no `:`.
    #[display(fmt = "header separator ':' not found")]
    HeaderSeparatorNotFound,

    /// A header line starts with `:`.
    #[display(fmt = "header name not found")]
    HeaderNameNotFound,

    /// A header field has an empty name before `=`.
    #[display(fmt = "header field name not found")]
    HeaderFieldNameNotFound,

    /// A quoted header field value is never closed.
    #[display(fmt = "closing quote of header field value not found")]
    HeaderFieldValueEndQuoteNotFound,

    /// A quoted header field value is closed but followed by something other
    /// than `;` or the end of the value.
    #[display(fmt = "closing quote of header field value is followed by unexpected data")]
    HeaderFieldValueEndQuoteInvalid,

    /// The Content-Disposition type token is missing or empty.
    #[display(fmt = "content disposition type not found")]
    ContentDispositionTypeNotFound,

    /// A Content-Disposition field is unknown, repeated or out of the
    /// `type; name; filename; filename*` order.
    #[display(fmt = "content disposition field is not mapped, duplicated or out of order")]
    FieldNotMappedOrDuplicatedOrOrderWrong,

    /// The next header does not have the requested name.
    #[display(fmt = "header name does not match")]
    HeaderNameNotSame,

    /// The next header field does not have the requested name.
    #[display(fmt = "header field name does not match")]
    HeaderFieldNameNotSame,

    /// The next section does not carry the requested Content-Disposition.
    #[display(fmt = "content disposition does not match")]
    ContentDispositionNotSame,
}

impl Error {
    /// Returns the signed status code for this error.
    pub fn status(self) -> ReadingStatus {
        match self {
            Error::SectionsNotFound => ReadingStatus::SectionsNotFound,
            Error::HeadersNotFound => ReadingStatus::HeadersNotFound,
            Error::StartBoundaryNotFound => ReadingStatus::StartBoundaryNotFound,
            Error::StartBoundaryCRLFNotFound => ReadingStatus::StartBoundaryCRLFNotFound,
            Error::BoundaryNotFound => ReadingStatus::BoundaryNotFound,
            Error::EndBoundaryNotFound => ReadingStatus::EndBoundaryNotFound,
            Error::SectionSeparatorNotFound => ReadingStatus::SectionSeparatorNotFound,
            Error::HeaderSeparatorNotFound => ReadingStatus::HeaderSeparatorNotFound,
            Error::HeaderNameNotFound => ReadingStatus::HeaderNameNotFound,
            Error::HeaderFieldNameNotFound => ReadingStatus::HeaderFieldNameNotFound,
            Error::HeaderFieldValueEndQuoteNotFound => ReadingStatus::HeaderFieldValueEndQuoteNotFound,
            Error::HeaderFieldValueEndQuoteInvalid => ReadingStatus::HeaderFieldValueEndQuoteInvalid,
            Error::ContentDispositionTypeNotFound => ReadingStatus::ContentDispositionTypeNotFound,
            Error::FieldNotMappedOrDuplicatedOrOrderWrong => ReadingStatus::FieldNotMappedOrDuplicatedOrOrderWrong,
            Error::HeaderNameNotSame => ReadingStatus::HeaderNameNotSame,
            Error::HeaderFieldNameNotSame => ReadingStatus::HeaderFieldNameNotSame,
            Error::ContentDispositionNotSame => ReadingStatus::ContentDispositionNotSame,
        }
    }

    /// Returns `true` when the input simply held nothing to read.
    pub fn is_exhaustion(self) -> bool {
        matches!(self, Error::SectionsNotFound | Error::HeadersNotFound)
    }

    /// Returns `true` for "found, but not the one asked for" outcomes.
    pub fn is_mismatch(self) -> bool {
        matches!(
            self,
            Error::HeaderNameNotSame | Error::HeaderFieldNameNotSame | Error::ContentDispositionNotSame
        )
    }
}

impl std::error::Error for Error {}

/// The signed status code of a read.
///
/// `Done` and `End` are the two successful outcomes, negative values are
/// structural failures and values above `End` are "nothing there" or
/// "not the one asked for" outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ReadingStatus {
    ContentDispositionTypeNotFound = -31,
    FieldNotMappedOrDuplicatedOrOrderWrong = -30,
    HeaderFieldValueEndQuoteInvalid = -22,
    HeaderFieldValueEndQuoteNotFound = -21,
    HeaderFieldNameNotFound = -20,
    HeaderSeparatorNotFound = -11,
    HeaderNameNotFound = -10,
    EndBoundaryNotFound = -5,
    BoundaryNotFound = -4,
    StartBoundaryCRLFNotFound = -3,
    StartBoundaryNotFound = -2,
    SectionSeparatorNotFound = -1,
    Done = 0,
    End = 1,
    SectionsNotFound = 2,
    HeadersNotFound = 3,
    HeaderNameNotSame = 10,
    HeaderFieldNameNotSame = 20,
    ContentDispositionNotSame = 30,
}

impl ReadingStatus {
    /// Classifies the outcome of a reader call.
    pub fn of<T>(result: &crate::Result<Option<T>>) -> ReadingStatus {
        match result {
            Ok(Some(_)) => ReadingStatus::Done,
            Ok(None) => ReadingStatus::End,
            Err(err) => err.status(),
        }
    }

    /// The raw signed code.
    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn is_failure(self) -> bool {
        self.code() < 0
    }
}

impl From<Error> for ReadingStatus {
    fn from(err: Error) -> Self {
        err.status()
    }
}
