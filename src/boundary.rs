use std::convert::TryFrom;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use derive_more::Display;

use crate::constants;

/// Errors raised while building a [`Boundary`].
#[derive(Debug, Display)]
#[non_exhaustive]
pub enum BoundaryError {
    /// The boundary token is empty (after stripping quotes).
    #[display(fmt = "multipart boundary is empty")]
    Empty,

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// No boundary found in the `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),
}

impl PartialEq for BoundaryError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for BoundaryError {}

impl std::error::Error for BoundaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoundaryError::DecodeContentType(err) => Some(err),
            _ => None,
        }
    }
}

/// The delimiter of a multipart payload.
///
/// Holds `\r\n--token` once; [`as_bytes`](Boundary::as_bytes) is the opening
/// form `--token` and [`with_crlf`](Boundary::with_crlf) is the form that
/// separates one part from the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary {
    bytes: Bytes,
}

impl Boundary {
    /// Builds a boundary from a token, stripping one pair of surrounding
    /// double quotes if present.
    pub fn parse(token: &str) -> Result<Boundary, BoundaryError> {
        Boundary::from_bytes(token.as_bytes())
    }

    pub fn from_bytes(token: &[u8]) -> Result<Boundary, BoundaryError> {
        let token = strip_quotes(token);
        if token.is_empty() {
            return Err(BoundaryError::Empty);
        }

        let mut buf = BytesMut::with_capacity(Boundary::min_capacity(token));
        Boundary::write_into(token, &mut buf);

        Ok(Boundary { bytes: buf.freeze() })
    }

    /// Extracts the boundary from a `multipart/form-data` Content-Type value.
    pub fn from_content_type(content_type: &str) -> Result<Boundary, BoundaryError> {
        let token = parse_boundary(content_type)?;
        Boundary::parse(&token)
    }

    /// Writes `\r\n--token` into `buf`.
    pub fn write_into<B: BufMut>(token: &[u8], buf: &mut B) {
        buf.put_slice(constants::CRLF);
        buf.put_slice(constants::BOUNDARY_EXT);
        buf.put_slice(token);
    }

    /// The number of bytes [`write_into`](Boundary::write_into) writes.
    pub fn min_capacity(token: &[u8]) -> usize {
        constants::CRLF.len() + constants::BOUNDARY_EXT.len() + token.len()
    }

    /// `--token`
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[constants::CRLF.len()..]
    }

    /// `\r\n--token`
    pub fn with_crlf(&self) -> &[u8] {
        &self.bytes
    }

    pub fn token(&self) -> &[u8] {
        &self.bytes[constants::CRLF.len() + constants::BOUNDARY_EXT.len()..]
    }
}

impl FromStr for Boundary {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Boundary::parse(s)
    }
}

impl TryFrom<&str> for Boundary {
    type Error = BoundaryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Boundary::parse(value)
    }
}

impl AsRef<[u8]> for Boundary {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn strip_quotes(token: &[u8]) -> &[u8] {
    match token {
        [constants::QUOTE, inner @ .., constants::QUOTE] => inner,
        _ => token,
    }
}

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// # fn run(){
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(partwise::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String, BoundaryError> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(BoundaryError::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(BoundaryError::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(BoundaryError::NoBoundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary() {
        let content_type = "multipart/form-data; boundary=ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("ABCDEFG".to_owned()));

        let content_type = "multipart/form-data; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("------ABCDEFG".to_owned()));

        let content_type = "boundary=------ABCDEFG";
        assert!(parse_boundary(content_type).is_err());

        let content_type = "text/plain";
        assert_eq!(parse_boundary(content_type), Err(BoundaryError::NoMultipart));

        let content_type = "text/plain; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Err(BoundaryError::NoMultipart));

        let content_type = "multipart/form-data";
        assert_eq!(parse_boundary(content_type), Err(BoundaryError::NoBoundary));
    }

    #[test]
    fn test_parse_boundary_bad_content_type() {
        let err = parse_boundary("multipart/form-data; boundary").unwrap_err();
        assert!(matches!(err, BoundaryError::DecodeContentType(_)));
        assert!(err.to_string().starts_with("Failed to convert Content-Type"));
        assert!(std::error::Error::source(&err).is_some());

        let same = parse_boundary("multipart/form-data; boundary").unwrap_err();
        assert_eq!(err, same);
        assert_ne!(err, BoundaryError::NoBoundary);
    }

    #[test]
    fn test_boundary_error_display() {
        assert_eq!(BoundaryError::Empty.to_string(), "multipart boundary is empty");
        assert_eq!(
            Boundary::parse("\"\"").unwrap_err().to_string(),
            "multipart boundary is empty"
        );
    }

    #[test]
    fn test_boundary_bytes() {
        let boundary = Boundary::parse("B").unwrap();
        assert_eq!(boundary.as_bytes(), b"--B");
        assert_eq!(boundary.with_crlf(), b"\r\n--B");
        assert_eq!(boundary.token(), b"B");

        let boundary: Boundary = "\"----МойБоундари\"".parse().unwrap();
        assert_eq!(boundary.with_crlf(), "\r\n------МойБоундари".as_bytes());
        assert_eq!(boundary.as_bytes(), "------МойБоундари".as_bytes());
    }

    #[test]
    fn test_boundary_empty() {
        assert_eq!(Boundary::parse(""), Err(BoundaryError::Empty));
        assert_eq!(Boundary::parse("\"\""), Err(BoundaryError::Empty));
        assert_eq!(Boundary::parse("\"").unwrap().token(), b"\"");
    }

    #[test]
    fn test_write_into() {
        let mut buf = Vec::new();
        Boundary::write_into(b"X-BOUNDARY", &mut buf);
        assert_eq!(buf, b"\r\n--X-BOUNDARY");
        assert_eq!(Boundary::min_capacity(b"X-BOUNDARY"), buf.len());
    }

    #[test]
    fn test_from_content_type() {
        let boundary = Boundary::from_content_type("multipart/form-data; boundary=\"my boundary\"").unwrap();
        assert_eq!(boundary.as_bytes(), b"--my boundary");
        assert!(Boundary::from_content_type("application/json").is_err());
    }
}
