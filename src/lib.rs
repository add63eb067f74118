//! A zero-copy decoder for `multipart/form-data` payloads.
//!
//! The readers never copy the payload: they hand out [`ByteRange`]s into the
//! caller's buffer, or [`ByteSequence`](sequence::ByteSequence) windows when
//! the payload is split into chunks. Every read returns a
//! `Result<Option<T>>`: `Ok(Some(_))` for a value, `Ok(None)` once the input
//! is exhausted and `Err(_)` for malformed input or a failed match. See
//! [`ReadingStatus`] for the numeric form of these outcomes.
//!
//! Besides the multipart framing, the crate decodes the header micro-syntaxes
//! found in form uploads: `;`-separated header fields,
//! `Content-Disposition` values, RFC 5987 `filename*` values ([`rfc5987`])
//! and RFC 2047 encoded-words ([`rfc2047`]).
//!
//! # Examples
//!
//! ```
//! use partwise::{Boundary, ContentDispositionReader, SectionReader};
//!
//! # fn run() -> partwise::Result<()> {
//! let payload = b"--X-BOUNDARY\r\n\
//!     Content-Disposition: form-data; name=\"my_text_field\"\r\n\r\n\
//!     abcd\r\n\
//!     --X-BOUNDARY\r\n\
//!     Content-Disposition: form-data; name=\"my_file_field\"; filename=\"a-text-file.txt\"\r\n\
//!     Content-Type: text/plain\r\n\r\n\
//!     Hello world\r\n\
//!     --X-BOUNDARY--\r\n";
//!
//! let boundary = Boundary::from_content_type("multipart/form-data; boundary=X-BOUNDARY").unwrap();
//! let mut reader = SectionReader::new(payload, &boundary);
//!
//! while let Some(section) = reader.next_section()? {
//!     let mut headers = section.headers_reader(payload);
//!     let value = headers.find_content_disposition()?.unwrap();
//!
//!     let disposition = ContentDispositionReader::new(value.slice(headers.bytes())).read()?;
//!     println!("{:?}: {:?}", disposition, section.body.as_str(payload));
//! }
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! # Optional features
//!
//! * `log`: emits `trace!` records through the [`log`](https://docs.rs/log)
//!   facade when a reader fails or a payload ends.

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (::log::trace!($($t)*););
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {};
}

pub use boundary::{parse_boundary, Boundary, BoundaryError};
pub use charset::{CharsetDecoder, EncodingRsDecoder};
pub use content_disposition::{ContentDisposition, ContentDispositionReader};
pub use error::{Error, ReadingStatus};
pub use header_fields::{HeaderFieldsReader, MultipartHeaderField};
pub use headers::{HeadersReader, MultipartHeader};
pub use range::ByteRange;
pub use section::{MultipartSection, SectionReader, Sections};
pub use trim::{TrimOptions, TrimSide, WhiteSpace};

mod boundary;
mod charset;
mod constants;
mod content_disposition;
mod error;
mod header_fields;
mod headers;
mod range;
pub mod rfc2047;
pub mod rfc5987;
mod section;
pub mod sequence;
mod source;
mod trim;

/// A Result type returned by the readers of this crate.
pub type Result<T> = std::result::Result<T, Error>;
