//! RFC 5987 extended parameter values: `charset'language'percent-encoded`.
//!
//! The in-place decoders rewrite the caller's buffer; the decoded bytes are
//! never longer than the encoded ones.

use std::borrow::Cow;

use crate::charset::{is_utf8, CharsetDecoder, EncodingRsDecoder};
use crate::range::ByteRange;

const QUOTE: u8 = b'\'';
const PERCENT: u8 = b'%';

/// The offsets of a parsed `charset'language'value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rfc5987Value {
    charset_end: usize,
    language_start: usize,
    language_len: usize,
    encoded_start: usize,
}

impl Rfc5987Value {
    /// Splits `bytes` at its first two `'`.
    ///
    /// The charset must not be empty. Any further `'` belongs to the encoded
    /// value.
    pub fn parse(bytes: &[u8]) -> Option<Rfc5987Value> {
        let first = memchr::memchr(QUOTE, bytes)?;
        if first == 0 {
            return None;
        }
        let language_start = first + 1;
        let second = language_start + memchr::memchr(QUOTE, &bytes[language_start..])?;

        Some(Rfc5987Value {
            charset_end: first,
            language_start,
            language_len: second - language_start,
            encoded_start: second + 1,
        })
    }

    pub fn charset_end(&self) -> usize {
        self.charset_end
    }

    pub fn language_start(&self) -> usize {
        self.language_start
    }

    pub fn language_len(&self) -> usize {
        self.language_len
    }

    pub fn encoded_start(&self) -> usize {
        self.encoded_start
    }

    /// The charset name, without the trailing `'`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the value this was parsed from.
    pub fn charset<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[..self.charset_end]
    }

    pub fn language(&self) -> ByteRange {
        ByteRange::new(self.language_start, self.language_start + self.language_len)
    }

    /// The percent-encoded part after the second `'`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the value this was parsed from.
    pub fn encoded<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.encoded_start..]
    }

    /// Percent-decodes the encoded part of `bytes` in place and decodes it
    /// with the parsed charset.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the value this was parsed from.
    pub fn decode_in_place<'b, D: CharsetDecoder + ?Sized>(
        &self,
        bytes: &'b mut [u8],
        decoder: &D,
    ) -> Option<Cow<'b, str>> {
        let (head, encoded) = bytes.split_at_mut(self.encoded_start);
        decode_in_place(&head[..self.charset_end], encoded, decoder)
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn percent_byte(bytes: &[u8], at: usize) -> Option<u8> {
    let hi = hex_value(*bytes.get(at + 1)?)?;
    let lo = hex_value(*bytes.get(at + 2)?)?;
    Some(hi << 4 | lo)
}

/// Replaces every `%XX` in `buf` by its byte and returns the decoded length.
///
/// Fails on a truncated or non-hex escape; `buf` is partly rewritten then.
pub fn percent_decode_in_place(buf: &mut [u8]) -> Option<usize> {
    let mut read = 0;
    let mut write = 0;

    while read < buf.len() {
        if buf[read] == PERCENT {
            buf[write] = percent_byte(buf, read)?;
            read += 3;
        } else {
            buf[write] = buf[read];
            read += 1;
        }
        write += 1;
    }

    Some(write)
}

pub fn decode_utf8_in_place(buf: &mut [u8]) -> Option<&str> {
    let len = percent_decode_in_place(buf)?;
    std::str::from_utf8(&buf[..len]).ok()
}

/// Percent-decodes `buf` in place and turns it into text of `charset`.
///
/// UTF-8 borrows straight from `buf`; anything else goes through `decoder`.
pub fn decode_in_place<'b, D: CharsetDecoder + ?Sized>(
    charset: &[u8],
    buf: &'b mut [u8],
    decoder: &D,
) -> Option<Cow<'b, str>> {
    if is_utf8(charset) {
        return decode_utf8_in_place(buf).map(Cow::Borrowed);
    }

    let len = percent_decode_in_place(buf)?;
    decoder.decode(charset, &buf[..len]).map(Cow::Owned)
}

/// Decodes a whole `charset'language'value` string.
///
/// # Examples
///
/// ```
/// assert_eq!(
///     partwise::rfc5987::decode("utf-8''%D0%B8%D0%BC%D1%8F.pdf").as_deref(),
///     Some("имя.pdf")
/// );
/// assert_eq!(partwise::rfc5987::decode("plain.pdf"), None);
/// ```
pub fn decode(input: &str) -> Option<String> {
    decode_with(input, &EncodingRsDecoder)
}

/// Like [`decode`] with a custom charset decoder.
///
/// The input must hold exactly two `'`. Escaped runs are decoded with the
/// charset and literal characters are kept as they are.
pub fn decode_with<D: CharsetDecoder + ?Sized>(input: &str, decoder: &D) -> Option<String> {
    if memchr::memchr_iter(QUOTE, input.as_bytes()).count() != 2 {
        return None;
    }

    let value = Rfc5987Value::parse(input.as_bytes())?;
    let charset = value.charset(input.as_bytes());
    let encoded = &input[value.encoded_start..];
    let bytes = encoded.as_bytes();

    let mut out = String::with_capacity(encoded.len());
    let mut run = Vec::new();
    let mut idx = 0;

    while idx < bytes.len() {
        if bytes[idx] == PERCENT {
            run.push(percent_byte(bytes, idx)?);
            idx += 3;
        } else {
            flush(charset, &mut run, &mut out, decoder)?;
            let ch = encoded[idx..].chars().next()?;
            out.push(ch);
            idx += ch.len_utf8();
        }
    }
    flush(charset, &mut run, &mut out, decoder)?;

    Some(out)
}

fn flush<D: CharsetDecoder + ?Sized>(charset: &[u8], run: &mut Vec<u8>, out: &mut String, decoder: &D) -> Option<()> {
    if run.is_empty() {
        return Some(());
    }

    if is_utf8(charset) {
        out.push_str(std::str::from_utf8(run).ok()?);
    } else {
        out.push_str(&decoder.decode(charset, run)?);
    }
    run.clear();
    Some(())
}

fn is_attr_char(b: u8) -> bool {
    matches!(b,
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
        b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~'
    )
}

/// Encodes `value` as `utf-8''...`, escaping everything but attr-chars.
pub fn encode_utf8(value: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut result = String::with_capacity("utf-8''".len() + value.len() * 3);
    result.push_str("utf-8''");
    for byte in value.bytes() {
        if is_attr_char(byte) {
            result.push(byte as char);
        } else {
            result.push('%');
            result.push(HEX[(byte >> 4) as usize] as char);
            result.push(HEX[(byte & 0x0F) as usize] as char);
        }
    }
    result
}
