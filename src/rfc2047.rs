//! RFC 2047 encoded-words with the `B` (base64) encoding, as some clients
//! send them in a quoted `filename`: `"=?utf-8?B?0LjQvNGPLnBkZg==?="`.
//!
//! The `Q` encoding is not supported.

use crate::charset::{is_utf8, CharsetDecoder, EncodingRsDecoder};

const BASE64_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

// `=?` + charset + `?B?` + `?=`, with at least one charset byte.
const MIN_WORD_LEN: usize = 8;

/// Decodes a double-quoted encoded-word.
///
/// # Examples
///
/// ```
/// assert_eq!(
///     partwise::rfc2047::decode("\"=?utf-8?B?0LjQvNGPLnBkZg==?=\"").as_deref(),
///     Some("имя.pdf")
/// );
/// ```
pub fn decode(quoted: &str) -> Option<String> {
    decode_with(quoted, &EncodingRsDecoder)
}

pub fn decode_with<D: CharsetDecoder + ?Sized>(quoted: &str, decoder: &D) -> Option<String> {
    let word = quoted.strip_prefix('"')?.strip_suffix('"')?;
    decode_word_with(word, decoder)
}

/// Decodes an encoded-word without surrounding quotes.
pub fn decode_word(word: &str) -> Option<String> {
    decode_word_with(word, &EncodingRsDecoder)
}

pub fn decode_word_with<D: CharsetDecoder + ?Sized>(word: &str, decoder: &D) -> Option<String> {
    if word.len() < MIN_WORD_LEN {
        return None;
    }

    let mut parts = word.split('?');
    let (open, charset, encoding, data, close) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || open != "=" || close != "=" || charset.is_empty() {
        return None;
    }
    if !encoding.eq_ignore_ascii_case("b") {
        return None;
    }

    let bytes = base64_decode(data)?;
    if is_utf8(charset.as_bytes()) {
        String::from_utf8(bytes).ok()
    } else {
        decoder.decode(charset.as_bytes(), &bytes)
    }
}

pub(crate) fn is_encoded_word(value: &str) -> bool {
    value.len() >= MIN_WORD_LEN && value.starts_with("=?") && value.ends_with("?=")
}

/// Encodes `value` as a `=?utf-8?B?...?=` word.
pub fn encode_utf8(value: &str) -> String {
    format!("=?utf-8?B?{}?=", base64_encode(value.as_bytes()))
}

fn base64_encode(input: &[u8]) -> String {
    let mut result = String::with_capacity((input.len() + 2) / 3 * 4);

    for chunk in input.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        let n = ((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32);

        result.push(BASE64_ALPHABET[(n >> 18 & 0x3F) as usize] as char);
        result.push(BASE64_ALPHABET[(n >> 12 & 0x3F) as usize] as char);

        if chunk.len() > 1 {
            result.push(BASE64_ALPHABET[(n >> 6 & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }

        if chunk.len() > 2 {
            result.push(BASE64_ALPHABET[(n & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
    }

    result
}

// Standard alphabet, padded to a multiple of four, `=` only at the end.
fn base64_decode(input: &str) -> Option<Vec<u8>> {
    let input = input.as_bytes();
    if input.len() % 4 != 0 {
        return None;
    }

    let padding = input.iter().rev().take_while(|&&b| b == b'=').count();
    if padding > 2 {
        return None;
    }

    let mut result = Vec::with_capacity(input.len() / 4 * 3);
    let mut buf: u32 = 0;
    let mut bits: u32 = 0;

    for &b in &input[..input.len() - padding] {
        let val = match b {
            b'A'..=b'Z' => b - b'A',
            b'a'..=b'z' => b - b'a' + 26,
            b'0'..=b'9' => b - b'0' + 52,
            b'+' => 62,
            b'/' => 63,
            _ => return None,
        };

        buf = (buf << 6) | val as u32;
        bits += 6;

        if bits >= 8 {
            bits -= 8;
            result.push((buf >> bits) as u8);
            buf &= (1 << bits) - 1;
        }
    }

    Some(result)
}
