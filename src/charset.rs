use encoding_rs::Encoding;

/// Decodes bytes of a named charset into text.
///
/// The codecs only understand UTF-8 on their own; every other charset named
/// by an RFC 5987 value or an RFC 2047 word is handed to a `CharsetDecoder`.
pub trait CharsetDecoder {
    /// Returns `None` when the charset is unknown or `bytes` is malformed.
    fn decode(&self, charset: &[u8], bytes: &[u8]) -> Option<String>;
}

impl<F> CharsetDecoder for F
where
    F: Fn(&[u8], &[u8]) -> Option<String>,
{
    fn decode(&self, charset: &[u8], bytes: &[u8]) -> Option<String> {
        self(charset, bytes)
    }
}

/// The default decoder, backed by [`encoding_rs`] label lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct EncodingRsDecoder;

impl CharsetDecoder for EncodingRsDecoder {
    fn decode(&self, charset: &[u8], bytes: &[u8]) -> Option<String> {
        let encoding = Encoding::for_label(charset)?;
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    }
}

pub(crate) fn is_utf8(charset: &[u8]) -> bool {
    charset.eq_ignore_ascii_case(b"utf-8")
}
