//! Property tests for the readers and codecs.

use partwise::sequence::{ByteSequence, SequenceSectionReader};
use partwise::{rfc2047, rfc5987, Boundary, HeaderFieldsReader, HeadersReader, SectionReader, TrimOptions};
use proptest::prelude::*;

// ========================================
// Strategies
// ========================================

// RFC 2046 bchars, without a trailing space.
fn boundary_token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9'()+_,./:=?-][A-Za-z0-9'()+_,./:=? -]{0,68}[A-Za-z0-9'()+_,./:=?-]|[A-Za-z0-9]"
}

// Bytes that tend to form delimiter lookalikes for the boundary `B`.
fn tricky_body() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(b'\r'), Just(b'\n'), Just(b'-'), Just(b'B'), Just(b'x')],
        0..24,
    )
}

fn header_value() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(b';'), Just(b'"'), Just(b'='), Just(b' '), Just(b'\\'), Just(b'a'), Just(b'b')],
        0..32,
    )
}

fn header_block() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(b'\r'), Just(b'\n'), Just(b':'), Just(b' '), Just(b'A'), Just(b'b')],
        0..32,
    )
}

fn payload(bodies: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (idx, body) in bodies.iter().enumerate() {
        payload.extend_from_slice(b"--B\r\n");
        payload.extend_from_slice(format!("Content-Disposition: form-data; name=\"f{}\"\r\n\r\n", idx).as_bytes());
        payload.extend_from_slice(body);
        payload.extend_from_slice(b"\r\n");
    }
    payload.extend_from_slice(b"--B--\r\n");
    payload
}

type Outcome = Vec<Result<(Vec<u8>, Vec<u8>), partwise::Error>>;

fn contiguous_sections(payload: &[u8], boundary: &Boundary) -> Outcome {
    let mut reader = SectionReader::new(payload, boundary);
    reader
        .sections()
        .map(|section| section.map(|s| (s.headers.slice(payload).to_vec(), s.body.slice(payload).to_vec())))
        .collect()
}

fn sequence_sections(chunks: &[&[u8]], boundary: &Boundary) -> Outcome {
    let mut reader = SequenceSectionReader::new(ByteSequence::new(chunks), boundary);
    reader
        .sections()
        .map(|section| section.map(|s| (s.headers().to_vec(), s.body().to_vec())))
        .collect()
}

fn all_headers(reader: &mut HeadersReader<'_>) -> Vec<Result<(Vec<u8>, Vec<u8>), partwise::Error>> {
    let bytes = reader.bytes();
    let mut found = Vec::new();
    // A failure repeats until reset, so stop at the first one.
    loop {
        match reader.next_header() {
            Ok(Some(header)) => found.push(Ok((header.name.slice(bytes).to_vec(), header.value.slice(bytes).to_vec()))),
            Ok(None) => break,
            Err(err) => {
                found.push(Err(err));
                break;
            }
        }
    }
    found
}

fn split_at_points<'a>(payload: &'a [u8], points: &[usize]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = points.iter().map(|p| p % (payload.len() + 1)).collect();
    points.sort_unstable();

    let mut chunks = Vec::new();
    let mut last = 0;
    for point in points {
        chunks.push(&payload[last..point]);
        last = point;
    }
    chunks.push(&payload[last..]);
    chunks
}

// ========================================
// Boundary
// ========================================

proptest! {
    #[test]
    fn prop_boundary_roundtrip(token in boundary_token(), quoted in any::<bool>()) {
        let text = if quoted { format!("\"{}\"", token) } else { token.clone() };
        let boundary = Boundary::parse(&text).unwrap();

        let mut expected = b"--".to_vec();
        expected.extend_from_slice(token.as_bytes());
        prop_assert_eq!(boundary.as_bytes(), &expected[..]);
        prop_assert_eq!(boundary.token(), token.as_bytes());
        prop_assert!(boundary.with_crlf().starts_with(b"\r\n--"));
    }
}

// ========================================
// TrimOptions
// ========================================

proptest! {
    #[test]
    fn prop_trim_classes(b in any::<u8>()) {
        let maximal = matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r');
        prop_assert_eq!(TrimOptions::MAX.contains(b), maximal);
        prop_assert_eq!(TrimOptions::MIN.contains(b), b == b' ');
    }
}

// ========================================
// HeaderFieldsReader
// ========================================

proptest! {
    #[test]
    fn prop_next_value_is_monotonic(value in header_value()) {
        let mut reader = HeaderFieldsReader::new(&value);
        let mut last_end = 0;
        while let Some(range) = reader.next_value() {
            prop_assert!(range.start >= last_end);
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= value.len());
            last_end = range.end;
        }
    }

    #[test]
    fn prop_reset_is_idempotent(value in header_value(), reads in 0usize..6) {
        let mut reader = HeaderFieldsReader::new(&value);
        for _ in 0..reads {
            let _ = reader.next_field();
        }
        reader.reset();

        let mut fresh = HeaderFieldsReader::new(&value);
        prop_assert_eq!(reader.next_field(), fresh.next_field());
        prop_assert_eq!(reader.offset(), fresh.offset());
    }

    #[test]
    fn prop_headers_reset_is_idempotent(block in header_block(), reads in 0usize..6) {
        let mut reader = HeadersReader::new(&block);
        for _ in 0..reads {
            let _ = reader.next_header();
        }
        reader.reset();

        let mut fresh = HeadersReader::new(&block);
        prop_assert_eq!(reader.offset(), fresh.offset());
        prop_assert_eq!(all_headers(&mut reader), all_headers(&mut fresh));
    }

    #[test]
    fn prop_quoted_separator_is_kept(file_name in "[a-z; ]{0,20}") {
        let value = format!("form-data; filename=\"{}\"; name=x", file_name);
        let mut reader = HeaderFieldsReader::new(value.as_bytes());

        let found = reader.find_value_by_name(b"filename").unwrap().unwrap();
        prop_assert_eq!(found.slice(value.as_bytes()), file_name.as_bytes());
        let name = reader.next_value_by_name(b"name").unwrap().unwrap();
        prop_assert_eq!(name.slice(value.as_bytes()), b"x");
    }
}

// ========================================
// SectionReader
// ========================================

proptest! {
    #[test]
    fn prop_bodies_survive(bodies in prop::collection::vec(tricky_body(), 1..4)) {
        let boundary = Boundary::parse("B").unwrap();
        let payload = payload(&bodies);
        let sections = contiguous_sections(&payload, &boundary);

        // A body holding `\r\n--B` ends its section early; skip those.
        let framed = bodies.iter().all(|body| {
            let mut wrapped = b"\r\n".to_vec();
            wrapped.extend_from_slice(body);
            wrapped.extend_from_slice(b"\r\n");
            !wrapped.windows(5).any(|w| w == b"\r\n--B")
        });
        if framed {
            prop_assert_eq!(sections.len(), bodies.len());
            for (section, body) in sections.iter().zip(&bodies) {
                prop_assert_eq!(&section.as_ref().unwrap().1, body);
            }
        }
    }

    #[test]
    fn prop_section_reset_is_idempotent(
        bodies in prop::collection::vec(tricky_body(), 1..4),
        reads in 0usize..6,
        strict in any::<bool>(),
    ) {
        let boundary = Boundary::parse("B").unwrap();
        let payload = payload(&bodies);

        let mut reader = SectionReader::new(&payload, &boundary).with_strict(strict);
        for _ in 0..reads {
            let _ = reader.next_section();
        }
        reader.reset();

        let mut fresh = SectionReader::new(&payload, &boundary).with_strict(strict);
        prop_assert_eq!(reader.position(), fresh.position());
        let after_reset: Vec<_> = reader.sections().collect();
        let from_start: Vec<_> = fresh.sections().collect();
        prop_assert_eq!(after_reset, from_start);
    }

    #[test]
    fn prop_sequence_reset_is_idempotent(
        bodies in prop::collection::vec(tricky_body(), 1..4),
        points in prop::collection::vec(any::<usize>(), 0..6),
        reads in 0usize..6,
    ) {
        let boundary = Boundary::parse("B").unwrap();
        let payload = payload(&bodies);
        let chunks = split_at_points(&payload, &points);

        let mut reader = SequenceSectionReader::new(ByteSequence::new(&chunks), &boundary);
        for _ in 0..reads {
            let _ = reader.next_section();
        }
        reader.reset();
        prop_assert_eq!(reader.position(), SequenceSectionReader::new(ByteSequence::new(&chunks), &boundary).position());

        let after_reset: Outcome = reader
            .sections()
            .map(|section| section.map(|s| (s.headers().to_vec(), s.body().to_vec())))
            .collect();
        prop_assert_eq!(after_reset, sequence_sections(&chunks, &boundary));
    }

    #[test]
    fn prop_sequence_matches_contiguous(
        bodies in prop::collection::vec(tricky_body(), 1..4),
        points in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let boundary = Boundary::parse("B").unwrap();
        let payload = payload(&bodies);
        let chunks = split_at_points(&payload, &points);

        prop_assert_eq!(sequence_sections(&chunks, &boundary), contiguous_sections(&payload, &boundary));
    }

    #[test]
    fn prop_arbitrary_input_agrees(
        payload in prop::collection::vec(any::<u8>(), 0..64),
        points in prop::collection::vec(any::<usize>(), 0..4),
    ) {
        let boundary = Boundary::parse("B").unwrap();
        let chunks = split_at_points(&payload, &points);

        prop_assert_eq!(sequence_sections(&chunks, &boundary), contiguous_sections(&payload, &boundary));
    }
}

// ========================================
// Codecs
// ========================================

proptest! {
    #[test]
    fn prop_rfc5987_roundtrip(value in "\\PC{0,24}") {
        let encoded = rfc5987::encode_utf8(&value);
        prop_assert_eq!(rfc5987::decode(&encoded), Some(value.clone()));

        let mut buf = encoded.into_bytes();
        let parsed = rfc5987::Rfc5987Value::parse(&buf).unwrap();
        let decoded = parsed.decode_in_place(&mut buf, &partwise::EncodingRsDecoder).unwrap();
        prop_assert_eq!(decoded, value.as_str());
    }

    #[test]
    fn prop_rfc2047_roundtrip(value in "\\PC{0,24}") {
        let word = rfc2047::encode_utf8(&value);
        prop_assert_eq!(rfc2047::decode_word(&word), Some(value.clone()));
        prop_assert_eq!(rfc2047::decode(&format!("\"{}\"", word)), Some(value));
    }
}
