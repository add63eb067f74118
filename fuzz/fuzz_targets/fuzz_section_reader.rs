#![no_main]

use libfuzzer_sys::fuzz_target;
use partwise::sequence::{ByteSequence, SequenceSectionReader};
use partwise::{Boundary, ContentDispositionReader, SectionReader};

fuzz_target!(|data: &[u8]| {
    let boundary = Boundary::parse("X-BOUNDARY").expect("boundary");

    for strict in [true, false] {
        let mut reader = SectionReader::new(data, &boundary).with_strict(strict);
        let mut contiguous = Vec::new();
        for section in reader.sections() {
            let section = match section {
                Ok(section) => section,
                Err(err) => {
                    contiguous.push(Err(err));
                    break;
                }
            };

            let mut headers = section.headers_reader(data);
            while let Ok(Some(header)) = headers.next_header() {
                let value = header.value.slice(headers.bytes());
                if let Some(disposition) = ContentDispositionReader::new(value).try_read() {
                    let _ = disposition.decoded_file_name(value);
                }
            }
            contiguous.push(Ok(section.body.slice(data).to_vec()));
        }

        let (head, tail) = data.split_at(data.len() / 2);
        let chunks = [head, tail];
        let mut reader = SequenceSectionReader::new(ByteSequence::new(&chunks), &boundary).with_strict(strict);
        let chunked: Vec<_> = reader
            .sections()
            .map(|section| section.map(|section| section.body().to_vec()))
            .collect();

        assert_eq!(contiguous, chunked);
    }
});
