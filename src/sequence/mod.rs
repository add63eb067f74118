//! Readers over payloads that arrive as a list of chunks.
//!
//! Every reader here mirrors one of the contiguous readers at the crate root
//! and yields [`ByteSequence`] windows instead of [`ByteRange`](crate::ByteRange)s.
//! Both families produce the same results for the same bytes, however they
//! are split.

pub use self::bytes::{ByteSequence, Chunks, SequencePosition};
pub use self::readers::{
    MultipartSequenceSection, SequenceContentDisposition, SequenceContentDispositionReader, SequenceHeader,
    SequenceHeaderField, SequenceHeaderFieldsReader, SequenceHeadersReader, SequenceSectionReader, SequenceSections,
};

mod bytes;
mod matcher;
mod readers;
