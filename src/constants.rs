pub(crate) const BOUNDARY_EXT: &[u8] = b"--";
pub(crate) const CRLF: &[u8] = b"\r\n";
pub(crate) const CRLF_CRLF: &[u8] = b"\r\n\r\n";

pub(crate) const HEADER_SEPARATOR: u8 = b':';
pub(crate) const FIELD_SEPARATOR: u8 = b';';
pub(crate) const FIELD_NAME_SEPARATOR: u8 = b'=';
pub(crate) const QUOTE: u8 = b'"';

pub(crate) const CONTENT_DISPOSITION: &[u8] = b"Content-Disposition";
pub(crate) const CONTENT_TYPE: &[u8] = b"Content-Type";

pub(crate) const FORM_DATA: &[u8] = b"form-data";
pub(crate) const ATTACHMENT: &[u8] = b"attachment";

pub(crate) const FIELD_NAME: &[u8] = b"name";
pub(crate) const FIELD_FILE_NAME: &[u8] = b"filename";
pub(crate) const FIELD_FILE_NAME_STAR: &[u8] = b"filename*";
