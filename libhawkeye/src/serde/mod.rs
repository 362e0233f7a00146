use nom::{bytes::complete::take, combinator::map, IResult};
use std::io::{self, Read};

/// Parses a fixed-length, NUL padded text field
pub(crate) fn fixed_string<'a>(len: usize) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], String> {
    move |input: &'a [u8]| map(take(len), text_from_bytes)(input)
}

/// Decodes text up to the first NUL, dropping trailing whitespace
pub(crate) fn text_from_bytes(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_owned()
}

/// Appends `text` as a fixed-length field, truncated or NUL padded to `len` bytes
pub(crate) fn put_fixed_string(out: &mut Vec<u8>, text: &str, len: usize) {
    let bytes = text.as_bytes();
    let n = bytes.len().min(len);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + (len - n), 0);
}

/// Renders a nom failure for error messages
pub(crate) fn nom_reason(e: &nom::Err<nom::error::Error<&[u8]>>) -> String {
    match e {
        nom::Err::Incomplete(_) => "unexpected end of data".to_owned(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            format!("{:?} with {} bytes left", e.code, e.input.len())
        }
    }
}

/// Reads into `buf` until it is full or the reader is exhausted, returning the bytes read
///
/// Unlike [`Read::read_exact`] this tells an empty read (end of file) apart from a short one.
pub(crate) fn read_full(r: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_strings_stop_at_nul() {
        let input = b"Depth\0\0\0garbage!";
        let (rest, text) = fixed_string(8)(input).unwrap();
        assert_eq!(text, "Depth");
        assert_eq!(rest, b"garbage!");
    }

    #[test]
    fn fixed_strings_are_padded_and_truncated() {
        let mut out = Vec::new();
        put_fixed_string(&mut out, "WGS84", 8);
        put_fixed_string(&mut out, "METERS_AND_MORE", 4);
        assert_eq!(out, b"WGS84\0\0\0METE");
    }

    #[test]
    fn read_full_reports_short_reads() {
        let data = [1u8, 2, 3];
        let mut buf = [0; 5];
        assert_eq!(read_full(&mut &data[..], &mut buf).unwrap(), 3);
        assert_eq!(read_full(&mut &[][..], &mut buf).unwrap(), 0);
    }
}
