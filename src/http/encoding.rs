//! Response body content encodings.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Returns true when an `Accept-Encoding` value lists `gzip`.
///
/// The value is split into comma separated tokens and any `;q=` parameter is
/// ignored, so `x-gzip` or `gzipped` do not count.
pub fn accepts_gzip(accept_encoding: &str) -> bool {
    accept_encoding
        .split(',')
        .map(|token| token.split(';').next().unwrap_or("").trim())
        .any(|coding| coding.eq_ignore_ascii_case("gzip"))
}

/// Compresses `data` into a complete gzip member at the default level.
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_output_has_magic_bytes() {
        let compressed = gzip(b"abc").unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }
}
