//! Gzip framing for bundle payloads.
//!
//! Uploads compress each chunk independently so the server can
//! decompress-and-append chunks as they arrive; downloads hand the caller
//! a lazy decoder over the accumulated payload.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Compresses `raw` into a self-contained gzip stream.
pub(crate) fn gzip_compress(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()
}
