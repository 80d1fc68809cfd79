use std::io::Read;

use flate2::read::MultiGzDecoder;

use battlelens_common::{BattleLensError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Inflate a gzip body, including objects made of concatenated members.
/// Bodies without the gzip header are passed through unchanged, which covers
/// stores that already decoded `Content-Encoding`.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    if !is_gzip(bytes) {
        return Ok(bytes.to_vec());
    }
    let mut out = Vec::with_capacity(bytes.len() * 4);
    MultiGzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| BattleLensError::Decompression(e.to_string()))?;
    Ok(out)
}
