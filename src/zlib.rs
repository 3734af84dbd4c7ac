//! Read the zlib container around a DEFLATE stream.
//!
//! The zlib format (RFC 1950) wraps DEFLATE data in a two-byte header
//! carrying the compression method and window size, and a four-byte
//! big-endian Adler-32 checksum of the uncompressed data.

use log::debug;

use crate::error::{DecodeError, Result};
use crate::inflate;

/// The only compression method defined for zlib: DEFLATE.
const METHOD_DEFLATE: u8 = 8;

/// Largest window a conforming stream may request.
const MAX_WINDOW_SIZE: usize = 32768;

/// Header (CMF/FLG) plus trailer (Adler-32) size in bytes.
const ENVELOPE_LEN: usize = 6;

/// The FDICT bit of the FLG byte.
const FLAG_PRESET_DICTIONARY: u8 = 0x20;

/// Largest prime below 2^16, the Adler-32 modulus.
const ADLER_MODULUS: u32 = 65521;

/// Compute the Adler-32 checksum of `data`.
pub fn adler32(data: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for &value in data {
        a = (a + u32::from(value)) % ADLER_MODULUS;
        b = (b + a) % ADLER_MODULUS;
    }
    (b << 16) | a
}

/// Decode a zlib-wrapped DEFLATE stream into a `Vec<u8>`.
///
/// Validates the header, decompresses the payload against the window size
/// the header declares, and verifies the Adler-32 trailer over the output.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < ENVELOPE_LEN {
        return Err(DecodeError::TruncatedStream);
    }
    let cmf = data[0];
    let flg = data[1];

    let method = cmf & 0x0F;
    if method != METHOD_DEFLATE {
        return Err(DecodeError::UnsupportedMethod(method));
    }
    // The header bytes as a big-endian value must be divisible by 31.
    if (u16::from_be_bytes([cmf, flg])) % 31 != 0 {
        return Err(DecodeError::HeaderChecksumFailed);
    }
    if flg & FLAG_PRESET_DICTIONARY != 0 {
        return Err(DecodeError::PresetDictionaryUnsupported);
    }
    let window_size = 256usize << ((cmf >> 4) & 0x0F);
    if window_size > MAX_WINDOW_SIZE {
        return Err(DecodeError::WindowTooLarge(window_size));
    }
    debug!("zlib header accepted: window_size={window_size}");

    // Payload sits between the header and the 4-byte trailer.
    let payload = &data[2..data.len() - 4];
    let output = inflate::decode(payload, window_size)?;

    let trailer = &data[data.len() - 4..];
    let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let computed = adler32(&output);
    if stored != computed {
        return Err(DecodeError::ChecksumMismatch { stored, computed });
    }
    Ok(output)
}
