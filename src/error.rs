//! Error types shared by every stage of the decoder.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = core::result::Result<T, DecodeError>;

/// Everything that can go wrong while decoding a zlib/DEFLATE stream.
///
/// All of these are fatal to the current decode call: there is no recovery
/// and no partial result. Output produced before the failure is discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The zlib header declares a compression method other than DEFLATE.
    #[error("compression method {0} is not deflate")]
    UnsupportedMethod(u8),

    /// The two zlib header bytes fail the mod-31 check.
    #[error("zlib header failed its integrity check")]
    HeaderChecksumFailed,

    /// The FDICT flag is set; preset dictionaries are not supported.
    #[error("preset dictionaries are not supported")]
    PresetDictionaryUnsupported,

    /// The header requests a sliding window larger than 32768 bytes.
    #[error("requested window size {0} exceeds 32768")]
    WindowTooLarge(usize),

    /// Block type 3 is reserved by RFC 1951.
    #[error("reserved block type")]
    ReservedBlockType,

    /// A stored block's LEN and NLEN fields are not one's complements.
    #[error("stored block length check failed: len={len:#06x}, nlen={nlen:#06x}")]
    LengthMismatch { len: u16, nlen: u16 },

    /// A back-reference points further back than the bytes emitted so far.
    #[error("back-reference distance {distance} exceeds {available} bytes of history")]
    InvalidBackReference { distance: usize, available: usize },

    /// A bit pattern does not correspond to any registered Huffman code.
    #[error("bit pattern matches no code in the current tree")]
    UnknownCode,

    /// The compressed stream ended before decoding completed.
    #[error("compressed stream ended prematurely")]
    TruncatedStream,

    /// A code registration conflicts with one already in the tree.
    #[error("conflicting code registration, code set is not prefix-free")]
    DuplicateCode,

    /// A dynamic block header declares more literal/length codes than exist.
    #[error("dynamic header declares {0} literal/length codes, maximum is 286")]
    InvalidCodeCount(usize),

    /// A code-length run repeats with no previous length or overruns the
    /// declared count.
    #[error("invalid code length run in dynamic header")]
    InvalidLengthRun,

    /// The Adler-32 trailer does not match the decoded output.
    #[error("adler-32 mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}
