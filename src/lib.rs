//! # zlib/DEFLATE decompression
//! This library decompresses data in the DEFLATE format (RFC 1951) and reads
//! the zlib container around it (RFC 1950). The whole input is expected to be
//! in memory; [`zlib::decode`] validates the container header, inflates the
//! payload block by block, and verifies the Adler-32 trailer, while
//! [`inflate::decode`] handles a bare DEFLATE stream with a caller-chosen
//! window size. Decoding is a pure function of the input bytes: corrupt or
//! truncated input yields a typed [`DecodeError`] and no output.

pub mod bit_stream;

pub mod error;

pub mod huffman;

pub mod inflate;

pub mod window;

pub mod zlib;

pub use error::{DecodeError, Result};
