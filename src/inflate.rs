//! Decompress data compressed with the DEFLATE algorithm.
//!
//! The DEFLATE format (RFC 1951) is a sequence of blocks, each either stored
//! verbatim, compressed with a fixed Huffman code, or compressed with a
//! Huffman code transmitted in the block header. Back-references within the
//! compressed data are resolved against a sliding window of the most recent
//! output.

use std::sync::OnceLock;

use log::{debug, trace};

use crate::bit_stream::BitReader;
use crate::error::{DecodeError, Result};
use crate::huffman::CanonicalHuffmanTree;
use crate::window::SlidingWindow;

// Block header fields.

const BFINAL_LEN: usize = 1;
const BFINAL_VALUE: u32 = 1;

const BTYPE_LEN: usize = 2;
const BTYPE_NO_COMPRESSION: u32 = 0b00;
const BTYPE_FIXED_HUFFMAN: u32 = 0b01;
const BTYPE_DYNAMIC_HUFFMAN: u32 = 0b10;

const STORED_LEN_BITS: usize = 16;

// Literal/length alphabet layout.

const LITERAL_CODE_MAX: u16 = 255;
const END_BLOCK_CODE: u16 = 256;
const LENGTH_CODE_BASE: u16 = 257;
const LENGTH_CODE_MAX: u16 = 285;

// Dynamic block header fields.

const HLIT_LEN: usize = 5;
const HLIT_BASE: usize = 257;
const HLIT_MAX: usize = 286;
const HDIST_LEN: usize = 5;
const HDIST_BASE: usize = 1;
const HCLEN_LEN: usize = 4;
const HCLEN_BASE: usize = 4;

const CODE_LENGTH_ALPHABET_SIZE: usize = 19;
const CODE_LENGTH_BITS: usize = 3;

const FIXED_DISTANCE_BITS: usize = 5;

/// Length code table for DEFLATE.
/// `LENGTH_CODE_TABLE[i] = (length_code, length_base, extra_bits)`
const LENGTH_CODE_TABLE: &[(u16, usize, usize)] = &[
    (257, 3, 0),
    (258, 4, 0),
    (259, 5, 0),
    (260, 6, 0),
    (261, 7, 0),
    (262, 8, 0),
    (263, 9, 0),
    (264, 10, 0),
    (265, 11, 1),
    (266, 13, 1),
    (267, 15, 1),
    (268, 17, 1),
    (269, 19, 2),
    (270, 23, 2),
    (271, 27, 2),
    (272, 31, 2),
    (273, 35, 3),
    (274, 43, 3),
    (275, 51, 3),
    (276, 59, 3),
    (277, 67, 4),
    (278, 83, 4),
    (279, 99, 4),
    (280, 115, 4),
    (281, 131, 5),
    (282, 163, 5),
    (283, 195, 5),
    (284, 227, 5),
    (285, 258, 0),
];

/// Distance code table for DEFLATE.
/// `DISTANCE_CODE_TABLE[i] = (distance_code, distance_base, extra_bits)`
const DISTANCE_CODE_TABLE: &[(u16, usize, usize)] = &[
    (0, 1, 0),
    (1, 2, 0),
    (2, 3, 0),
    (3, 4, 0),
    (4, 5, 1),
    (5, 7, 1),
    (6, 9, 2),
    (7, 13, 2),
    (8, 17, 3),
    (9, 25, 3),
    (10, 33, 4),
    (11, 49, 4),
    (12, 65, 5),
    (13, 97, 5),
    (14, 129, 6),
    (15, 193, 6),
    (16, 257, 7),
    (17, 385, 7),
    (18, 513, 8),
    (19, 769, 8),
    (20, 1025, 9),
    (21, 1537, 9),
    (22, 2049, 10),
    (23, 3073, 10),
    (24, 4097, 11),
    (25, 6145, 11),
    (26, 8193, 12),
    (27, 12289, 12),
    (28, 16385, 13),
    (29, 24577, 13),
];

/// Order in which the 19 code-length code lengths are transmitted.
/// Rarely used lengths come last so trailing zeros can be omitted.
/// Defined in RFC 1951, section 3.2.7.
const CODE_LENGTH_ORDER: [usize; CODE_LENGTH_ALPHABET_SIZE] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Get the length of the repeated data by the length code.
/// This function reads the extra bits if needed.
fn get_length_by_code(code: u16, bit_reader: &mut BitReader) -> Result<usize> {
    let (length_code, length_base, extra_bits) = LENGTH_CODE_TABLE
        .get((code - LENGTH_CODE_BASE) as usize)
        .copied()
        .ok_or(DecodeError::UnknownCode)?;
    assert!(length_code == code);
    Ok(length_base + bit_reader.read_bits(extra_bits)? as usize)
}

/// Get the distance of the repeated data by the distance code.
/// This function reads the extra bits if needed.
fn get_distance_by_code(code: u16, bit_reader: &mut BitReader) -> Result<usize> {
    let (distance_code, distance_base, extra_bits) = DISTANCE_CODE_TABLE
        .get(code as usize)
        .copied()
        .ok_or(DecodeError::UnknownCode)?;
    assert!(distance_code == code);
    Ok(distance_base + bit_reader.read_bits(extra_bits)? as usize)
}

/// The fixed literal/length tree of RFC 1951, section 3.2.6.
/// Built on first use and shared for the lifetime of the process.
fn fixed_literal_tree() -> &'static CanonicalHuffmanTree {
    static TREE: OnceLock<CanonicalHuffmanTree> = OnceLock::new();
    TREE.get_or_init(|| {
        let mut code_lengths = [0u8; 288];
        code_lengths[0..144].fill(8);
        code_lengths[144..256].fill(9);
        code_lengths[256..280].fill(7);
        code_lengths[280..288].fill(8);
        CanonicalHuffmanTree::from_code_lengths(&code_lengths)
            .expect("the fixed code lengths form a complete canonical code")
    })
}

/// Where a block's distance codes come from: fixed blocks carry a raw 5-bit
/// field (not Huffman-coded), dynamic blocks a transmitted tree.
enum DistanceCodes<'a> {
    FixedField,
    Tree(&'a CanonicalHuffmanTree),
}

impl DistanceCodes<'_> {
    fn next(&self, bit_reader: &mut BitReader) -> Result<u16> {
        match self {
            // The fixed field is packed in code bit order.
            DistanceCodes::FixedField => {
                Ok(bit_reader.read_code_bits(FIXED_DISTANCE_BITS)? as u16)
            }
            DistanceCodes::Tree(tree) => tree.decode(bit_reader),
        }
    }
}

/// Inflate one compressed block, resolving back-references through `window`.
/// Because a back-reference may reach into a previous block, the window is
/// shared across all blocks of the stream.
fn inflate_compressed_block(
    bit_reader: &mut BitReader,
    window: &mut SlidingWindow,
    output: &mut Vec<u8>,
    literal_tree: &CanonicalHuffmanTree,
    distance_codes: DistanceCodes,
) -> Result<()> {
    loop {
        let symbol = literal_tree.decode(bit_reader)?;
        match symbol {
            END_BLOCK_CODE => break,
            0..=LITERAL_CODE_MAX => {
                output.push(symbol as u8);
                window.push(symbol as u8);
            }
            LENGTH_CODE_BASE..=LENGTH_CODE_MAX => {
                let length = get_length_by_code(symbol, bit_reader)?;
                let distance_code = distance_codes.next(bit_reader)?;
                let distance = get_distance_by_code(distance_code, bit_reader)?;
                let pattern = window.copy_run(length, distance)?;
                output.extend_from_slice(&pattern);
            }
            // 286 and 287 are reserved and never appear in a valid stream.
            _ => return Err(DecodeError::UnknownCode),
        }
    }
    Ok(())
}

/// Copy a stored (uncompressed) block straight to the output.
fn inflate_stored_block(
    bit_reader: &mut BitReader,
    window: &mut SlidingWindow,
    output: &mut Vec<u8>,
) -> Result<()> {
    bit_reader.skip_to_byte_boundary();
    let len = bit_reader.read_bits(STORED_LEN_BITS)? as u16;
    let nlen = bit_reader.read_bits(STORED_LEN_BITS)? as u16;
    if len != !nlen {
        return Err(DecodeError::LengthMismatch { len, nlen });
    }
    trace!("stored block: len={len}");

    for _ in 0..len {
        let value = bit_reader.read_byte()?;
        output.push(value);
        window.push(value);
    }
    Ok(())
}

/// Read the two Huffman trees of a dynamic block header.
/// Defined in RFC 1951, section 3.2.7.
fn read_dynamic_huffman_trees(
    bit_reader: &mut BitReader,
) -> Result<(CanonicalHuffmanTree, CanonicalHuffmanTree)> {
    let hlit = bit_reader.read_bits(HLIT_LEN)? as usize + HLIT_BASE;
    let hdist = bit_reader.read_bits(HDIST_LEN)? as usize + HDIST_BASE;
    let hclen = bit_reader.read_bits(HCLEN_LEN)? as usize + HCLEN_BASE;
    debug!("dynamic block: hlit={hlit}, hdist={hdist}, hclen={hclen}");

    if hlit > HLIT_MAX {
        return Err(DecodeError::InvalidCodeCount(hlit));
    }

    // The code-length code lengths arrive in the permuted order; entries
    // beyond HCLEN stay zero.
    let mut code_length_lengths = [0u8; CODE_LENGTH_ALPHABET_SIZE];
    for &index in CODE_LENGTH_ORDER.iter().take(hclen) {
        code_length_lengths[index] = bit_reader.read_bits(CODE_LENGTH_BITS)? as u8;
    }
    let code_length_tree = CanonicalHuffmanTree::from_code_lengths(&code_length_lengths)?;

    // One run-length coded array covers both trees; runs may cross the
    // boundary between them.
    let code_lengths = read_code_lengths(bit_reader, &code_length_tree, hlit + hdist)?;

    let literal_tree = CanonicalHuffmanTree::from_code_lengths(&code_lengths[..hlit])?;
    let distance_tree = CanonicalHuffmanTree::from_code_lengths(&code_lengths[hlit..])?;
    Ok((literal_tree, distance_tree))
}

/// Read `num` code lengths using the code-length tree.
/// Defined in RFC 1951, section 3.2.7.
fn read_code_lengths(
    bit_reader: &mut BitReader,
    code_length_tree: &CanonicalHuffmanTree,
    num: usize,
) -> Result<Vec<u8>> {
    let mut code_lengths = vec![0u8; num];
    let mut i = 0;
    while i < num {
        let symbol = code_length_tree.decode(bit_reader)?;
        let (repeat_len, repeat_value) = match symbol {
            0..=15 => {
                code_lengths[i] = symbol as u8;
                i += 1;
                continue;
            }
            // 16: copy the previous code length 3-6 times.
            16 => {
                let previous = match i {
                    0 => return Err(DecodeError::InvalidLengthRun),
                    _ => code_lengths[i - 1],
                };
                (3 + bit_reader.read_bits(2)? as usize, previous)
            }
            // 17: repeat code length 0 for 3-10 times.
            17 => (3 + bit_reader.read_bits(3)? as usize, 0),
            // 18: repeat code length 0 for 11-138 times.
            18 => (11 + bit_reader.read_bits(7)? as usize, 0),
            _ => return Err(DecodeError::UnknownCode),
        };
        if i + repeat_len > num {
            return Err(DecodeError::InvalidLengthRun);
        }
        code_lengths[i..i + repeat_len].fill(repeat_value);
        i += repeat_len;
    }
    Ok(code_lengths)
}

/// Decode a raw DEFLATE stream into a `Vec<u8>`.
///
/// `window_size` bounds how far back-references may reach and must be a
/// power of two no larger than 32768. Streams wrapped in a zlib container
/// carry this value in their header; use [`crate::zlib::decode`] for those.
pub fn decode(data: &[u8], window_size: usize) -> Result<Vec<u8>> {
    let mut bit_reader = BitReader::new(data);
    let mut window = SlidingWindow::new(window_size);
    let mut output = Vec::new();

    loop {
        let b_final = bit_reader.read_bits(BFINAL_LEN)?;
        let b_type = bit_reader.read_bits(BTYPE_LEN)?;
        trace!("block header: final={b_final}, type={b_type}");

        match b_type {
            BTYPE_NO_COMPRESSION => {
                inflate_stored_block(&mut bit_reader, &mut window, &mut output)?;
            }
            BTYPE_FIXED_HUFFMAN => {
                inflate_compressed_block(
                    &mut bit_reader,
                    &mut window,
                    &mut output,
                    fixed_literal_tree(),
                    DistanceCodes::FixedField,
                )?;
            }
            BTYPE_DYNAMIC_HUFFMAN => {
                let (literal_tree, distance_tree) = read_dynamic_huffman_trees(&mut bit_reader)?;
                inflate_compressed_block(
                    &mut bit_reader,
                    &mut window,
                    &mut output,
                    &literal_tree,
                    DistanceCodes::Tree(&distance_tree),
                )?;
            }
            _ => return Err(DecodeError::ReservedBlockType),
        }

        if b_final == BFINAL_VALUE {
            break;
        }
    }
    Ok(output)
}
