//! Walks a DEFLATE stream without decompressing it, clearing the BFINAL bit
//! of every block it passes over.
//!
//! permessage-deflate compresses each outgoing message independently and
//! appends a synthetic empty stored block so every message ends on a byte
//! boundary (see [`crate::extensions::compression::deflate`]); some peers
//! reject a mid-stream block that still claims to be final, so this walker
//! exists purely to normalize BFINAL to 0 as it scans past each block.

use super::bitstream::{BitCursor, BitStream};
use super::huffman::HuffmanTable;
use crate::error::{Error, ProtocolError, Result};

const LENGTH_EXTRA_BITS: [u32; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const DIST_EXTRA_BITS: [u32; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];
const CODE_LENGTH_ORDER: [usize; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

fn walk_dynamic_tables(input: &BitStream, cursor: &mut BitCursor) -> Result<(HuffmanTable, HuffmanTable)> {
    let hlit = input.read_bits_le(cursor, 5) as usize + 257;
    let hdist = input.read_bits_le(cursor, 5) as usize + 1;
    let hclen = input.read_bits_le(cursor, 4) as usize + 4;

    let mut cl_lengths = [0u8; 19];
    for &slot in CODE_LENGTH_ORDER.iter().take(hclen) {
        cl_lengths[slot] = input.read_bits_le(cursor, 3) as u8;
    }
    let cl_table = HuffmanTable::from_code_lengths(&cl_lengths)?;

    let total = hlit + hdist;
    let mut lengths = Vec::with_capacity(total);
    while lengths.len() < total {
        let sym = cl_table.decode(input, cursor)?;
        match sym {
            0..=15 => lengths.push(sym as u8),
            16 => {
                let prev = *lengths.last().ok_or(Error::Protocol(ProtocolError::BadCode))?;
                let repeat = input.read_bits_le(cursor, 2) + 3;
                for _ in 0..repeat {
                    lengths.push(prev);
                }
            }
            17 => {
                let repeat = input.read_bits_le(cursor, 3) + 3;
                for _ in 0..repeat {
                    lengths.push(0);
                }
            }
            18 => {
                let repeat = input.read_bits_le(cursor, 7) + 11;
                for _ in 0..repeat {
                    lengths.push(0);
                }
            }
            _ => return Err(Error::Protocol(ProtocolError::BadCode)),
        }
    }
    if lengths.len() != total {
        return Err(Error::Protocol(ProtocolError::BadCode));
    }

    let lit_len_table = HuffmanTable::from_code_lengths(&lengths[..hlit])?;
    let dist_table = HuffmanTable::from_code_lengths(&lengths[hlit..])?;
    Ok((lit_len_table, dist_table))
}

fn walk_huffman_block(
    input: &BitStream,
    cursor: &mut BitCursor,
    lit_len: &HuffmanTable,
    dist: &HuffmanTable,
) -> Result<()> {
    loop {
        let sym = lit_len.decode(input, cursor)?;
        match sym {
            0..=255 => continue,
            256 => return Ok(()),
            257..=285 => {
                let idx = (sym - 257) as usize;
                input.read_bits_le(cursor, LENGTH_EXTRA_BITS[idx]);
                let dist_sym = dist.decode(input, cursor)?;
                if dist_sym as usize >= DIST_EXTRA_BITS.len() {
                    return Err(Error::Protocol(ProtocolError::BadCode));
                }
                input.read_bits_le(cursor, DIST_EXTRA_BITS[dist_sym as usize]);
            }
            _ => return Err(Error::Protocol(ProtocolError::BadCode)),
        }
    }
}

fn walk_stored_block(input: &BitStream, cursor: &mut BitCursor) -> Result<()> {
    input.align_to_byte(cursor);
    let byte_pos = *cursor / 8;
    if byte_pos + 4 > input.len() {
        return Err(Error::Protocol(ProtocolError::InsufficientData));
    }
    let len = u16::from_le_bytes([input.get_byte(byte_pos), input.get_byte(byte_pos + 1)]) as usize;
    if byte_pos + 4 + len > input.len() {
        return Err(Error::Protocol(ProtocolError::InsufficientData));
    }
    *cursor += (4 + len) * 8;
    Ok(())
}

/// Walks every block of a DEFLATE stream starting at `start_bit`, clearing
/// each block's BFINAL bit in place. Returns the bit cursor just past the
/// last block walked.
pub fn walk_and_clear_final_bits(input: &mut BitStream, start_bit: BitCursor) -> Result<BitCursor> {
    let mut cursor = start_bit;

    loop {
        if cursor / 8 >= input.len() {
            return Ok(cursor);
        }
        let bfinal_bit_index = cursor;
        let bfinal = input.read_bit(&mut cursor);
        let btype = input.read_bits_le(&mut cursor, 2);

        if bfinal == 1 {
            input.clear_bit(bfinal_bit_index);
        }

        match btype {
            0b00 => walk_stored_block(input, &mut cursor)?,
            0b01 => {
                let lit_len = HuffmanTable::fixed_literal_length();
                let dist = HuffmanTable::fixed_distance();
                walk_huffman_block(input, &mut cursor, &lit_len, &dist)?;
            }
            0b10 => {
                let (lit_len, dist) = walk_dynamic_tables(input, &mut cursor)?;
                walk_huffman_block(input, &mut cursor, &lit_len, &dist)?;
            }
            _ => return Err(Error::Protocol(ProtocolError::BadBlockType)),
        }

        if bfinal == 1 {
            return Ok(cursor);
        }
    }
}
