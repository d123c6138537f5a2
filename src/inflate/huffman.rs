//! Canonical Huffman code construction and decoding per RFC 1951 §3.2.2.

use super::bitstream::{BitCursor, BitStream};
use crate::error::{Error, ProtocolError, Result};

/// Largest code length RFC 1951 allows.
const MAX_BITS: usize = 15;

/// A canonical Huffman decoder built from per-symbol code lengths.
///
/// Decoding walks one bit at a time and rebuilds the canonical code as it
/// goes, checking it against the range of codes assigned to each length.
/// This is the straightforward approach RFC 1951 §3.2.2 describes; a real
/// hot-path decoder would use a lookup table the way `HuffmanCodes` does in
/// the wider DEFLATE literature, but the spec calls for "Huffman decoder
/// built from canonical code-length tables," and correctness over a known,
/// small alphabet matters more here than raw throughput.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// `counts[len]` = how many codes have this length.
    counts: [u16; MAX_BITS + 1],
    /// Symbols ordered first by code length, then by symbol value, matching
    /// the order codes are assigned in.
    symbols: Vec<u16>,
}

impl HuffmanTable {
    /// Builds a canonical Huffman table from per-symbol code lengths (0 means
    /// the symbol is unused).
    pub fn from_code_lengths(lengths: &[u8]) -> Result<Self> {
        let mut counts = [0u16; MAX_BITS + 1];
        for &len in lengths {
            if len as usize > MAX_BITS {
                return Err(Error::Protocol(ProtocolError::BadCode));
            }
            counts[len as usize] += 1;
        }
        counts[0] = 0;

        // offset[len] is the index into `symbols` where codes of that length start.
        let mut offsets = [0u16; MAX_BITS + 2];
        for len in 1..=MAX_BITS {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        let mut symbols = vec![0u16; lengths.len()];
        let mut next = offsets;
        for (symbol, &len) in lengths.iter().enumerate() {
            if len != 0 {
                symbols[next[len as usize] as usize] = symbol as u16;
                next[len as usize] += 1;
            }
        }

        Ok(HuffmanTable { counts, symbols })
    }

    /// Builds the fixed literal/length table RFC 1951 §3.2.6 mandates for
    /// BTYPE=01 blocks: 288 symbols with lengths 8 (0-143), 9 (144-255),
    /// 7 (256-279), 8 (280-287).
    pub fn fixed_literal_length() -> Self {
        let mut lengths = [0u8; 288];
        lengths[0..=143].fill(8);
        lengths[144..=255].fill(9);
        lengths[256..=279].fill(7);
        lengths[280..=287].fill(8);
        HuffmanTable::from_code_lengths(&lengths).expect("fixed table is well-formed")
    }

    /// Builds the fixed distance table RFC 1951 §3.2.6 mandates: 32 symbols,
    /// all of length 5.
    pub fn fixed_distance() -> Self {
        let lengths = [5u8; 32];
        HuffmanTable::from_code_lengths(&lengths).expect("fixed table is well-formed")
    }

    /// Decodes one symbol starting at `cursor`, advancing it past the
    /// consumed bits.
    pub fn decode(&self, stream: &BitStream, cursor: &mut BitCursor) -> Result<u16> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;

        for len in 1..=MAX_BITS {
            code |= stream.read_huffman_bits(cursor, 1) as i32;
            let count = self.counts[len] as i32;
            if code - first < count {
                return Ok(self.symbols[(index + (code - first)) as usize]);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }

        Err(Error::Protocol(ProtocolError::BadCode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_tables_have_expected_symbol_counts() {
        let lit_len = HuffmanTable::fixed_literal_length();
        assert_eq!(lit_len.symbols.len(), 288);
        let dist = HuffmanTable::fixed_distance();
        assert_eq!(dist.symbols.len(), 32);
    }

    #[test]
    fn single_symbol_alphabet_round_trips() {
        // symbol 0 has length 1, everything else unused: code "0"
        let mut lengths = vec![0u8; 3];
        lengths[0] = 1;
        lengths[1] = 1;
        let table = HuffmanTable::from_code_lengths(&lengths).unwrap();
        // canonical: symbol 0 -> code 0 (bit '0'), symbol 1 -> code 1 (bit '1')
        let stream = BitStream::from_vec(vec![0b0000_0001]);
        let mut cursor = 0;
        assert_eq!(table.decode(&stream, &mut cursor).unwrap(), 0);
        assert_eq!(table.decode(&stream, &mut cursor).unwrap(), 1);
    }

    #[test]
    fn invalid_code_length_is_rejected() {
        let lengths = vec![20u8];
        assert!(HuffmanTable::from_code_lengths(&lengths).is_err());
    }
}
