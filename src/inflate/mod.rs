//! A hand-rolled RFC 1951 (DEFLATE) decompressor.
//!
//! permessage-deflate (RFC 7692) needs two capabilities a black-box
//! decompressor like `flate2::Decompress` doesn't expose: decoding into a
//! persistent, directly addressable sliding window shared across messages
//! (context takeover), and walking a freshly compressed stream to clear a
//! BFINAL bit a peer's decoder would otherwise choke on. Both live here.

pub mod bitstream;
pub mod huffman;
pub mod inflater;
pub mod walker;

pub use bitstream::{BitCursor, BitStream};
pub use inflater::inflate;
pub use walker::walk_and_clear_final_bits;
