//! A thin, header-less DEFLATE compressor used by permessage-deflate.
//!
//! Decompression is hand-rolled (see [`crate::inflate`]) so the extension can
//! address its context-takeover window directly, but there's no such
//! requirement on the compression side, so this keeps using `flate2`'s raw
//! `Compress` the way the teacher's extension code always has.

use flate2::{Compress, CompressError, Compression, FlushCompress, Status};
use std::slice;

/// Smallest LZ77 window size RFC 7692 allows to be negotiated.
pub const MIN_WINDOW_BITS: u8 = 8;
/// Largest LZ77 window size RFC 7692 allows to be negotiated.
pub const MAX_WINDOW_BITS: u8 = 15;

/// Streaming DEFLATE compressor, raw (no zlib header/trailer).
pub struct Deflater {
    compress: Compress,
}

impl Deflater {
    /// Creates a compressor at the given level using a `window_size`-bit LZ77
    /// window, per RFC 7692 §7.1.2.1.
    pub fn new(compression: Compression, mut window_size: u8) -> Self {
        // zlib rejects a window of exactly 8 bits for deflate; round up.
        // https://github.com/madler/zlib/blob/cacf7f1d4e3d44d871b605da3b647f07d718623f/deflate.c#L303
        if window_size == MIN_WINDOW_BITS {
            window_size = MIN_WINDOW_BITS + 1;
        }
        Deflater { compress: Compress::new_with_window_bits(compression, false, window_size) }
    }

    /// Resets compressor state, used between messages under
    /// `compress_reset`/`server_no_context_takeover`.
    pub fn reset(&mut self) {
        self.compress.reset()
    }

    /// Compresses `input`, appending the result to `output`.
    pub fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), CompressError> {
        let mut read_buf = Vec::from(input);

        loop {
            let output_size = output.len();
            if output_size == output.capacity() {
                output.reserve(input.len().max(32));
            }

            let before_out = self.compress.total_out();
            let before_in = self.compress.total_in();

            let out_slice = unsafe {
                slice::from_raw_parts_mut(
                    output.as_mut_ptr().add(output_size),
                    output.capacity() - output_size,
                )
            };

            let status = self.compress.compress(&read_buf, out_slice, FlushCompress::Sync)?;

            let consumed = (self.compress.total_in() - before_in) as usize;
            read_buf = read_buf.split_off(consumed);

            unsafe {
                output.set_len((self.compress.total_out() - before_out) as usize + output_size);
            }

            match status {
                Status::Ok | Status::BufError => {
                    if before_out == self.compress.total_out() && read_buf.is_empty() {
                        return Ok(());
                    }
                }
                Status::StreamEnd => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflate::{inflate, BitStream};

    #[test]
    fn compressed_output_round_trips_through_hand_rolled_inflater() {
        let mut deflater = Deflater::new(Compression::best(), MAX_WINDOW_BITS);
        let mut compressed = Vec::new();
        deflater.compress(b"hello hello hello hello", &mut compressed).unwrap();

        let input = BitStream::from_vec(compressed);
        let mut output = BitStream::new();
        inflate(&input, 0, &mut output).unwrap();
        assert_eq!(output.as_slice(), b"hello hello hello hello");
    }
}
