use std::io::{self, Read, Write};

use bytes::Bytes;

use wsconn::protocol::frame::coding::{Data, OpCode};
use wsconn::protocol::frame::{Frame, FrameSocket};

/// `Write` impl that records call stats and drops the data.
#[derive(Debug, Default)]
struct MockWrite {
    written_bytes: usize,
    write_count: usize,
    flush_count: usize,
}

impl Read for MockWrite {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::WouldBlock, "reads not supported"))
    }
}
impl Write for MockWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written_bytes += buf.len();
        self.write_count += 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_count += 1;
        Ok(())
    }
}

fn text_frame(s: &'static str) -> Frame {
    Frame::message(Bytes::from_static(s.as_bytes()), OpCode::Data(Data::Text), true)
}

/// Test for `FrameSocket`'s write buffering and flushing behaviour, which
/// is what `WebSocketConfig::write_buffer_size` ultimately configures.
#[test]
fn write_flush_behaviour() {
    const SEND_ME_LEN: usize = 10;
    const BATCH_ME_LEN: usize = 11;
    const WRITE_BUFFER_SIZE: usize = 600;

    let mut socket = FrameSocket::new(MockWrite::default());
    socket.set_buffer_limits(WRITE_BUFFER_SIZE, usize::MAX);

    assert_eq!(socket.get_ref().written_bytes, 0);
    assert_eq!(socket.get_ref().write_count, 0);
    assert_eq!(socket.get_ref().flush_count, 0);

    // `send` writes & flushes immediately
    socket.send(text_frame("Send me!")).unwrap();
    assert_eq!(socket.get_ref().written_bytes, SEND_ME_LEN);
    assert_eq!(socket.get_ref().write_count, 1);
    assert_eq!(socket.get_ref().flush_count, 1);

    // send a batch of messages
    for _ in 0..100 {
        socket.write(text_frame("Batch me!")).unwrap();
    }
    // after 55 writes the out_buffer will exceed write_buffer_size=600
    // and so do a single underlying write (not flushing).
    assert_eq!(socket.get_ref().written_bytes, 55 * BATCH_ME_LEN + SEND_ME_LEN);
    assert_eq!(socket.get_ref().write_count, 2);
    assert_eq!(socket.get_ref().flush_count, 1);

    // flushing will perform a single write for the remaining out_buffer & flush.
    socket.flush().unwrap();
    assert_eq!(socket.get_ref().written_bytes, 100 * BATCH_ME_LEN + SEND_ME_LEN);
    assert_eq!(socket.get_ref().write_count, 3);
    assert_eq!(socket.get_ref().flush_count, 2);
}
