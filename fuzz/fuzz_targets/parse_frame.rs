#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate wsconn;

use std::io::Cursor;

use wsconn::protocol::frame::FrameSocket;

fuzz_target!(|data: &[u8]| {
    let vector: Vec<u8> = data.into();
    let cursor = Cursor::new(vector);
    let mut socket = FrameSocket::new(cursor);

    while let Ok(Some(_frame)) = socket.read(Some(1024 * 1024)) {}
});
