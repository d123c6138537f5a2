#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate wsconn;

use std::io::{self, Cursor};
use std::sync::{Arc, Mutex};

use wsconn::extensions::compression::CompressionSwitcher;
use wsconn::protocol::reader::ReaderTask;
use wsconn::protocol::validator::ValidatorMode;
use wsconn::protocol::writer::WriterTask;

/// A `Write` sink that discards everything, standing in for the writer
/// thread's transport: the fuzz target only drives the reader loop
/// synchronously, so nothing ever drains the queue this feeds.
struct Sink;

impl io::Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let vector: Vec<u8> = data.into();
    let cursor = Cursor::new(vector);

    let compression = Arc::new(Mutex::new(CompressionSwitcher::from_config(
        wsconn::extensions::compression::WsCompression::None(Some(64 * 1024 * 1024)),
    )));
    let (_writer_task, writer_handle) =
        WriterTask::new(Sink, Arc::clone(&compression), None, false);

    let (reader_task, _stop) = ReaderTask::new(
        cursor,
        ValidatorMode::Strict,
        false,
        compression,
        writer_handle,
        Some(64 * 1024 * 1024),
        true,
    );

    reader_task.run(|_message| {});
});
