//! Benchmarks for read performance.
use criterion::{BatchSize, Criterion};
use std::{
    io::{self, Read, Write},
    sync::{Arc, Mutex},
};
use wsconn::protocol::frame::{
    coding::{Data, OpCode},
    Frame, FrameSocket,
};

/// Mock stream with no artificial delays.
#[derive(Default, Clone)]
struct MockIo(Arc<Mutex<Vec<u8>>>);

impl Read for MockIo {
    fn read(&mut self, to: &mut [u8]) -> io::Result<usize> {
        let mut data = self.0.lock().unwrap();
        if data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "not ready"));
        }
        let len = data.len().min(to.len());
        to[..len].copy_from_slice(data.drain(..len).as_slice());
        Ok(len)
    }
}

impl Write for MockIo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn benchmark(c: &mut Criterion) {
    /// Benchmark reading 100k mix of binary & text frames, the way a
    /// server's (always-unmasked) replies arrive on the wire.
    fn read_100k(b: &mut criterion::Bencher<'_>) {
        let io = MockIo::default();
        let mut writer = FrameSocket::new(io.clone());
        let mut reader = FrameSocket::new(io);

        b.iter_batched(
            || {
                let mut sum = 0;
                for i in 0_u64..100_000 {
                    let frame = match i {
                        _ if i % 3 == 0 => {
                            Frame::message(i.to_le_bytes().to_vec(), OpCode::Data(Data::Binary), true)
                        }
                        _ => Frame::message(
                            format!("{{\"id\":{i}}}").into_bytes(),
                            OpCode::Data(Data::Text),
                            true,
                        ),
                    };
                    writer.send(frame).unwrap();
                    sum += i;
                }
                sum
            },
            |expected_sum| {
                let mut sum = 0;
                while sum != expected_sum {
                    let frame = reader.read(None).unwrap().unwrap();
                    match frame.header().opcode {
                        OpCode::Data(Data::Binary) => {
                            let a: &[u8; 8] = frame.payload().try_into().unwrap();
                            sum += u64::from_le_bytes(*a);
                        }
                        OpCode::Data(Data::Text) => {
                            let msg = frame.into_text().unwrap();
                            let i: u64 = msg.as_str()[6..msg.len() - 1].parse().unwrap();
                            sum += i;
                        }
                        other => panic!("Unexpected {other:?}"),
                    }
                }
            },
            BatchSize::SmallInput,
        );
    }

    c.bench_function("read 100k small messages", |b| {
        read_100k(b);
    });
}

criterion::criterion_group!(read_benches, benchmark);
criterion::criterion_main!(read_benches);
