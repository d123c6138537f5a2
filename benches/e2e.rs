//! Benchmarks for end to end performance including real `Read` & `Write` impls.
use bytes::Bytes;
use criterion::{BatchSize, Criterion, Throughput};
use rand::{
    distr::{Alphanumeric, SampleString},
    rngs::SmallRng,
    SeedableRng,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use data_encoding::BASE64;
use sha1::{Digest, Sha1};

use wsconn::protocol::frame::coding::{Control, Data, OpCode};
use wsconn::protocol::frame::{Frame, FrameHeader, FrameSocket};
use wsconn::ConnectionManager;

/// Binary message meaning "stop".
const B_STOP: Bytes = Bytes::from_static(b"stop");
const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(GUID.as_bytes());
    BASE64.encode(&hasher.finalize())
}

/// Runs just enough of RFC 6455's server side to exercise a real client
/// against a loopback socket: no extension negotiation, single connection.
fn run_uppercase_server(mut stream: TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).expect("read handshake request");
        assert!(n > 0, "peer closed before completing the handshake");
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut req = httparse::Request::new(&mut headers);
    req.parse(&buf).expect("parse handshake request");
    let key = req
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("sec-websocket-key"))
        .map(|h| String::from_utf8_lossy(h.value).into_owned())
        .expect("Sec-WebSocket-Key header");

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_key(&key)
    );
    stream.write_all(response.as_bytes()).expect("write handshake response");

    let mut socket = FrameSocket::new(stream);
    loop {
        let frame = socket.read(None).unwrap().unwrap();
        match frame.header().opcode {
            OpCode::Data(Data::Text) => {
                let text = frame.into_text().unwrap();
                let uppercase = text.as_str().to_ascii_uppercase();
                socket
                    .send(Frame::message(uppercase.into_bytes(), OpCode::Data(Data::Text), true))
                    .unwrap();
            }
            OpCode::Data(Data::Binary) if frame.payload() == B_STOP.as_ref() => return,
            OpCode::Control(Control::Close) => return,
            other => panic!("Unexpected frame: {other:?}"),
        }
    }
}

fn benchmark(c: &mut Criterion) {
    /// Benchmark that starts a simple server and client then sends a single
    /// text message client->server and reads a single uppercased response
    /// server->client, of the given `msg_len` size.
    fn send_and_recv(msg_len: usize, b: &mut criterion::Bencher<'_>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server_thread = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            run_uppercase_server(stream);
        });

        let connection =
            ConnectionManager::connect(format!("ws://127.0.0.1:{port}"), None, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(123);

        b.iter_batched(
            || {
                let msg = Alphanumeric.sample_string(&mut rng, msg_len);
                let expected_response = msg.to_ascii_uppercase();
                (msg, expected_response)
            },
            |(txt, expected_response)| {
                connection.send(wsconn::Message::text(txt)).unwrap();
                match connection.recv() {
                    Some(wsconn::Message::Text(v)) => assert_eq!(v, expected_response),
                    other => panic!("Unexpected response msg: {other:?}"),
                }
            },
            BatchSize::PerIteration,
        );

        // cleanup
        connection.send(wsconn::Message::binary(B_STOP)).unwrap();
        server_thread.join().unwrap();
    }

    // bench sending & receiving various sizes 512B to 1GiB.
    for len in (0..8).map(|n| 512 * 8_usize.pow(n)) {
        let mut group = c.benchmark_group("send+recv");
        group
            .throughput(Throughput::Bytes(len as u64 * 2)) // *2 as we send and then recv it
            .bench_function(HumanLen(len).to_string(), |b| send_and_recv(len, b));
    }
}

struct HumanLen(usize);

impl std::fmt::Display for HumanLen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            n if n < 1024 => write!(f, "{n} B"),
            n if n < 1024 * 1024 => write!(f, "{} KiB", n / 1024),
            n if n < 1024 * 1024 * 1024 => write!(f, "{} MiB", n / (1024 * 1024)),
            n => write!(f, "{} GiB", n / (1024 * 1024 * 1024)),
        }
    }
}

criterion::criterion_group!(read_benches, benchmark);
criterion::criterion_main!(read_benches);
