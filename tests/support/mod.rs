//! A minimal, hand-rolled WebSocket server used only by this crate's own
//! integration tests. This library is client-only, so there is no
//! `wsconn::accept` to reach for here -- the test suite speaks just
//! enough of RFC 6455's server side (the handshake response and unmasked
//! frame I/O) to exercise the client against a real loopback socket.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use data_encoding::BASE64;
use sha1::{Digest, Sha1};

use wsconn::protocol::frame::FrameSocket;

const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// A parsed opening handshake request.
pub struct HandshakeRequest {
    pub key: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl HandshakeRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(GUID.as_bytes());
    BASE64.encode(&hasher.finalize())
}

fn read_handshake_request(stream: &mut TcpStream) -> HandshakeRequest {
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

    let headers = req
        .headers
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
        .collect();

    HandshakeRequest { key, path: req.path.unwrap_or("/").to_string(), headers }
}

/// Accepts a single connection on an ephemeral loopback port, runs a
/// minimal server-side handshake (no extension negotiation), and hands the
/// raw frame socket to `handler`.
///
/// `respond` receives the parsed request and returns extra response header
/// lines (e.g. `"Sec-WebSocket-Protocol: chat".to_string()`) to splice into
/// the 101 response.
pub fn spawn_ws_server<R, H>(respond: R, handler: H) -> (u16, JoinHandle<()>)
where
    R: FnOnce(&HandshakeRequest) -> Vec<String> + Send + 'static,
    H: FnOnce(FrameSocket<TcpStream>) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ws server");
    let port = listener.local_addr().expect("local_addr").port();
    let join = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_handshake_request(&mut stream);
        let accept = accept_key(&request.key);
        let mut response = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {accept}\r\n"
        );
        for line in respond(&request) {
            response.push_str(&line);
            response.push_str("\r\n");
        }
        response.push_str("\r\n");
        stream.write_all(response.as_bytes()).expect("write handshake response");
        handler(FrameSocket::new(stream));
    });
    (port, join)
}

/// Accepts a single connection, echoes exactly one data frame back
/// unmasked, then lets the socket drop.
pub fn spawn_echo_server() -> (u16, JoinHandle<()>) {
    spawn_ws_server(
        |_request| Vec::new(),
        |mut socket| {
            if let Ok(Some(frame)) = socket.read(None) {
                let opcode = frame.header().opcode;
                let _ = socket.send(wsconn::protocol::frame::Frame::from_payload(
                    wsconn::protocol::frame::FrameHeader { opcode, ..Default::default() },
                    frame.into_payload(),
                ));
            }
        },
    )
}
