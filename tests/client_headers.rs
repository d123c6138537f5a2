#![cfg(feature = "handshake")]

mod support;

use wsconn::handshake::client::generate_key;
use wsconn::protocol::frame::{Frame, FrameHeader};
use wsconn::{ConnectionManager, Message};

#[test]
fn test_headers_and_subprotocol_are_sent_and_echoed() {
    let token = "my_jwt_token";
    let full_token = format!("Bearer {token}");
    let full_token_check = full_token.clone();
    let sub_protocol = "my_sub_protocol";

    let (port, join) = support::spawn_ws_server(
        move |request| {
            assert_eq!(request.header("authorization"), Some(full_token_check.as_str()));
            assert_eq!(request.header("sec-websocket-protocol"), Some(sub_protocol));
            vec![format!("Sec-WebSocket-Protocol: {sub_protocol}")]
        },
        |mut socket| {
            if let Ok(Some(frame)) = socket.read(None) {
                let opcode = frame.header().opcode;
                let _ = socket.send(Frame::from_payload(
                    FrameHeader { opcode, ..Default::default() },
                    frame.into_payload(),
                ));
            }
            let _ = socket.send(Frame::close(None));
        },
    );

    let request = http::Request::builder()
        .method("GET")
        .header("Host", format!("127.0.0.1:{port}"))
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Sec-WebSocket-Version", "13")
        .header("Sec-WebSocket-Key", generate_key())
        .header("Authorization", full_token)
        .header("Sec-WebSocket-Protocol", sub_protocol)
        .uri(format!("ws://127.0.0.1:{port}"))
        .body(())
        .unwrap();

    let connection = ConnectionManager::connect(request, None, None).unwrap();
    assert_eq!(
        connection.response().headers().get("Sec-WebSocket-Protocol").unwrap(),
        sub_protocol
    );

    connection.send(Message::text("Hello WebSocket")).unwrap();
    let echoed = connection.recv().unwrap();
    assert_eq!(echoed, Message::text("Hello WebSocket"));

    join.join().unwrap();
}
