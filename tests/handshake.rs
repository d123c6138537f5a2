#![cfg(feature = "handshake")]

mod support;

use wsconn::{
    connect,
    error::{Error, ProtocolError, SubProtocolError},
    handshake::client::generate_key,
};

fn create_http_request(port: u16, subprotocols: Option<Vec<String>>) -> http::Request<()> {
    let mut builder = http::Request::builder()
        .method("GET")
        .header("Host", format!("127.0.0.1:{port}"))
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Sec-WebSocket-Version", "13")
        .header("Sec-WebSocket-Key", generate_key());

    if let Some(subprotocols) = subprotocols {
        builder = builder.header("Sec-WebSocket-Protocol", subprotocols.join(","));
    }

    builder.uri(format!("ws://127.0.0.1:{port}")).body(()).unwrap()
}

fn spawn_with_subprotocol(server_subprotocols: Option<Vec<String>>) -> u16 {
    let (port, _join) = support::spawn_ws_server(
        move |_request| {
            server_subprotocols
                .map(|subs| vec![format!("Sec-WebSocket-Protocol: {}", subs.join(","))])
                .unwrap_or_default()
        },
        |mut socket| {
            let _ = socket.send(wsconn::protocol::frame::Frame::close(None));
        },
    );
    port
}

#[test]
fn test_server_send_no_subprotocol() {
    let port = spawn_with_subprotocol(None);

    let err = connect(create_http_request(port, Some(vec!["my-sub-protocol".into()]))).unwrap_err();

    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::SecWebSocketSubProtocolError(SubProtocolError::NoSubProtocol))
    ));
}

#[test]
fn test_server_sent_subprotocol_none_requested() {
    let port = spawn_with_subprotocol(Some(vec!["my-sub-protocol".to_string()]));

    let err = connect(create_http_request(port, None)).unwrap_err();

    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::SecWebSocketSubProtocolError(
            SubProtocolError::ServerSentSubProtocolNoneRequested
        ))
    ));
}

#[test]
fn test_invalid_subprotocol() {
    let port = spawn_with_subprotocol(Some(vec!["invalid-sub-protocol".to_string()]));

    let err = connect(create_http_request(port, Some(vec!["my-sub-protocol".to_string()]))).unwrap_err();

    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::SecWebSocketSubProtocolError(
            SubProtocolError::InvalidSubProtocol
        ))
    ));
}

#[test]
fn test_request_multiple_subprotocols() {
    let port = spawn_with_subprotocol(Some(vec!["my-sub-protocol".to_string()]));

    let (_, response) = connect(create_http_request(
        port,
        Some(vec![
            "my-sub-protocol".to_string(),
            "my-sub-protocol-1".to_string(),
            "my-sub-protocol-2".to_string(),
        ]),
    ))
    .unwrap();

    assert_eq!(
        response.headers().get("Sec-WebSocket-Protocol").unwrap(),
        "my-sub-protocol".parse::<http::HeaderValue>().unwrap()
    );
}

#[test]
fn test_request_single_subprotocol() {
    let port = spawn_with_subprotocol(Some(vec!["my-sub-protocol".to_string()]));

    let (_, response) =
        connect(create_http_request(port, Some(vec!["my-sub-protocol".to_string()]))).unwrap();

    assert_eq!(
        response.headers().get("Sec-WebSocket-Protocol").unwrap(),
        "my-sub-protocol".parse::<http::HeaderValue>().unwrap()
    );
}
