#![cfg(feature = "handshake")]
#![cfg(feature = "url")]

mod support;

use wsconn::ConnectionManager;

/// `url::Url` implements `IntoClientRequest` just like `&str` does.
#[test]
fn test_with_url() {
    let (port, join) = support::spawn_echo_server();

    let url = url::Url::parse(&format!("ws://127.0.0.1:{port}")).unwrap();
    let connection = ConnectionManager::connect(url, None, None);
    assert!(connection.is_ok());

    join.join().unwrap();
}
