use wsconn::ConnectionManager;

fn main() {
    let target = "wss://echo.websocket.events";
    if std::env::var("HTTP_PROXY").is_err()
        && std::env::var("HTTPS_PROXY").is_err()
        && std::env::var("ALL_PROXY").is_err()
    {
        eprintln!("Set HTTP_PROXY, HTTPS_PROXY, or ALL_PROXY before running this example.");
        return;
    }

    let connection = ConnectionManager::connect(target, None, None).expect("connect through proxy");
    let _ = connection.disconnect(wsconn::protocol::frame::coding::CloseCode::Normal, "");
}
