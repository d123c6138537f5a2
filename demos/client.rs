use wsconn::{ConnectionManager, Message};

fn main() {
    env_logger::init();

    let connection =
        ConnectionManager::connect("ws://localhost:3012/socket", None, None).expect("Can't connect");

    connection.send(Message::text("Hello WebSocket")).unwrap();
    while let Some(msg) = connection.recv() {
        println!("Received: {msg}");
    }
}
