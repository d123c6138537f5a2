use log::*;

use wsconn::extensions::compression::{deflate::DeflateConfig, WsCompression};
use wsconn::protocol::frame::coding::CloseCode;
use wsconn::protocol::WebSocketConfig;
use wsconn::{ConnectionManager, Error, Message, Result};

const AGENT: &str = "wsconn";

fn config() -> WebSocketConfig {
    WebSocketConfig { compression: WsCompression::Deflate(DeflateConfig::default()), ..Default::default() }
}

fn get_case_count() -> Result<u32> {
    let connection =
        ConnectionManager::connect("ws://localhost:9001/getCaseCount", Some(config()), None)?;
    let msg = connection.recv().ok_or(Error::ConnectionClosed)?;
    connection.disconnect(CloseCode::Normal, "")?;
    let count = match msg {
        Message::Text(text) => text.as_str().parse::<u32>().unwrap(),
        other => panic!("unexpected case count response: {other:?}"),
    };
    Ok(count)
}

fn update_reports() -> Result<()> {
    let connection = ConnectionManager::connect(
        format!("ws://localhost:9001/updateReports?agent={AGENT}"),
        Some(config()),
        None,
    )?;
    connection.disconnect(CloseCode::Normal, "")
}

fn run_test(case: u32) -> Result<()> {
    info!("Running test case {case}");
    let case_url = format!("ws://localhost:9001/runCase?case={case}&agent={AGENT}");
    let connection = ConnectionManager::connect(case_url, Some(config()), None)?;
    while let Some(msg) = connection.recv() {
        connection.send(msg)?;
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let total = get_case_count().unwrap();

    for case in 1..=total {
        if let Err(e) = run_test(case) {
            match e {
                Error::Protocol(_) => {}
                err => warn!("test: {err}"),
            }
        }
    }

    update_reports().unwrap();
}
