//! Hub and instance commands against a scripted transport.

use std::collections::BTreeMap;
use std::sync::Arc;

use keyhub_sdk::{Config, Error, HubClient, InstanceClient};
use keyhub_transport_mock::{MockSocket, MockTransport};
use keyhub_wire::{Request, Response, Value};
use pretty_assertions::assert_eq;

async fn hub() -> (HubClient, MockTransport, MockSocket) {
    let transport = MockTransport::new();
    let hub = HubClient::with_transport(Config::default(), Arc::new(transport.clone())).unwrap();

    let socket = transport.next_socket().await;
    socket.open();

    (hub, transport, socket)
}

/// Answers the next request and hands it back for inspection.
async fn answer(socket: &mut MockSocket, reply: Result<Value, &str>) -> Request {
    let (id, request) = socket.next_request().await.unwrap();
    let response = match reply {
        Ok(result) => Response::success(id, result),
        Err(error) => Response::failure(id, error),
    };
    socket.reply(&response);
    request
}

#[tokio::test(start_paused = true)]
async fn test_hub_connects_to_control_channel() {
    let (_hub, transport, socket) = hub().await;

    assert_eq!(socket.url().as_str(), "ws://localhost:8372/ctl");
    assert_eq!(transport.connects().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hub_list_parses_embedded_array() {
    let (hub, _transport, mut socket) = hub().await;

    let (urls, request) = tokio::join!(
        hub.list(),
        answer(
            &mut socket,
            Ok(Value::from(r#"["ws://localhost:8372/ws1","ws://localhost:8372/ws2"]"#))
        )
    );

    assert_eq!(request.action, "LIST");
    assert_eq!(
        urls.unwrap(),
        vec![
            "ws://localhost:8372/ws1".to_string(),
            "ws://localhost:8372/ws2".to_string()
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_hub_list_rejects_non_array() {
    let (hub, _transport, mut socket) = hub().await;

    let (urls, _) = tokio::join!(hub.list(), answer(&mut socket, Ok(Value::from("7"))));

    assert!(matches!(urls, Err(Error::UnexpectedResult { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_hub_run_starts_instance_and_connects_to_it() {
    let (hub, transport, mut socket) = hub().await;

    let (instance, request) = tokio::join!(hub.run("1"), answer(&mut socket, Ok(Value::Null)));
    let instance = instance.unwrap();

    assert_eq!(request.action, "SET");
    assert_eq!(request.option_1, "ws://localhost:8372/ws1");
    assert_eq!(request.option_2, "");

    let mut instance_socket = transport.next_socket().await;
    assert_eq!(instance_socket.url().as_str(), "ws://localhost:8372/ws1");
    assert_eq!(instance.rpc().url().as_str(), "ws://localhost:8372/ws1");

    instance_socket.open();
    let (set, request) = tokio::join!(
        instance.set("k1", "v1"),
        answer(&mut instance_socket, Ok(Value::Null))
    );
    set.unwrap();
    assert_eq!(request.action, "SET");
    assert_eq!(request.option_1, "k1");
    assert_eq!(request.option_2, "v1");
}

#[tokio::test(start_paused = true)]
async fn test_hub_start_returns_url_without_connecting() {
    let (hub, transport, mut socket) = hub().await;

    let (url, request) = tokio::join!(hub.start("4"), answer(&mut socket, Ok(Value::Null)));

    assert_eq!(url.unwrap().as_str(), "ws://localhost:8372/ws4");
    assert_eq!(request.action, "SET");
    assert_eq!(request.option_1, "ws://localhost:8372/ws4");

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert_eq!(transport.connects().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hub_stop_sends_remove_with_instance_url() {
    let (hub, _transport, mut socket) = hub().await;

    let (stopped, request) = tokio::join!(hub.stop("2"), answer(&mut socket, Ok(Value::Null)));

    stopped.unwrap();
    assert_eq!(request.action, "REMOVE");
    assert_eq!(request.option_1, "ws://localhost:8372/ws2");
}

#[tokio::test(start_paused = true)]
async fn test_hub_error_is_reported() {
    let (hub, _transport, mut socket) = hub().await;

    let (stopped, _) = tokio::join!(hub.stop("9"), answer(&mut socket, Err("Not exists")));

    match stopped {
        Err(Error::Client(keyhub_client::Error::Application(message))) => {
            assert_eq!(message, "Not exists");
        }
        other => panic!("expected application error, got {other:?}"),
    }
}

async fn instance() -> (InstanceClient, MockSocket) {
    let transport = MockTransport::new();
    let config = Config::new("127.0.0.1", 9000).verbose(true);
    let instance = InstanceClient::with_transport(&config, "3", Arc::new(transport.clone())).unwrap();

    let socket = transport.next_socket().await;
    assert_eq!(socket.url().as_str(), "ws://127.0.0.1:9000/ws3");
    socket.open();

    (instance, socket)
}

#[tokio::test(start_paused = true)]
async fn test_instance_list_parses_map() {
    let (instance, mut socket) = instance().await;

    let (entries, request) = tokio::join!(
        instance.list(),
        answer(&mut socket, Ok(Value::from(r#"{"k1":"v1","k2":"v2"}"#)))
    );

    assert_eq!(request.action, "LIST");
    let expected: BTreeMap<String, String> = [("k1", "v1"), ("k2", "v2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(entries.unwrap(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_instance_get_returns_raw_string() {
    let (instance, mut socket) = instance().await;

    let (value, request) = tokio::join!(
        instance.get("k1"),
        answer(&mut socket, Ok(Value::from("[1,2]")))
    );

    assert_eq!(request.action, "GET");
    assert_eq!(request.option_1, "k1");
    assert_eq!(value.unwrap(), "[1,2]");
}

#[tokio::test(start_paused = true)]
async fn test_instance_remove_missing_key_fails() {
    let (instance, mut socket) = instance().await;

    let (removed, request) = tokio::join!(
        instance.remove("nope"),
        answer(&mut socket, Err("Not exists"))
    );

    assert_eq!(request.action, "REMOVE");
    assert!(matches!(removed, Err(Error::Client(_))));
}

#[tokio::test(start_paused = true)]
async fn test_instance_ping() {
    let (instance, mut socket) = instance().await;

    let (pinged, request) = tokio::join!(instance.ping(), answer(&mut socket, Ok(Value::from(""))));

    pinged.unwrap();
    assert_eq!(request.action, "PING");
}

#[test]
fn test_invalid_suffix_address() {
    let config = Config::new("local host", 8372);
    assert!(matches!(
        config.instance_url("1"),
        Err(Error::InvalidAddress(_))
    ));
}
