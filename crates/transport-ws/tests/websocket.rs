use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use keyhub_transport::{CloseEvent, Transport, TransportError, TransportHandler};
use keyhub_transport_ws::WebSocketTransport;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use url::Url;

#[derive(Debug, PartialEq)]
enum Event {
    Open,
    Close(CloseEvent),
    Message(String),
    Error(TransportError),
}

struct Recorder(mpsc::UnboundedSender<Event>);

impl TransportHandler for Recorder {
    fn on_open(&self) {
        let _ = self.0.send(Event::Open);
    }

    fn on_close(&self, event: CloseEvent) {
        let _ = self.0.send(Event::Close(event));
    }

    fn on_message(&self, text: String) {
        let _ = self.0.send(Event::Message(text));
    }

    fn on_error(&self, error: TransportError) {
        let _ = self.0.send(Event::Error(error));
    }
}

fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder(tx)), rx)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for transport event")
        .expect("event channel closed")
}

/// Accepts one WebSocket connection and hands it to `serve`.
async fn serve_once<F, Fut>(serve: F) -> (Url, tokio::task::JoinHandle<()>)
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        serve(ws).await;
    });

    (Url::parse(&format!("ws://{addr}/ctl")).unwrap(), server)
}

#[tokio::test]
async fn test_open_send_and_receive() {
    let (url, server) = serve_once(|mut ws| async move {
        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(text) = message {
                let reply = text.as_str().to_uppercase();
                ws.send(Message::text(reply)).await.unwrap();
            }
        }
    })
    .await;

    let (handler, mut events) = recorder();
    let conn = WebSocketTransport::new().connect(&url, handler);

    assert_eq!(next_event(&mut events).await, Event::Open);

    conn.send(r#"{"requestId":1}"#.to_string()).unwrap();
    assert_eq!(
        next_event(&mut events).await,
        Event::Message(r#"{"REQUESTID":1}"#.to_string())
    );

    conn.close();
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_binary_frames_are_delivered_as_text() {
    let (url, _server) = serve_once(|mut ws| async move {
        ws.send(Message::binary(b"hello".to_vec())).await.unwrap();
        ws.send(Message::binary(vec![0xff, 0xfe])).await.unwrap();
        let _ = ws.next().await;
    })
    .await;

    let (handler, mut events) = recorder();
    let _conn = WebSocketTransport::new().connect(&url, handler);

    assert_eq!(next_event(&mut events).await, Event::Open);
    assert_eq!(
        next_event(&mut events).await,
        Event::Message("hello".to_string())
    );
    assert!(matches!(
        next_event(&mut events).await,
        Event::Error(TransportError::InvalidFrame(_))
    ));
}

#[tokio::test]
async fn test_server_close_reports_code_and_reason() {
    let (url, _server) = serve_once(|mut ws| async move {
        ws.close(Some(CloseFrame {
            code: CloseCode::from(4000),
            reason: "bye".to_string().into(),
        }))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    })
    .await;

    let (handler, mut events) = recorder();
    let _conn = WebSocketTransport::new().connect(&url, handler);

    assert_eq!(next_event(&mut events).await, Event::Open);
    assert_eq!(
        next_event(&mut events).await,
        Event::Close(CloseEvent::clean(4000, "bye"))
    );
}

#[tokio::test]
async fn test_refused_connection_reports_error_then_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{addr}/ctl")).unwrap();
    let (handler, mut events) = recorder();
    let _conn = WebSocketTransport::new().connect(&url, handler);

    assert!(matches!(
        next_event(&mut events).await,
        Event::Error(TransportError::ConnectionFailed(_))
    ));
    match next_event(&mut events).await {
        Event::Close(close) => {
            assert_eq!(close.code, 1006);
            assert!(!close.was_clean);
        }
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_websocket_scheme_is_rejected() {
    let url = Url::parse("http://127.0.0.1:8372/ctl").unwrap();
    let (handler, mut events) = recorder();
    let _conn = WebSocketTransport::new().connect(&url, handler);

    assert!(matches!(
        next_event(&mut events).await,
        Event::Error(TransportError::InvalidUrl(_))
    ));
    assert!(matches!(next_event(&mut events).await, Event::Close(_)));
}

#[tokio::test]
async fn test_local_close_sends_close_frame_without_callback() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let (url, _server) = serve_once(move |mut ws| async move {
        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                let _ = seen_tx.send(());
            }
        }
    })
    .await;

    let (handler, mut events) = recorder();
    let conn = WebSocketTransport::new().connect(&url, handler);
    assert_eq!(next_event(&mut events).await, Event::Open);

    conn.close();

    timeout(Duration::from_secs(5), seen_rx.recv())
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());
}
