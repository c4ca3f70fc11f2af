//! WebSocket transport on tokio-tungstenite.
//!
//! Each connection runs in its own task. Outbound frames are queued on an
//! unbounded channel and written by that task, so [`Connection::send`] never
//! blocks. Text frames are delivered to the handler as they arrive; binary
//! frames are delivered too when they hold valid UTF-8.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use keyhub_transport::{
    CloseEvent, Connection, NO_STATUS_RECEIVED, Transport, TransportError, TransportHandler,
};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// WebSocket transport implementation
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create a new WebSocket transport
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn connect(&self, url: &Url, handler: Arc<dyn TransportHandler>) -> Box<dyn Connection> {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        tokio::spawn(run_connection(
            url.clone(),
            handler,
            outgoing_rx,
            shutdown.clone(),
        ));

        Box::new(WebSocketConnection {
            outgoing: outgoing_tx,
            shutdown,
        })
    }
}

/// Sending half of a client connection.
#[derive(Debug)]
struct WebSocketConnection {
    outgoing: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
}

impl Connection for WebSocketConnection {
    fn send(&self, text: String) -> Result<(), TransportError> {
        if self.shutdown.is_cancelled() {
            return Err(TransportError::ConnectionClosed);
        }

        self.outgoing
            .send(text)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_connection(
    url: Url,
    handler: Arc<dyn TransportHandler>,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    shutdown: CancellationToken,
) {
    if !matches!(url.scheme(), "ws" | "wss") {
        handler.on_error(TransportError::InvalidUrl(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
        handler.on_close(CloseEvent::abnormal("invalid url"));
        return;
    }

    debug!("Connecting to WebSocket at {}", url);

    let ws_stream = tokio::select! {
        () = shutdown.cancelled() => return,
        result = connect_async(url.as_str()) => match result {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                handler.on_error(TransportError::ConnectionFailed(format!(
                    "WebSocket connect failed: {e}"
                )));
                handler.on_close(CloseEvent::abnormal(e.to_string()));
                return;
            }
        },
    };

    handler.on_open();

    let (mut sink, mut stream) = ws_stream.split();

    let close = loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                // Detached by the owner: no further callbacks.
                let _ = sink.send(Message::Close(None)).await;
                info!("WebSocket connection to {} closed locally", url);
                return;
            }
            Some(text) = outgoing.recv() => {
                if let Err(e) = sink.send(Message::text(text)).await {
                    handler.on_error(TransportError::Io(e.to_string()));
                    break CloseEvent::abnormal(e.to_string());
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => handler.on_message(text.as_str().to_owned()),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => handler.on_message(text),
                    Err(e) => handler.on_error(TransportError::InvalidFrame(e.to_string())),
                },
                Some(Ok(Message::Close(frame))) => break close_event(frame),
                Some(Ok(_)) => {
                    // Ping and pong are answered by tungstenite
                }
                Some(Err(e)) => {
                    handler.on_error(TransportError::Io(e.to_string()));
                    break CloseEvent::abnormal(e.to_string());
                }
                None => break CloseEvent::abnormal("stream ended without close frame"),
            },
        }
    };

    debug!(
        "WebSocket connection to {} ended with code {}",
        url, close.code
    );
    handler.on_close(close);
}

fn close_event(frame: Option<CloseFrame>) -> CloseEvent {
    frame.map_or_else(
        || CloseEvent::clean(NO_STATUS_RECEIVED, ""),
        |frame| CloseEvent::clean(u16::from(frame.code), frame.reason.as_str()),
    )
}
