//! WebSocket connector
//!
//! `tokio-tungstenite` implementation of [`GatewayConnector`].

use super::{
    GatewayConnector, OutboundFrame, TransportConnection, TransportError, TransportEvent,
    TransportPeer,
};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Channel buffer size for each direction
const MESSAGE_BUFFER_SIZE: usize = 100;

/// How long to wait for the server to answer a close we sent
const CLOSE_GRACE: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects shards with `tokio-tungstenite`
#[derive(Debug, Clone)]
pub struct WsConnector {
    buffer: usize,
    close_grace: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self {
            buffer: MESSAGE_BUFFER_SIZE,
            close_grace: CLOSE_GRACE,
        }
    }
}

impl WsConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override how long a locally initiated close waits for the server
    #[must_use]
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    async fn writer_task(
        mut sink: SplitSink<WsStream, Message>,
        mut outbound: mpsc::Receiver<OutboundFrame>,
        close_sent: Arc<Notify>,
    ) {
        while let Some(frame) = outbound.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!(error = %e, "Failed to send frame to WebSocket");
                        break;
                    }
                }
                OutboundFrame::Close { code, reason } => {
                    let frame = CloseFrame {
                        code: WsCloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        tracing::debug!(error = %e, "Failed to send close frame");
                    }
                    close_sent.notify_one();
                    return;
                }
            }
        }

        // Sender dropped without an explicit close
        let _ = sink.close().await;
        close_sent.notify_one();
    }

    async fn reader_task(
        mut stream: SplitStream<WsStream>,
        events: mpsc::Sender<TransportEvent>,
        close_sent: Arc<Notify>,
        grace: Duration,
    ) {
        let closing = async {
            close_sent.notified().await;
            tokio::time::sleep(grace).await;
        };
        tokio::pin!(closing);

        let closed = loop {
            tokio::select! {
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(TransportEvent::Text(text)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break match frame {
                            Some(frame) => TransportEvent::Closed {
                                code: Some(u16::from(frame.code)),
                                reason: frame.reason.into_owned(),
                            },
                            None => TransportEvent::Closed { code: None, reason: String::new() },
                        };
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!("Ignoring binary frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        break TransportEvent::Closed { code: None, reason: e.to_string() };
                    }
                    None => {
                        break TransportEvent::Closed {
                            code: None,
                            reason: "connection closed".to_string(),
                        };
                    }
                },
                () = &mut closing => {
                    tracing::debug!("Server did not answer close, dropping connection");
                    break TransportEvent::Closed {
                        code: Some(super::NORMAL_CLOSURE),
                        reason: "closed locally".to_string(),
                    };
                }
            }
        };

        let _ = events.send(closed).await;
    }
}

#[async_trait]
impl GatewayConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<TransportConnection, TransportError> {
        let (ws_stream, _) =
            tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| TransportError::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        tracing::debug!(url = %url, "WebSocket connection established");

        let (sink, stream) = ws_stream.split();
        let (connection, TransportPeer { outbound, events }) =
            TransportConnection::pair(self.buffer);
        let close_sent = Arc::new(Notify::new());

        tokio::spawn(Self::writer_task(sink, outbound, Arc::clone(&close_sent)));
        tokio::spawn(Self::reader_task(
            stream,
            events,
            close_sent,
            self.close_grace,
        ));

        Ok(connection)
    }
}
