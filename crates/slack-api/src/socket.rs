//! Socket Mode event stream.
//!
//! Every envelope that carries an `envelope_id` is acknowledged before it is
//! interpreted, so Slack never redelivers an event the bot has seen.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::types::Envelope;
use crate::{Error, MessageEvent, Result, SlackClient};

pub struct SocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SocketConnection {
    pub async fn connect(client: &SlackClient) -> Result<Self> {
        let url = client.open_connection().await?;
        let (stream, _) = connect_async(url.as_str()).await?;
        info!("slack: socket mode connected");
        Ok(Self { stream })
    }

    /// Block until the next user message arrives.
    ///
    /// Returns `Ok(None)` when Slack asks the client to reconnect or closes the
    /// socket cleanly.
    pub async fn next_message(&mut self) -> Result<Option<MessageEvent>> {
        loop {
            let frame = self.stream.next().await.ok_or(Error::Closed)??;
            match frame {
                Message::Text(text) => {
                    let envelope: Envelope = serde_json::from_str(text.as_str())?;
                    if let Some(id) = &envelope.envelope_id {
                        let ack = serde_json::json!({ "envelope_id": id }).to_string();
                        self.stream.send(Message::text(ack)).await?;
                    }

                    match envelope.kind.as_str() {
                        "events_api" => {
                            let message = envelope
                                .payload
                                .and_then(|p| p.event)
                                .and_then(|e| e.into_message());
                            if let Some(message) = message {
                                return Ok(Some(message));
                            }
                        }
                        "disconnect" => {
                            info!("slack: socket mode disconnect requested");
                            return Ok(None);
                        }
                        other => debug!(kind = other, "slack: ignoring envelope"),
                    }
                }
                Message::Ping(payload) => self.stream.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
    }
}
