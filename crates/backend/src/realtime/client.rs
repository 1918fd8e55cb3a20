//! WebSocket connection to the realtime service.

use futures::SinkExt;
use signaldesk_core::ports::FeedError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::realtime::messages::Frame;

/// A raw realtime socket.
pub type RealtimeStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Open a socket to `url`, usually
/// [`BackendConfig::realtime_url`](crate::BackendConfig::realtime_url).
pub async fn connect(url: &str) -> Result<RealtimeStream, FeedError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| FeedError::Connection(format!("Failed to connect to realtime service: {e}")))?;
    tracing::debug!("Connected to realtime service");
    Ok(ws_stream)
}

/// Serialize and send one frame.
pub async fn send_frame<S>(sink: &mut S, frame: &Frame) -> Result<(), FeedError>
where
    S: SinkExt<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(frame).map_err(|e| FeedError::Protocol(e.to_string()))?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| FeedError::Protocol(format!("Failed to send {}: {e}", frame.event)))
}
