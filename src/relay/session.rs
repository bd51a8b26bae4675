use crate::relay::broadcaster::ChatRelay;
use crate::relay::registry::ConnectionId;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use tracing::{debug, warn};

/// Transport-neutral view of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Close,
    /// Binary, ping and pong frames carry no chat text.
    Ignored,
}

/// Drive one connection until it closes.
///
/// Each text frame is broadcast before the next frame is read. A close frame,
/// a receive error or the end of the stream unregisters the connection.
pub async fn receive_loop<S, E>(relay: &ChatRelay, id: ConnectionId, mut inbound: S)
where
    S: Stream<Item = Result<InboundFrame, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = inbound.next().await {
        match frame {
            Ok(InboundFrame::Text(text)) => {
                debug!("{} sent {} bytes", id, text.len());
                relay.broadcast(id, &text).await;
            }
            Ok(InboundFrame::Close) => {
                debug!("{} sent close", id);
                break;
            }
            Ok(InboundFrame::Ignored) => {}
            Err(e) => {
                warn!("Receive error on {}: {}", id, e);
                break;
            }
        }
    }

    relay.disconnect(id);
}
