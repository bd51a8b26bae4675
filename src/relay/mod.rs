//! Connection registry and translated fan-out.
//!
//! - `registry`: who is connected and in which language
//! - `broadcaster`: `ChatRelay`, which translates each message once per recipient
//! - `session`: the per-connection receive loop

mod broadcaster;
mod registry;
mod session;

pub use broadcaster::{format_translated_line, BroadcastReport, ChatRelay};
pub use registry::{
    format_error_line, ConnectionHandle, ConnectionId, ConnectionInfo, ConnectionRegistry,
    Outbound, Recipient, SendError,
};
pub use session::{receive_loop, InboundFrame};
