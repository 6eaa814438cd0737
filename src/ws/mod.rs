//! WebSocket transport: observer sessions and the wire protocol

pub mod handler;
pub mod protocol;
