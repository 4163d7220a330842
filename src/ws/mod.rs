//! WebSocket transport: protocol types, gateway fanout, upgrade handler

pub mod gateway;
pub mod handler;
pub mod protocol;
