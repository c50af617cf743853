//! Session transports
//!
//! - `sse`: SSE stream plus companion POST deliveries, with a pending buffer
//!   for deliveries that beat the stream handshake
//! - `stdio`: newline-delimited JSON-RPC over stdin/stdout

pub mod sse;
pub mod stdio;

pub use sse::{Delivery, DeliveryOutcome, SessionHandle, SessionHub};
pub use stdio::StdioSession;
