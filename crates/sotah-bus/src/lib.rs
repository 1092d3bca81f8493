//! C7: message/bus broker client — envelope, codes, and NATS-backed
//! request/reply and topic transports (spec.md Section 4.7).

mod bus;
mod envelope;
mod subjects;

pub use bus::{Bus, Listener};
pub use envelope::{Code, Envelope, EnvelopeError};
pub use subjects::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request to {subject} timed out")]
    Timeout { subject: String },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
