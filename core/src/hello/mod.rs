//! Hello protocol — neighbor discovery and energy advertisement
//!
//! Every node broadcasts a fixed 8-byte hello carrying its residual energy,
//! the trust it claims for itself, and a random nonce. Receivers only need
//! the first six bytes; the nonce is carried but never interpreted.

pub mod codec;

pub use codec::{decode_hello, encode_hello};

use crate::routing::trust::clamp_trust;
use thiserror::Error;

/// Full hello length on the wire
pub const HELLO_LEN: usize = 8;

/// Shortest buffer a receiver accepts (energy + trust)
pub const HELLO_MIN_LEN: usize = 6;

/// Hello codec errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HelloError {
    #[error("Malformed hello: need at least {min} bytes, got {len}", min = HELLO_MIN_LEN)]
    Malformed { len: usize },
}

/// A decoded or to-be-encoded hello
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelloMessage {
    /// Sender's residual energy at the time of sending
    pub residual_energy: u16,
    /// Trust the sender claims for itself
    pub trust: f32,
    /// Random per-hello value; None when the sender truncated it
    pub nonce: Option<u16>,
}

impl HelloMessage {
    pub fn new(residual_energy: u16, trust: f32, nonce: u16) -> Self {
        Self {
            residual_energy,
            trust,
            nonce: Some(nonce),
        }
    }

    /// Serialize to the 8-byte wire layout
    pub fn to_bytes(&self) -> [u8; HELLO_LEN] {
        encode_hello(self.residual_energy, self.trust, self.nonce.unwrap_or(0))
    }

    /// Parse from the wire
    pub fn from_bytes(data: &[u8]) -> Result<Self, HelloError> {
        decode_hello(data)
    }

    /// Advertised trust made safe for storage: NaN reads as no trust,
    /// everything else is clamped into [0.0, 1.0].
    pub fn sanitized_trust(&self) -> f32 {
        clamp_trust(self.trust)
    }
}
