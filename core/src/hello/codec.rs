// Hello codec — fixed-offset binary layout
//
// Format (8 bytes, little-endian):
// [2 bytes] residual energy (u16)
// [4 bytes] trust (IEEE-754 f32 bits)
// [2 bytes] nonce (u16, ignored by receivers)

use super::{HelloError, HelloMessage, HELLO_LEN, HELLO_MIN_LEN};

const ENERGY_OFFSET: usize = 0;
const TRUST_OFFSET: usize = 2;
const NONCE_OFFSET: usize = 6;

/// Encode a hello into its wire form
pub fn encode_hello(residual_energy: u16, trust: f32, nonce: u16) -> [u8; HELLO_LEN] {
    let mut buf = [0u8; HELLO_LEN];
    buf[ENERGY_OFFSET..TRUST_OFFSET].copy_from_slice(&residual_energy.to_le_bytes());
    buf[TRUST_OFFSET..NONCE_OFFSET].copy_from_slice(&trust.to_bits().to_le_bytes());
    buf[NONCE_OFFSET..HELLO_LEN].copy_from_slice(&nonce.to_le_bytes());
    buf
}

/// Decode a hello
///
/// Anything shorter than 6 bytes is malformed. The nonce is only read when
/// the full 8 bytes are present; trailing bytes beyond that are ignored.
pub fn decode_hello(data: &[u8]) -> Result<HelloMessage, HelloError> {
    if data.len() < HELLO_MIN_LEN {
        return Err(HelloError::Malformed { len: data.len() });
    }

    let residual_energy = u16::from_le_bytes([data[ENERGY_OFFSET], data[ENERGY_OFFSET + 1]]);
    let trust = f32::from_bits(u32::from_le_bytes([
        data[TRUST_OFFSET],
        data[TRUST_OFFSET + 1],
        data[TRUST_OFFSET + 2],
        data[TRUST_OFFSET + 3],
    ]));
    let nonce = if data.len() >= HELLO_LEN {
        Some(u16::from_le_bytes([data[NONCE_OFFSET], data[NONCE_OFFSET + 1]]))
    } else {
        None
    };

    Ok(HelloMessage {
        residual_energy,
        trust,
        nonce,
    })
}
