//! Challenge nonce generation.

use rand::RngCore;

/// Length of a challenge nonce, in bytes. 20 bytes (matching the hash
/// length) would be a deliberate hardening change; left at 8 to match
/// the original `GetChallenge` wire format.
pub const NONCE_LEN: usize = 8;

/// `GetChallenge`: 8 bytes from a cryptographic RNG. Callers must not
/// cache the result — a fresh nonce is generated per attestation round.
pub fn generate() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}
