//! Secret generation and the hash commitment published before registration.
//!
//! The digest is computed by the program crate's own `compute_commitment`,
//! so what the client publishes is exactly what the program recomputes at reveal.

use prize_draw::constants::{COMMITMENT_LEN, SALT_LEN};
use prize_draw::state::compute_commitment;
use rand::RngCore;

use crate::error::{DrawError, Result};

pub type Commitment = [u8; COMMITMENT_LEN];

/// The operator's secret: a non-zero number and a random salt.
///
/// Held only in memory and in the local recovery store until the reveal.
#[derive(Clone, PartialEq, Eq)]
pub struct DrawSecret {
    secret_number: u64,
    salt: [u8; SALT_LEN],
}

impl DrawSecret {
    /// Draws 8 random bytes as a big-endian number (zero bumped to 1) and a 32-byte salt.
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let mut number_bytes = [0u8; 8];
        rng.fill_bytes(&mut number_bytes);
        let secret_number = match u64::from_be_bytes(number_bytes) {
            0 => 1,
            n => n,
        };

        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut salt);

        Self {
            secret_number,
            salt,
        }
    }

    pub fn from_parts(secret_number: u64, salt: [u8; SALT_LEN]) -> Result<Self> {
        if secret_number == 0 {
            return Err(DrawError::Validation("secret number must be > 0".into()));
        }
        Ok(Self {
            secret_number,
            salt,
        })
    }

    pub fn secret_number(&self) -> u64 {
        self.secret_number
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn commitment(&self) -> Commitment {
        compute_commitment(self.secret_number, &self.salt)
    }
}

// Keep the secret out of logs and panic messages.
impl std::fmt::Debug for DrawSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawSecret")
            .field("commitment", &short_hex(&self.commitment()))
            .finish_non_exhaustive()
    }
}

/// Recomputes the digest from a revealed secret and compares it.
pub fn verify_commitment(commitment: &Commitment, secret: &DrawSecret) -> bool {
    &secret.commitment() == commitment
}

/// `first8…last8` of the lowercase hex encoding.
pub fn short_hex(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    if encoded.len() <= 16 {
        return encoded;
    }
    format!("{}…{}", &encoded[..8], &encoded[encoded.len() - 8..])
}

pub(crate) fn decode_32(label: &str, text: &str) -> Result<[u8; 32]> {
    let raw = hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| DrawError::Store(format!("{} is not hex: {}", label, e)))?;
    raw.try_into()
        .map_err(|v: Vec<u8>| DrawError::Store(format!("{} has {} bytes, expected 32", label, v.len())))
}
