use ed25519_dalek::{Signature, VerifyingKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("public key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("public key must be 32 bytes, got {0}")]
    KeyLength(usize),
    #[error("public key is not a valid ed25519 point: {0}")]
    Key(#[from] ed25519_dalek::SignatureError),
}

/// Checks Discord's `X-Signature-Ed25519` header against the application's
/// public key. The signed message is the timestamp header followed by the
/// raw request body.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key_hex: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(public_key_hex.trim())?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::KeyLength(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes)?;
        Ok(Self { key })
    }

    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
        let Ok(raw) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&raw) else {
            return false;
        };
        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key.verify_strict(&message, &signature).is_ok()
    }
}

pub fn verify_signature(
    public_key_hex: &str,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> bool {
    match SignatureVerifier::from_hex(public_key_hex) {
        Ok(verifier) => verifier.verify(signature_hex, timestamp, body),
        Err(_) => false,
    }
}
