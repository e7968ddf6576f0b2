//! Cryptographic primitives for certificate envelopes and outbound payloads
//!
//! Everything signed by this crate is a COSE_Sign1 structure using Ed25519
//! keys:
//! - `KeyPair`: Ed25519 key pair for signing
//! - `PublicKey`: Ed25519 public key for verification
//! - `SignedEnvelope`: COSE_Sign1 wrapper with the key ID in the protected header
//! - `PayloadSigner`: the signing capability consumed by the upload flow

use base64::{engine::general_purpose::STANDARD, Engine};
use coset::{iana, CborSerializable, CoseSign1, CoseSign1Builder, HeaderBuilder};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::{CoreError, Result, SigningError};

/// COSE algorithm identifier for EdDSA (Ed25519)
const EDDSA_ALG: iana::Algorithm = iana::Algorithm::EdDSA;

/// A COSE_Sign1 envelope
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    cose: CoseSign1,
}

impl SignedEnvelope {
    /// Get the raw COSE_Sign1 structure
    pub fn cose(&self) -> &CoseSign1 {
        &self.cose
    }

    /// Get the key ID from the protected header
    pub fn kid(&self) -> Option<String> {
        let kid = &self.cose.protected.header.key_id;
        if kid.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(kid).to_string())
        }
    }

    /// Get the signature bytes
    pub fn signature(&self) -> &[u8] {
        &self.cose.signature
    }

    /// Get the payload bytes
    pub fn payload(&self) -> Option<&[u8]> {
        self.cose.payload.as_deref()
    }

    /// Serialize to CBOR bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.cose.clone().to_vec().map_err(CoreError::from)
    }

    /// Deserialize from CBOR bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let cose = CoseSign1::from_slice(bytes).map_err(CoreError::from)?;
        Ok(Self { cose })
    }
}

/// Ed25519 key pair
#[derive(Clone)]
pub struct KeyPair {
    kid: String,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("kid", &self.kid)
            .field("verifying_key", &"[redacted]")
            .finish()
    }
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate(kid: impl Into<String>) -> Self {
        Self::from_signing_key(kid, SigningKey::generate(&mut OsRng))
    }

    /// Create a key pair from an existing signing key
    pub fn from_signing_key(kid: impl Into<String>, signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            kid: kid.into(),
            signing_key,
            verifying_key,
        }
    }

    /// Create a key pair from a 32-byte seed
    pub fn from_bytes(kid: impl Into<String>, bytes: &[u8; 32]) -> Self {
        Self::from_signing_key(kid, SigningKey::from_bytes(bytes))
    }

    /// Create a key pair from a base64-encoded 32-byte seed
    pub fn from_base64(kid: impl Into<String>, encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CoreError::CryptoError(format!("Invalid base64 key: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::CryptoError("Invalid key length, expected 32".into()))?;
        Ok(Self::from_bytes(kid, &bytes))
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            kid: self.kid.clone(),
            verifying_key: self.verifying_key,
        }
    }

    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign arbitrary bytes and wrap them in COSE_Sign1
    pub fn sign_envelope(&self, payload: &[u8]) -> std::result::Result<SignedEnvelope, SigningError> {
        let protected = HeaderBuilder::new()
            .algorithm(EDDSA_ALG)
            .key_id(self.kid.as_bytes().to_vec())
            .build();

        let builder = CoseSign1Builder::new()
            .protected(protected)
            .payload(payload.to_vec());

        let signed = builder.try_create_signature(&[], |data| {
            let signature = self.signing_key.sign(data);
            Ok::<_, SigningError>(signature.to_bytes().to_vec())
        })?;

        Ok(SignedEnvelope {
            cose: signed.build(),
        })
    }
}

/// Ed25519 public key
#[derive(Clone)]
pub struct PublicKey {
    kid: String,
    verifying_key: VerifyingKey,
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey").field("kid", &self.kid).finish()
    }
}

impl PublicKey {
    /// Create a public key from raw bytes
    pub fn from_bytes(kid: impl Into<String>, bytes: &[u8; 32]) -> Result<Self> {
        let verifying_key = VerifyingKey::from_bytes(bytes)?;
        Ok(Self {
            kid: kid.into(),
            verifying_key,
        })
    }

    /// Create a public key from a slice, checking the length
    pub fn from_slice(kid: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::CryptoError(format!("Invalid public key length: {}, expected 32", bytes.len()))
        })?;
        Self::from_bytes(kid, &bytes)
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Verify the signature of a COSE_Sign1 envelope with this key
    ///
    /// Only the signature is checked; the envelope's key ID header is
    /// informational.
    pub fn verify_envelope(&self, envelope: &SignedEnvelope) -> Result<()> {
        let sig_structure = envelope.cose.tbs_data(&[]);

        let signature_bytes: [u8; 64] = envelope
            .cose
            .signature
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::SignatureInvalid("Invalid signature length".into()))?;
        let signature = Signature::from_bytes(&signature_bytes);

        self.verifying_key
            .verify(&sig_structure, &signature)
            .map_err(|e| CoreError::SignatureInvalid(e.to_string()))
    }
}

/// Signing capability used before payloads are sent to the gateway
pub trait PayloadSigner: Send + Sync {
    /// Sign raw certificate bytes, returning the transport encoding of the
    /// signed payload
    fn sign(&self, raw: &[u8]) -> std::result::Result<String, SigningError>;
}

/// Signs payloads as base64 COSE_Sign1 envelopes with this instance's key
#[derive(Debug, Clone, Default)]
pub struct CoseSigner {
    key_pair: Option<KeyPair>,
}

impl CoseSigner {
    pub fn new(key_pair: KeyPair) -> Self {
        Self {
            key_pair: Some(key_pair),
        }
    }

    /// A signer with no key material; every call fails with `KeyUnavailable`
    pub fn unconfigured() -> Self {
        Self { key_pair: None }
    }

    pub fn kid(&self) -> Option<&str> {
        self.key_pair.as_ref().map(|kp| kp.kid())
    }
}

impl PayloadSigner for CoseSigner {
    fn sign(&self, raw: &[u8]) -> std::result::Result<String, SigningError> {
        let key_pair = self.key_pair.as_ref().ok_or(SigningError::KeyUnavailable)?;
        if raw.is_empty() {
            return Err(SigningError::EmptyPayload);
        }
        let envelope = key_pair.sign_envelope(raw)?;
        let bytes = envelope
            .to_bytes()
            .map_err(|e| SigningError::Envelope(e.to_string()))?;
        Ok(STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate("test-key-1");
        assert_eq!(kp.kid(), "test-key-1");
        assert_eq!(kp.public_key().kid(), "test-key-1");
    }

    #[test]
    fn test_sign_and_verify_envelope() {
        let kp = KeyPair::generate("signer");
        let envelope = kp.sign_envelope(b"certificate bytes").unwrap();

        assert_eq!(envelope.kid().as_deref(), Some("signer"));
        assert_eq!(envelope.payload(), Some(&b"certificate bytes"[..]));
        assert_eq!(envelope.signature().len(), 64);
        assert!(kp.public_key().verify_envelope(&envelope).is_ok());
    }

    #[test]
    fn test_verification_fails_with_wrong_key() {
        let kp1 = KeyPair::generate("key-1");
        let kp2 = KeyPair::generate("key-2");

        let envelope = kp1.sign_envelope(b"payload").unwrap();
        assert!(kp2.public_key().verify_envelope(&envelope).is_err());
    }

    #[test]
    fn test_envelope_survives_cbor_encoding() {
        let kp = KeyPair::generate("key");
        let envelope = kp.sign_envelope(b"payload").unwrap();

        let restored = SignedEnvelope::from_bytes(&envelope.to_bytes().unwrap()).unwrap();
        assert!(kp.public_key().verify_envelope(&restored).is_ok());
    }

    #[test]
    fn test_keypair_from_base64_seed() {
        let kp1 = KeyPair::generate("key-1");
        let encoded = STANDARD.encode(kp1.signing_key_bytes());

        let kp2 = KeyPair::from_base64("key-2", &encoded).unwrap();
        assert_eq!(kp2.verifying_key_bytes(), kp1.verifying_key_bytes());
        assert!(KeyPair::from_base64("bad", "AAAA").is_err());
    }

    #[test]
    fn test_public_key_from_slice_checks_length() {
        assert!(PublicKey::from_slice("k", &[0u8; 31]).is_err());
    }

    #[test]
    fn test_signer_produces_verifiable_envelope() {
        let kp = KeyPair::generate("worker");
        let signer = CoseSigner::new(kp.clone());

        let encoded = signer.sign(b"raw cert").unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        let envelope = SignedEnvelope::from_bytes(&bytes).unwrap();

        assert!(kp.public_key().verify_envelope(&envelope).is_ok());
        assert_eq!(envelope.payload(), Some(&b"raw cert"[..]));
    }

    #[test]
    fn test_signer_without_key_fails() {
        let signer = CoseSigner::unconfigured();
        assert_eq!(signer.sign(b"raw"), Err(SigningError::KeyUnavailable));
    }

    #[test]
    fn test_signer_rejects_empty_payload() {
        let signer = CoseSigner::new(KeyPair::generate("worker"));
        assert_eq!(signer.sign(&[]), Err(SigningError::EmptyPayload));
    }
}
