//! Certificate envelope format
//!
//! A certificate is a COSE_Sign1 envelope whose payload is a JSON
//! [`CertificateBody`]. The body carries the subject's public key, so a
//! certificate doubles as the verification key for everything it issues:
//! - an anchor is signed with its own key (self-signed)
//! - a leaf is signed with its anchor's key

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{KeyPair, PublicKey, SignedEnvelope};
use crate::error::{CoreError, Result, SigningError};
use crate::types::{CertificateType, RemoteTrustListItem};

/// Signed content of a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    pub kid: String,
    pub country: String,
    pub certificate_type: CertificateType,
    /// Subject's Ed25519 public key
    #[serde(serialize_with = "encode_key", deserialize_with = "decode_key")]
    pub public_key: Vec<u8>,
    /// Key ID of the issuing anchor (equal to `kid` for anchors)
    pub issuer_kid: String,
    pub issued_at: DateTime<Utc>,
}

fn encode_key<S: Serializer>(key: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(key))
}

fn decode_key<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

/// A decoded certificate: the envelope plus its parsed body
#[derive(Debug, Clone)]
pub struct Certificate {
    envelope: SignedEnvelope,
    body: CertificateBody,
}

impl Certificate {
    /// Decode a certificate from its raw encoding
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let envelope = SignedEnvelope::from_bytes(raw)?;
        let payload = envelope
            .payload()
            .ok_or_else(|| CoreError::MissingField("payload".into()))?;
        let body: CertificateBody = serde_json::from_slice(payload)
            .map_err(|e| CoreError::MalformedCertificate(e.to_string()))?;
        Ok(Self { envelope, body })
    }

    pub fn body(&self) -> &CertificateBody {
        &self.body
    }

    pub fn envelope(&self) -> &SignedEnvelope {
        &self.envelope
    }

    /// The subject key embedded in the body
    pub fn subject_key(&self) -> Result<PublicKey> {
        PublicKey::from_slice(&self.body.kid, &self.body.public_key)
    }

    /// Check that the signed body describes `item`: kid, country and type
    /// must all match the labels it was delivered under
    pub fn check_labels(&self, item: &RemoteTrustListItem) -> Result<()> {
        let body = &self.body;
        if body.kid != item.kid {
            return Err(CoreError::LabelMismatch(format!(
                "kid {} signed as {}",
                item.kid, body.kid
            )));
        }
        if body.country != item.country {
            return Err(CoreError::LabelMismatch(format!(
                "country {} signed as {}",
                item.country, body.country
            )));
        }
        if body.certificate_type != item.certificate_type {
            return Err(CoreError::LabelMismatch(format!(
                "type {} signed as {}",
                item.certificate_type, body.certificate_type
            )));
        }
        Ok(())
    }

    /// Check this certificate's signature against `issuer_key`
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        issuer_key.verify_envelope(&self.envelope)
    }

    /// Issue a self-signed anchor for `country`, returning its raw encoding
    pub fn self_signed_anchor(
        key_pair: &KeyPair,
        country: &str,
    ) -> std::result::Result<Vec<u8>, SigningError> {
        let body = CertificateBody {
            kid: key_pair.kid().to_string(),
            country: country.to_string(),
            certificate_type: CertificateType::Anchor,
            public_key: key_pair.verifying_key_bytes().to_vec(),
            issuer_kid: key_pair.kid().to_string(),
            issued_at: Utc::now(),
        };
        seal(key_pair, &body)
    }

    /// Issue a leaf for `subject`, signed by `anchor`
    pub fn issue_leaf(
        anchor: &KeyPair,
        subject: &KeyPair,
        country: &str,
    ) -> std::result::Result<Vec<u8>, SigningError> {
        let body = CertificateBody {
            kid: subject.kid().to_string(),
            country: country.to_string(),
            certificate_type: CertificateType::Leaf,
            public_key: subject.verifying_key_bytes().to_vec(),
            issuer_kid: anchor.kid().to_string(),
            issued_at: Utc::now(),
        };
        seal(anchor, &body)
    }
}

fn seal(signer: &KeyPair, body: &CertificateBody) -> std::result::Result<Vec<u8>, SigningError> {
    let payload = serde_json::to_vec(body).map_err(|e| SigningError::Envelope(e.to_string()))?;
    signer
        .sign_envelope(&payload)?
        .to_bytes()
        .map_err(|e| SigningError::Envelope(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_is_self_signed() {
        let kp = KeyPair::generate("IT-CSCA-1");
        let raw = Certificate::self_signed_anchor(&kp, "IT").unwrap();

        let cert = Certificate::from_bytes(&raw).unwrap();
        assert_eq!(cert.body().kid, "IT-CSCA-1");
        assert_eq!(cert.body().certificate_type, CertificateType::Anchor);
        assert_eq!(cert.body().issuer_kid, "IT-CSCA-1");

        let own_key = cert.subject_key().unwrap();
        assert!(cert.verify_signed_by(&own_key).is_ok());
    }

    #[test]
    fn test_leaf_is_signed_by_anchor() {
        let anchor = KeyPair::generate("IT-CSCA-1");
        let subject = KeyPair::generate("IT-DSC-1");

        let anchor_cert = Certificate::from_bytes(&Certificate::self_signed_anchor(&anchor, "IT").unwrap()).unwrap();
        let leaf = Certificate::from_bytes(&Certificate::issue_leaf(&anchor, &subject, "IT").unwrap()).unwrap();

        assert_eq!(leaf.body().issuer_kid, "IT-CSCA-1");
        assert!(leaf.verify_signed_by(&anchor_cert.subject_key().unwrap()).is_ok());
        // A leaf is not self-signed
        assert!(leaf.verify_signed_by(&leaf.subject_key().unwrap()).is_err());
    }

    #[test]
    fn test_labels_must_match_signed_body() {
        let kp = KeyPair::generate("IT-CSCA-1");
        let raw = Certificate::self_signed_anchor(&kp, "IT").unwrap();
        let cert = Certificate::from_bytes(&raw).unwrap();

        let item = RemoteTrustListItem::new("IT-CSCA-1", "IT", CertificateType::Anchor, raw.clone());
        assert!(cert.check_labels(&item).is_ok());

        for relabelled in [
            RemoteTrustListItem::new("OTHER", "IT", CertificateType::Anchor, raw.clone()),
            RemoteTrustListItem::new("IT-CSCA-1", "FR", CertificateType::Anchor, raw.clone()),
            RemoteTrustListItem::new("IT-CSCA-1", "IT", CertificateType::Leaf, raw.clone()),
        ] {
            assert!(matches!(
                cert.check_labels(&relabelled),
                Err(CoreError::LabelMismatch(_))
            ));
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Certificate::from_bytes(b"not a certificate").is_err());
        assert!(Certificate::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_envelope_with_foreign_payload_is_rejected() {
        let kp = KeyPair::generate("x");
        let raw = kp.sign_envelope(b"{\"hello\":1}").unwrap().to_bytes().unwrap();
        assert!(matches!(
            Certificate::from_bytes(&raw),
            Err(CoreError::MalformedCertificate(_))
        ));
    }
}
