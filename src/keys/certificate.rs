// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed request certificates exchanged between trusted applications.
//!
//! The calling application signs `(protocol, application id, issued-at,
//! user, url)` with its private key. The receiving side checks the signature
//! with the public key it has on record; policy checks (age, IP, URL) live
//! with the trusted application record.

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use rsa::Pkcs1v15Sign;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::codec::{KeyError, PrivateKey, PublicKey};

/// Version of the certificate payload layout.
pub const PROTOCOL_VERSION: u32 = 1;

/// Certificate presented by a calling application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCertificate {
    /// Application id of the issuer.
    pub application_id: String,
    /// Issue time in epoch milliseconds.
    pub issued_at: i64,
    /// User the request is made on behalf of.
    pub user_name: String,
    /// Target URL the certificate was issued for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Base64 PKCS#1 v1.5 SHA-256 signature over the payload.
    pub signature: String,
    pub protocol_version: u32,
}

/// Why a presented certificate was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate issued by '{found}', expected '{expected}'")]
    ApplicationMismatch { expected: String, found: String },

    #[error("unsupported certificate protocol version {0}")]
    UnsupportedProtocol(u32),

    #[error("cannot use invalid key: {0}")]
    InvalidKey(String),

    #[error("certificate signature is not valid Base64")]
    MalformedSignature,

    #[error("certificate signature does not verify")]
    BadSignature,

    #[error("certificate expired: age {age_millis}ms exceeds timeout {timeout_millis}ms")]
    Expired { age_millis: i64, timeout_millis: i64 },

    #[error("certificate issued in the future")]
    NotYetValid,

    #[error("client address '{0}' is not allowed")]
    IpNotAllowed(String),

    #[error("request url '{0}' is not allowed")]
    UrlNotAllowed(String),
}

impl From<KeyError> for CertificateError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::InvalidKey(reason) => CertificateError::InvalidKey(reason),
            other => CertificateError::InvalidKey(other.to_string()),
        }
    }
}

impl EncodedCertificate {
    /// Sign a certificate for `user_name` with the issuer's private key.
    pub fn sign(
        application_id: &str,
        private_key: &PrivateKey,
        user_name: &str,
        url: Option<&str>,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, KeyError> {
        let key = private_key.rsa()?;
        let issued_at = issued_at.timestamp_millis();
        let digest = payload_digest(PROTOCOL_VERSION, application_id, issued_at, user_name, url);
        let signature = key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| KeyError::Crypto(e.to_string()))?;

        Ok(Self {
            application_id: application_id.to_string(),
            issued_at,
            user_name: user_name.to_string(),
            url: url.map(str::to_string),
            signature: Base64::encode_string(&signature),
            protocol_version: PROTOCOL_VERSION,
        })
    }

    /// Check the signature against the issuer's public key.
    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<(), CertificateError> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(CertificateError::UnsupportedProtocol(self.protocol_version));
        }
        let key = public_key.rsa()?;
        let signature =
            Base64::decode_vec(&self.signature).map_err(|_| CertificateError::MalformedSignature)?;
        let digest = payload_digest(
            self.protocol_version,
            &self.application_id,
            self.issued_at,
            &self.user_name,
            self.url.as_deref(),
        );
        key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
            .map_err(|_| CertificateError::BadSignature)
    }
}

/// SHA-256 over the signed fields. Strings are length-prefixed and the URL
/// carries a presence tag, so no two field tuples share an encoding.
fn payload_digest(
    protocol_version: u32,
    application_id: &str,
    issued_at: i64,
    user_name: &str,
    url: Option<&str>,
) -> Vec<u8> {
    fn field(hasher: &mut Sha256, value: &str) {
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }

    let mut hasher = Sha256::new();
    hasher.update(protocol_version.to_be_bytes());
    field(&mut hasher, application_id);
    hasher.update(issued_at.to_be_bytes());
    field(&mut hasher, user_name);
    match url {
        Some(url) => {
            hasher.update([1u8]);
            field(&mut hasher, url);
        }
        None => hasher.update([0u8]),
    }
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::codec::{decode_private_key, decode_public_key, generate_key_pair};
    use crate::test_support::test_key_pair;

    #[test]
    fn signed_certificate_verifies() {
        let pair = test_key_pair();
        let cert = EncodedCertificate::sign("CONF", &pair.private, "fred", Some("/rest/api"), Utc::now())
            .unwrap();

        assert_eq!(cert.application_id, "CONF");
        assert_eq!(cert.user_name, "fred");
        assert_eq!(cert.protocol_version, PROTOCOL_VERSION);
        assert!(cert.verify_signature(&pair.public).is_ok());
    }

    #[test]
    fn tampered_certificate_fails() {
        let pair = test_key_pair();
        let mut cert = EncodedCertificate::sign("CONF", &pair.private, "fred", None, Utc::now()).unwrap();
        cert.user_name = "admin".to_string();

        assert_eq!(cert.verify_signature(&pair.public), Err(CertificateError::BadSignature));
    }

    #[test]
    fn fields_cannot_be_shifted_across_boundaries() {
        let pair = test_key_pair();
        let signed = EncodedCertificate::sign("CONF", &pair.private, "fred\n/rest", None, Utc::now())
            .unwrap();

        let shifted = EncodedCertificate {
            user_name: "fred".to_string(),
            url: Some("/rest".to_string()),
            ..signed.clone()
        };
        assert!(matches!(
            shifted.verify_signature(&pair.public),
            Err(CertificateError::BadSignature)
        ));

        let empty_url = EncodedCertificate {
            url: Some(String::new()),
            ..signed.clone()
        };
        assert!(matches!(
            empty_url.verify_signature(&pair.public),
            Err(CertificateError::BadSignature)
        ));
        assert!(signed.verify_signature(&pair.public).is_ok());
    }

    #[test]
    fn other_key_fails() {
        let pair = test_key_pair();
        let other = generate_key_pair(1024).unwrap();
        let cert = EncodedCertificate::sign("CONF", &pair.private, "fred", None, Utc::now()).unwrap();

        assert_eq!(cert.verify_signature(&other.public), Err(CertificateError::BadSignature));
    }

    #[test]
    fn invalid_private_key_cannot_sign() {
        let key = decode_private_key("CRAPPYNOTENCODEDKEYDATA");
        let result = EncodedCertificate::sign("CONF", &key, "fred", None, Utc::now());
        assert!(matches!(result, Err(KeyError::InvalidKey(_))));
    }

    #[test]
    fn invalid_public_key_cannot_verify() {
        let pair = test_key_pair();
        let cert = EncodedCertificate::sign("CONF", &pair.private, "fred", None, Utc::now()).unwrap();
        let result = cert.verify_signature(&decode_public_key(""));
        assert!(matches!(result, Err(CertificateError::InvalidKey(_))));
    }

    #[test]
    fn garbage_signature_is_malformed() {
        let pair = test_key_pair();
        let mut cert = EncodedCertificate::sign("CONF", &pair.private, "fred", None, Utc::now()).unwrap();
        cert.signature = "not base64!".to_string();
        assert_eq!(cert.verify_signature(&pair.public), Err(CertificateError::MalformedSignature));
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let pair = test_key_pair();
        let mut cert = EncodedCertificate::sign("CONF", &pair.private, "fred", None, Utc::now()).unwrap();
        cert.protocol_version = 99;
        assert_eq!(
            cert.verify_signature(&pair.public),
            Err(CertificateError::UnsupportedProtocol(99))
        );
    }
}
