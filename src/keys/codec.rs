// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Text codec for RSA keys.
//!
//! `decode_*` functions are total over present input: malformed text becomes
//! an [`InvalidKey`] sentinel instead of an error. Absent input (`None`) is a
//! programmer error and is rejected by the `try_decode_*` variants.

use std::fmt;

use base64ct::{Base64, Encoding};
use rand_core::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Algorithm name reported by valid keys.
pub const RSA_ALGORITHM: &str = "RSA";

/// Algorithm name reported by invalid-key sentinels.
pub const INVALID_ALGORITHM: &str = "INVALID";

/// Errors raised by key handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// No key text was supplied at all.
    #[error("key must not be null")]
    Missing,

    /// A cryptographic operation was attempted with an invalid key.
    #[error("cannot use invalid key: {0}")]
    InvalidKey(String),

    /// The underlying RSA operation failed.
    #[error("crypto operation failed: {0}")]
    Crypto(String),

    /// DER encoding of a key failed.
    #[error("key encoding failed: {0}")]
    Encoding(String),
}

/// Sentinel standing in for key text that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKey {
    encoded: String,
    reason: String,
}

impl InvalidKey {
    pub fn new(encoded: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
            reason: reason.into(),
        }
    }

    /// The text the key was decoded from, unchanged.
    pub fn encoded_text(&self) -> &str {
        &self.encoded
    }

    /// Why decoding failed.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for InvalidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key ({})", self.reason)
    }
}

/// A public key, or the sentinel for one that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Invalid(InvalidKey),
}

impl PublicKey {
    pub fn algorithm(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => RSA_ALGORITHM,
            PublicKey::Invalid(_) => INVALID_ALGORITHM,
        }
    }

    /// DER bytes of the key; empty for an invalid key.
    pub fn encoded(&self) -> Vec<u8> {
        match self {
            PublicKey::Rsa(key) => key
                .to_public_key_der()
                .map(|doc| doc.as_bytes().to_vec())
                .unwrap_or_default(),
            PublicKey::Invalid(_) => Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, PublicKey::Rsa(_))
    }

    /// Borrow the RSA key for a cryptographic operation.
    pub fn rsa(&self) -> Result<&RsaPublicKey, KeyError> {
        match self {
            PublicKey::Rsa(key) => Ok(key),
            PublicKey::Invalid(invalid) => Err(KeyError::InvalidKey(invalid.reason.clone())),
        }
    }
}

/// A private key, or the sentinel for one that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    Invalid(InvalidKey),
}

impl PrivateKey {
    pub fn algorithm(&self) -> &'static str {
        match self {
            PrivateKey::Rsa(_) => RSA_ALGORITHM,
            PrivateKey::Invalid(_) => INVALID_ALGORITHM,
        }
    }

    /// PKCS#8 DER bytes of the key; empty for an invalid key.
    pub fn encoded(&self) -> Vec<u8> {
        match self {
            PrivateKey::Rsa(key) => key
                .to_pkcs8_der()
                .map(|doc| doc.as_bytes().to_vec())
                .unwrap_or_default(),
            PrivateKey::Invalid(_) => Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, PrivateKey::Rsa(_))
    }

    pub fn rsa(&self) -> Result<&RsaPrivateKey, KeyError> {
        match self {
            PrivateKey::Rsa(key) => Ok(key),
            PrivateKey::Invalid(invalid) => Err(KeyError::InvalidKey(invalid.reason.clone())),
        }
    }
}

/// Public/private key pair of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    pub fn new(public: PublicKey, private: PrivateKey) -> Self {
        Self { public, private }
    }

    pub fn is_valid(&self) -> bool {
        self.public.is_valid() && self.private.is_valid()
    }
}

/// Encode a public key as Base64 DER text.
///
/// An invalid key encodes back to the text it was decoded from, so
/// re-saving a record never alters corrupt key material.
pub fn encode_public_key(key: &PublicKey) -> Result<String, KeyError> {
    match key {
        PublicKey::Rsa(key) => {
            let der = key
                .to_public_key_der()
                .map_err(|e| KeyError::Encoding(e.to_string()))?;
            Ok(Base64::encode_string(der.as_bytes()))
        }
        PublicKey::Invalid(invalid) => Ok(invalid.encoded.clone()),
    }
}

/// Encode a private key as Base64 PKCS#8 DER text.
pub fn encode_private_key(key: &PrivateKey) -> Result<String, KeyError> {
    match key {
        PrivateKey::Rsa(key) => {
            let der = key
                .to_pkcs8_der()
                .map_err(|e| KeyError::Encoding(e.to_string()))?;
            Ok(Base64::encode_string(der.as_bytes()))
        }
        PrivateKey::Invalid(invalid) => Ok(invalid.encoded.clone()),
    }
}

/// Decode public key text, producing a sentinel on malformed input.
pub fn decode_public_key(encoded: &str) -> PublicKey {
    let der = match base64_bytes(encoded) {
        Ok(der) => der,
        Err(reason) => return PublicKey::Invalid(InvalidKey::new(encoded, reason)),
    };
    match RsaPublicKey::from_public_key_der(&der) {
        Ok(key) => PublicKey::Rsa(key),
        Err(e) => PublicKey::Invalid(InvalidKey::new(encoded, e.to_string())),
    }
}

/// Decode private key text, producing a sentinel on malformed input.
pub fn decode_private_key(encoded: &str) -> PrivateKey {
    let der = match base64_bytes(encoded) {
        Ok(der) => der,
        Err(reason) => return PrivateKey::Invalid(InvalidKey::new(encoded, reason)),
    };
    match RsaPrivateKey::from_pkcs8_der(&der) {
        Ok(key) => PrivateKey::Rsa(key),
        Err(e) => PrivateKey::Invalid(InvalidKey::new(encoded, e.to_string())),
    }
}

/// Decode optional public key text; `None` is rejected.
pub fn try_decode_public_key(encoded: Option<&str>) -> Result<PublicKey, KeyError> {
    encoded.map(decode_public_key).ok_or(KeyError::Missing)
}

/// Decode optional private key text; `None` is rejected.
pub fn try_decode_private_key(encoded: Option<&str>) -> Result<PrivateKey, KeyError> {
    encoded.map(decode_private_key).ok_or(KeyError::Missing)
}

/// Generate a fresh RSA key pair with the given modulus size.
pub fn generate_key_pair(bits: usize) -> Result<KeyPair, KeyError> {
    let private = RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| KeyError::Crypto(e.to_string()))?;
    let public = RsaPublicKey::from(&private);
    Ok(KeyPair::new(PublicKey::Rsa(public), PrivateKey::Rsa(private)))
}

/// Base64 decode, ignoring embedded whitespace and line breaks.
fn base64_bytes(encoded: &str) -> Result<Vec<u8>, String> {
    let compact: String = encoded.split_ascii_whitespace().collect();
    if compact.is_empty() {
        return Err("empty key".to_string());
    }
    Base64::decode_vec(&compact).map_err(|e| e.to_string())
}
