// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key Material
//!
//! RSA key handling for trusted applications.
//!
//! ## Encoding
//!
//! Keys travel and persist as Base64 text of their DER encoding:
//!
//! - public keys: X.509 `SubjectPublicKeyInfo`
//! - private keys: PKCS#8 `PrivateKeyInfo`
//!
//! ## Invalid keys
//!
//! Stored key text may be corrupt. Decoding never fails on malformed text;
//! it yields the `Invalid` variant carrying the original text, so a record
//! with a broken key can still be listed, re-saved and deleted. Only a
//! cryptographic use site (signing, verifying) fails, with
//! [`KeyError::InvalidKey`].

pub mod certificate;
pub mod codec;

pub use certificate::{CertificateError, EncodedCertificate, PROTOCOL_VERSION};
pub use codec::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key,
    generate_key_pair, try_decode_private_key, try_decode_public_key, InvalidKey, KeyError,
    KeyPair, PrivateKey, PublicKey, INVALID_ALGORITHM, RSA_ALGORITHM,
};
