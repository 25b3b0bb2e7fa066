// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! This application's own trust identity: its application id and key pair.
//!
//! The identity lives in the property store under
//! [`PROPERTY_APPLICATION_ID`], [`PROPERTY_PUBLIC_KEY`] and
//! [`PROPERTY_PRIVATE_KEY`]. Whatever is missing on first start is generated
//! and persisted. Corrupt stored keys load as invalid-key sentinels; they only
//! fail once something is signed with them.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{TrustedAppError, TrustedAppResult};
use crate::keys::{
    self, decode_private_key, decode_public_key, EncodedCertificate, KeyError, KeyPair,
    PrivateKey, PublicKey,
};
use crate::storage::{
    PropertyStore, PROPERTY_APPLICATION_ID, PROPERTY_PRIVATE_KEY, PROPERTY_PUBLIC_KEY,
};

/// The local application as peers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentApplication {
    application_id: String,
    key_pair: KeyPair,
}

impl CurrentApplication {
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.key_pair.public
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Issue a request certificate for `user_name`, signed now.
    pub fn encode(&self, user_name: &str, url: Option<&str>) -> Result<EncodedCertificate, KeyError> {
        EncodedCertificate::sign(
            &self.application_id,
            &self.key_pair.private,
            user_name,
            url,
            Utc::now(),
        )
    }
}

/// Loads, generates and replaces the local application identity.
pub struct CurrentApplicationStore {
    properties: Arc<dyn PropertyStore>,
    server_id: Option<String>,
    key_bits: usize,
    current: RwLock<Option<Arc<CurrentApplication>>>,
}

impl CurrentApplicationStore {
    /// `server_id` seeds a stable application id; without it a random one is
    /// generated. `key_bits` sizes generated RSA keys.
    pub fn new(properties: Arc<dyn PropertyStore>, server_id: Option<String>, key_bits: usize) -> Self {
        Self {
            properties,
            server_id,
            key_bits,
            current: RwLock::new(None),
        }
    }

    /// Load the identity, generating and persisting any missing part.
    pub fn start(&self) -> TrustedAppResult<Arc<CurrentApplication>> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut pending: Vec<(&str, String)> = Vec::new();

        let application_id = match self.properties.get(PROPERTY_APPLICATION_ID)? {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                let id = self.derive_application_id();
                pending.push((PROPERTY_APPLICATION_ID, id.clone()));
                id
            }
        };

        let stored_public = self.properties.get(PROPERTY_PUBLIC_KEY)?;
        let stored_private = self.properties.get(PROPERTY_PRIVATE_KEY)?;
        let key_pair = match (stored_public, stored_private) {
            (Some(public), Some(private)) => {
                let pair = KeyPair::new(decode_public_key(&public), decode_private_key(&private));
                if !pair.is_valid() {
                    tracing::warn!(
                        public = pair.public.algorithm(),
                        private = pair.private.algorithm(),
                        "Stored key pair is not usable"
                    );
                }
                pair
            }
            _ => {
                let pair = keys::generate_key_pair(self.key_bits)?;
                pending.extend(encode_keys(&pair)?);
                tracing::info!(bits = self.key_bits, "Generated application key pair");
                pair
            }
        };

        if !pending.is_empty() {
            let entries: Vec<(&str, &str)> =
                pending.iter().map(|(key, value)| (*key, value.as_str())).collect();
            self.properties.set_all(&entries)?;
            tracing::info!(
                application_id = %application_id,
                written = entries.len(),
                "Persisted application identity"
            );
        }

        let app = Arc::new(CurrentApplication {
            application_id,
            key_pair,
        });
        *current = Some(Arc::clone(&app));
        Ok(app)
    }

    /// The loaded identity, starting the store on first use.
    pub fn current_application(&self) -> TrustedAppResult<Arc<CurrentApplication>> {
        if let Some(app) = self.current.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(Arc::clone(app));
        }
        self.start()
    }

    pub fn key_pair(&self) -> TrustedAppResult<KeyPair> {
        Ok(self.current_application()?.key_pair.clone())
    }

    /// Replace the identity. Rejects a blank id or unusable keys and leaves
    /// the current identity untouched in that case.
    pub fn set_current_application(&self, application_id: &str, key_pair: KeyPair) -> TrustedAppResult<()> {
        if application_id.trim().is_empty() {
            return Err(TrustedAppError::invalid_argument("application id must not be blank"));
        }
        if let PublicKey::Invalid(invalid) = &key_pair.public {
            return Err(TrustedAppError::invalid_argument(format!(
                "public key is not valid: {}",
                invalid.reason()
            )));
        }
        if let PrivateKey::Invalid(invalid) = &key_pair.private {
            return Err(TrustedAppError::invalid_argument(format!(
                "private key is not valid: {}",
                invalid.reason()
            )));
        }

        let [(_, public), (_, private)] = encode_keys(&key_pair)?;

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.properties.set_all(&[
            (PROPERTY_APPLICATION_ID, application_id),
            (PROPERTY_PUBLIC_KEY, public.as_str()),
            (PROPERTY_PRIVATE_KEY, private.as_str()),
        ])?;
        *current = Some(Arc::new(CurrentApplication {
            application_id: application_id.to_string(),
            key_pair,
        }));
        tracing::info!(application_id, "Replaced current application identity");
        Ok(())
    }

    /// [`set_current_application`](Self::set_current_application) from
    /// encoded key text. Absent text is rejected like a bad key.
    pub fn set_current_application_encoded(
        &self,
        application_id: &str,
        public_key: Option<&str>,
        private_key: Option<&str>,
    ) -> TrustedAppResult<()> {
        let missing = |e: KeyError| TrustedAppError::invalid_argument(e.to_string());
        let public = keys::try_decode_public_key(public_key).map_err(missing)?;
        let private = keys::try_decode_private_key(private_key).map_err(missing)?;
        self.set_current_application(application_id, KeyPair::new(public, private))
    }

    fn derive_application_id(&self) -> String {
        match self.server_id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(server_id) => Uuid::new_v5(&Uuid::NAMESPACE_OID, server_id.as_bytes()).to_string(),
            None => Uuid::new_v4().to_string(),
        }
    }
}

/// Property entries for both halves of a key pair.
fn encode_keys(key_pair: &KeyPair) -> TrustedAppResult<[(&'static str, String); 2]> {
    Ok([
        (PROPERTY_PUBLIC_KEY, keys::encode_public_key(&key_pair.public)?),
        (PROPERTY_PRIVATE_KEY, keys::encode_private_key(&key_pair.private)?),
    ])
}
