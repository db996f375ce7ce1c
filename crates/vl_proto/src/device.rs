//! Device records supplied by key custody.

use serde::{Deserialize, Serialize};
use vl_crypto::{DevicePublicKey, DeviceSecret};

use crate::error::EncryptError;

/// A recipient device as published by key custody. Immutable input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub user_id: String,
    pub device_id: String,
    /// Base64 X25519 public key. `None` for devices that never uploaded one.
    #[serde(default)]
    pub public_key: Option<String>,
}

impl Device {
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        public_key: &DevicePublicKey,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            public_key: Some(public_key.to_transport()),
        }
    }

    /// Parse the transport-encoded key, classifying absence vs. malformation.
    pub fn parsed_public_key(&self) -> Result<DevicePublicKey, EncryptError> {
        let text = self
            .public_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EncryptError::MissingPublicKey {
                user_id: self.user_id.clone(),
                device_id: self.device_id.clone(),
            })?;

        DevicePublicKey::from_transport(text).map_err(|e| EncryptError::InvalidPublicKey {
            device_id: self.device_id.clone(),
            reason: e.to_string(),
        })
    }
}

/// The local device: who we are plus the secret key custody handed us.
/// The secret never leaves process memory and is zeroized on drop.
#[derive(Debug)]
pub struct LocalIdentity {
    pub user_id: String,
    pub device_id: String,
    secret: DeviceSecret,
}

impl LocalIdentity {
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        secret: DeviceSecret,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            secret,
        }
    }

    pub fn secret(&self) -> &DeviceSecret {
        &self.secret
    }

    /// This device as a recipient record (for fanning out to our own devices).
    pub fn as_device(&self) -> Device {
        Device::new(&self.user_id, &self.device_id, &self.secret.public_key())
    }
}
