//! Storage object keys.
//!
//! Every uploaded file lives in object storage at `tenant/device/fileID`,
//! e.g. `fe6671ca-78de-4b19-9cd1-9e5247c2379e/f10348dd-e57d-47bf-8f35-b2b02ea23ec2/5`.
//! The same key shape is what upload notifications report back, so parsing
//! and formatting live together here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slash-delimited segments in a well-formed object key.
const KEY_PART_COUNT: usize = 3;

/// Parsed storage object key for a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Identifier of the tenant that owns the file.
    pub tenant_id: String,
    /// Identifier of the device that owns the file.
    pub device_id: String,
    /// Service-assigned file identity.
    pub file_id: i64,
}

impl ObjectKey {
    /// Build a key for a file.
    pub fn new(tenant_id: impl Into<String>, device_id: impl Into<String>, file_id: i64) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            device_id: device_id.into(),
            file_id,
        }
    }

    /// Parse an object key of the form `tenant/device/fileID`.
    ///
    /// Any other shape is rejected, including keys with empty segments or a
    /// non-numeric file identity.
    pub fn parse(key: &str) -> crate::Result<Self> {
        let parts: Vec<&str> = key.splitn(KEY_PART_COUNT, '/').collect();
        if parts.len() != KEY_PART_COUNT || parts.iter().any(|p| p.is_empty()) {
            return Err(crate::Error::InvalidObjectKey(format!(
                "expected {} segments in {:?}",
                KEY_PART_COUNT, key
            )));
        }

        let file_id: i64 = parts[2].parse().map_err(|_| {
            crate::Error::InvalidObjectKey(format!("non-numeric file id in {:?}", key))
        })?;

        Ok(Self {
            tenant_id: parts[0].to_string(),
            device_id: parts[1].to_string(),
            file_id,
        })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.device_id, self.file_id)
    }
}
