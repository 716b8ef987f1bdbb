//! File lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a file row.
///
/// The only transitions the service performs are `New -> Uploaded` and
/// `New -> Quarantined`, driven by upload notifications. Deleted files are
/// removed outright; there is no tombstone state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Newly created - the client has not yet uploaded the file to storage.
    New,
    /// The file has been uploaded to storage and scanned clean.
    Uploaded,
    /// The file was flagged by the upload scan and must not be served.
    Quarantined,
}

impl FileStatus {
    /// Get the string representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Uploaded => "uploaded",
            Self::Quarantined => "quarantined",
        }
    }

    /// Parse from the stored string representation.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "new" => Ok(Self::New),
            "uploaded" => Ok(Self::Uploaded),
            "quarantined" => Ok(Self::Quarantined),
            _ => Err(crate::Error::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
