//! Common types for the client SDK

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Billing details of an account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    /// Storage used beyond the plan, in bytes
    #[serde(alias = "extraStorage")]
    pub extra_storage: u64,
    /// Storage price, in BRL
    #[serde(alias = "storagePrice")]
    pub storage_price: f64,
    /// Objects price, in BRL
    #[serde(alias = "objectsPrice")]
    pub objects_price: f64,
    /// Total estimate, in BRL
    #[serde(alias = "totalEstimate")]
    pub total_estimate: f64,
}

/// Account usage snapshot.
///
/// The API refreshes these numbers roughly every two hours.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Number of stored objects
    pub objects: u64,
    /// Bytes occupied by all objects
    #[serde(alias = "storageOccupied")]
    pub storage_occupied: u64,
    /// Bytes included in the plan
    #[serde(alias = "planIncluded")]
    pub plan_included: u64,
    /// Billing details
    pub billing: Billing,
}

/// Object entry as listed by the API
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ObjectEntry {
    pub id: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// List payload, either `{objects: [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ObjectListPayload {
    Wrapped {
        #[serde(default)]
        objects: Vec<ObjectEntry>,
    },
    Bare(Vec<ObjectEntry>),
}

impl ObjectListPayload {
    pub fn into_entries(self) -> Vec<ObjectEntry> {
        match self {
            Self::Wrapped { objects } => objects,
            Self::Bare(objects) => objects,
        }
    }
}

/// An object stored in the blob service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    id: String,
    size: u64,
    created_at: Option<String>,
    expires_at: Option<String>,
    url: String,
}

impl StoredObject {
    /// Build an object; `url` is the public download URL for `id`
    pub fn new(
        id: impl Into<String>,
        size: u64,
        created_at: Option<String>,
        expires_at: Option<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            size,
            created_at,
            expires_at,
            url: url.into(),
        }
    }

    pub(crate) fn from_entry(entry: ObjectEntry, url: String) -> Self {
        Self::new(entry.id, entry.size, entry.created_at, entry.expires_at, url)
    }

    /// Server-assigned id, e.g. `<user>/<prefix>_<name>.<ext>`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Creation timestamp as sent by the server
    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    /// Expiry timestamp as sent by the server, if the object expires
    pub fn expires_at(&self) -> Option<&str> {
        self.expires_at.as_deref()
    }

    /// Public download URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last path segment of the id, used as the download file name
    pub fn file_name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

impl fmt::Display for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object(id={}, size={}KB)", self.id, self.size as f64 / 1000.0)
    }
}

/// Upload options
#[derive(Clone, Debug)]
pub struct UploadOptions {
    /// Object name prefix; sent only when non-empty
    pub prefix: Option<String>,
    /// Expiry in days; sent only when within 1..=365
    pub expire: Option<u32>,
    /// Serve the object as a download when its URL is opened
    pub auto_download: bool,
    /// Require a security hash in the object URL
    pub security_hash: bool,
    /// Explicit MIME type, skipping extension and signature detection
    pub mimetype: Option<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            expire: None,
            auto_download: true,
            security_hash: false,
            mimetype: None,
        }
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_expire(mut self, days: u32) -> Self {
        self.expire = Some(days);
        self
    }

    pub fn with_auto_download(mut self, auto_download: bool) -> Self {
        self.auto_download = auto_download;
        self
    }

    pub fn with_security_hash(mut self, security_hash: bool) -> Self {
        self.security_hash = security_hash;
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Query pairs for the upload request
    pub(crate) fn query(&self, name: &str) -> Vec<(String, String)> {
        let mut query = vec![
            ("name".to_string(), name.to_string()),
            ("auto_download".to_string(), self.auto_download.to_string()),
            ("security_hash".to_string(), self.security_hash.to_string()),
        ];
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            query.push(("prefix".to_string(), prefix.to_string()));
        }
        // Out-of-range values are dropped, not rejected.
        if let Some(expire) = self.expire.filter(|days| (1..=365).contains(days)) {
            query.push(("expire".to_string(), expire.to_string()));
        }
        query
    }
}

/// Result of a download
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Written to this path
    Saved(PathBuf),
    /// Not downloaded; `status` is absent when no response arrived
    Failed { status: Option<u16>, reason: String },
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}
