//! Blob API route table

use reqwest::Method;
use std::fmt;

/// A Blob API endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET account/stats`
    AccountInfo,
    /// `GET objects`
    ListObjects,
    /// `POST objects`
    Upload,
    /// `DELETE objects`
    Delete,
}

impl Endpoint {
    /// All endpoints
    pub const ALL: [Endpoint; 4] = [
        Endpoint::AccountInfo,
        Endpoint::ListObjects,
        Endpoint::Upload,
        Endpoint::Delete,
    ];

    /// Logical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountInfo => "ACCOUNT_INFO",
            Self::ListObjects => "LIST_OBJECTS",
            Self::Upload => "UPLOAD_OBJECTS",
            Self::Delete => "DELETE_OBJECTS",
        }
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        match self {
            Self::AccountInfo | Self::ListObjects => Method::GET,
            Self::Upload => Method::POST,
            Self::Delete => Method::DELETE,
        }
    }

    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::AccountInfo => "account/stats",
            Self::ListObjects | Self::Upload | Self::Delete => "objects",
        }
    }

    /// Full URL against a base such as `https://blob.squarecloud.app/v1/`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}
