//! Client error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// The file source could not be used (unseekable stream, empty selection, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File is above the upload ceiling
    #[error("File too large: {size} bytes (maximum is {max} bytes)", max = crate::file::MAX_FILE_SIZE)]
    FileTooLarge { size: usize },

    /// File is below the upload floor
    #[error("File too small: {size} bytes (minimum is {min} bytes)", min = crate::file::MIN_FILE_SIZE)]
    FileTooSmall { size: usize },

    /// The path extension is not an accepted file type
    #[error("Invalid file type: {extension:?}")]
    InvalidFileType { extension: String },

    /// No explicit type, no extension match and no known signature
    #[error("Could not determine the mimetype of the file")]
    UndeterminedMimeType,

    /// `ACCESS_DENIED`
    #[error("Unauthorized: check that the API key is valid")]
    Unauthorized,

    /// `INVALID_OBJECT_NAME`
    #[error("Invalid object name or prefix")]
    InvalidObjectName,

    /// `TOO_MANY_OBJECTS`
    #[error("Too many objects in a single delete request")]
    TooManyObjects,

    /// `FAILED_DELETE`
    #[error("Failed to delete the object")]
    FailedToDelete,

    /// Any other error code reported by the API
    #[error("API error: {code}")]
    Api { code: String },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Map an envelope error code to a typed error.
    ///
    /// A missing code falls back to `HTTP<status>`.
    pub fn from_code(code: Option<&str>, status: u16) -> Self {
        match code {
            Some("ACCESS_DENIED") => Self::Unauthorized,
            Some("INVALID_OBJECT_NAME") => Self::InvalidObjectName,
            Some("TOO_MANY_OBJECTS") => Self::TooManyObjects,
            Some("FAILED_DELETE") => Self::FailedToDelete,
            Some(other) => Self::Api {
                code: other.to_string(),
            },
            None => Self::Api {
                code: format!("HTTP{}", status),
            },
        }
    }

    /// Check if this error was raised locally before any request was sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::FileTooLarge { .. }
                | Self::FileTooSmall { .. }
                | Self::InvalidFileType { .. }
                | Self::UndeterminedMimeType
        )
    }

    /// Check if this error was reported by the API in an error envelope
    pub fn is_server_reported(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::InvalidObjectName
                | Self::TooManyObjects
                | Self::FailedToDelete
                | Self::Api { .. }
        )
    }
}
