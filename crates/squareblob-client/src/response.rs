//! API response envelope

use crate::{ClientError, Endpoint, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Envelope status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// One decoded API response: `{status, code?, response}`.
///
/// Construction never fails; turning an error envelope into a typed error is
/// left to [`ResponseEnvelope::into_result`].
#[derive(Clone, Debug)]
pub struct ResponseEnvelope {
    endpoint: Endpoint,
    status_code: u16,
    status: Status,
    error_code: Option<String>,
    payload: Value,
}

impl ResponseEnvelope {
    /// Wrap a decoded JSON body.
    ///
    /// Without a `status` field the HTTP status code decides.
    pub fn new(body: Value, endpoint: Endpoint, status_code: u16) -> Self {
        let status = match body.get("status").and_then(Value::as_str) {
            Some("success") => Status::Success,
            Some(_) => Status::Error,
            None if (200..300).contains(&status_code) => Status::Success,
            None => Status::Error,
        };
        let error_code = match status {
            Status::Error => body.get("code").and_then(Value::as_str).map(str::to_string),
            Status::Success => None,
        };
        let payload = match body {
            Value::Object(mut map) => map.remove("response").unwrap_or(Value::Null),
            _ => Value::Null,
        };

        Self {
            endpoint,
            status_code,
            status,
            error_code,
            payload,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Error code, present only on error envelopes
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// The `response` field of the body
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Typed error for an error envelope
    pub fn error(&self) -> Option<ClientError> {
        match self.status {
            Status::Success => None,
            Status::Error => Some(ClientError::from_code(self.error_code(), self.status_code)),
        }
    }

    /// Keep a success envelope, turn an error envelope into its typed error
    pub fn into_result(self) -> Result<Self> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Deserialize the payload
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            ClientError::InvalidResponse(format!("unexpected {} payload: {}", self.endpoint.name(), e))
        })
    }

    /// Hint for an error code, logged alongside the warning
    pub(crate) fn hint(&self) -> Option<&'static str> {
        match self.error_code()? {
            "ACCESS_DENIED" => Some("Check if your API key is valid"),
            "INVALID_OBJECT_NAME" => Some("Check if the object name or prefix is valid"),
            "TOO_MANY_OBJECTS" => Some("Too many objects to delete in one request"),
            "FAILED_DELETE" => Some("Failed to delete the object"),
            _ => None,
        }
    }
}
