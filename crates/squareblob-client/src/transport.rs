//! HTTP transport seam

use crate::{ClientError, Config, Endpoint, ResponseEnvelope, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, multipart, Client};
use serde_json::Value;
use tracing::{debug, instrument};

/// Request body
#[derive(Clone, Debug)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Multipart form with the content in the `file` field
    Multipart {
        data: Bytes,
        mimetype: String,
        file_name: String,
    },
}

/// One call against an API endpoint
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Value of a query key
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response of a public download
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Executes HTTP calls for the client
#[async_trait]
pub trait Transport: Send + Sync {
    /// Call an authenticated API endpoint
    async fn send(&self, request: ApiRequest) -> Result<ResponseEnvelope>;

    /// Fetch a public URL without credentials
    async fn download(&self, url: &str) -> Result<RawResponse>;
}

/// `reqwest` transport
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    api_key: String,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from the client configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(endpoint = request.endpoint.name()))]
    async fn send(&self, request: ApiRequest) -> Result<ResponseEnvelope> {
        let ApiRequest {
            endpoint,
            query,
            body,
        } = request;
        let url = endpoint.url(&self.base_url);

        let mut req = self
            .http
            .request(endpoint.method(), &url)
            .header(header::AUTHORIZATION, &self.api_key);

        if !query.is_empty() {
            req = req.query(&query);
        }

        req = match body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(&value),
            RequestBody::Multipart {
                data,
                mimetype,
                file_name,
            } => {
                let len = data.len() as u64;
                let part = multipart::Part::stream_with_length(data, len)
                    .file_name(file_name)
                    .mime_str(&mimetype)?;
                req.multipart(multipart::Form::new().part("file", part))
            }
        };

        debug!("Sending {} request to {}", endpoint.method(), url);
        let response = req.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let body: Value = serde_json::from_slice(&bytes).map_err(|_| {
            ClientError::InvalidResponse(format!(
                "{} returned a non-JSON body (HTTP {}): {}",
                endpoint,
                status,
                String::from_utf8_lossy(&bytes[..bytes.len().min(200)])
            ))
        })?;

        Ok(ResponseEnvelope::new(body, endpoint, status))
    }

    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<RawResponse> {
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(RawResponse { status, body })
    }
}
