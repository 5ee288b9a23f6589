//! # Square Cloud Blob Client
//!
//! An async client for the Square Cloud Blob object storage API.
//!
//! ## Features
//!
//! - **Cache-first reads**: account info and the object list are served from a
//!   time-boxed cache and refetched once it expires
//! - **Validated uploads**: size bounds and MIME type resolution happen before
//!   any request is sent
//! - **Consistent deletes**: deleted ids are pruned from the cached list
//! - **Pluggable transport**: the HTTP layer sits behind the [`Transport`] trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use squareblob_client::{BlobClient, Config, UploadOptions};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BlobClient::new(Config::new("your-api-key"))?;
//!
//!     // Upload a file that expires in a week
//!     let options = UploadOptions::new().with_prefix("docs").with_expire(7);
//!     client.upload_object("report", PathBuf::from("report.pdf"), options).await?;
//!
//!     // List objects and download the first one
//!     let objects = client.fetch_objects().await?;
//!     if let Some(first) = objects.first() {
//!         client.download_object(first).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod config;
mod endpoint;
mod error;
mod file;
mod log;
mod response;
pub mod transport;
mod types;

pub use cache::Cache;
pub use client::BlobClient;
pub use config::{Config, DEFAULT_BASE_URL, DEFAULT_PUBLIC_URL};
pub use endpoint::Endpoint;
pub use error::{ClientError, Result};
pub use file::{
    extension_mimetype, sniff_mimetype, ByteStream, FileInput, FileSource, MAX_FILE_SIZE,
    MIN_FILE_SIZE,
};
pub use log::Logger;
pub use response::{ResponseEnvelope, Status};
pub use transport::{HttpTransport, Transport};
pub use types::*;
