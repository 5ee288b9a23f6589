//! Upload a local file.
//!
//! Run with: SQUARECLOUD_API_KEY=... cargo run --example upload_file -- <path> <name> [prefix] [expire_days]

use anyhow::Context;
use squareblob::{BlobClient, UploadOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "squareblob_client=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let path = PathBuf::from(args.next().context("missing file path")?);
    let name = args.next().context("missing object name")?;

    let mut options = UploadOptions::new();
    if let Some(prefix) = args.next() {
        options = options.with_prefix(prefix);
    }
    if let Some(expire) = args.next() {
        options = options.with_expire(expire.parse().context("expire must be a number of days")?);
    }

    let client = BlobClient::from_env()?;
    let envelope = client.upload_object(&name, path, options).await?;
    println!("Uploaded: {}", envelope.payload());

    Ok(())
}
