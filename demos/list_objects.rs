//! List stored objects.
//!
//! Run with: SQUARECLOUD_API_KEY=... cargo run --example list_objects

use squareblob::BlobClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "squareblob_client=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = BlobClient::from_env()?;
    let objects = client.get_objects().await?;

    if objects.is_empty() {
        println!("No objects stored");
    }
    for object in &objects {
        println!(
            "{}  expires: {}  {}",
            object,
            object.expires_at().unwrap_or("never"),
            object.url()
        );
    }

    Ok(())
}
