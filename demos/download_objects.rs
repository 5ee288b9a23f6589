//! Download every stored object into the configured download directory.
//!
//! Run with: SQUARECLOUD_API_KEY=... cargo run --example download_objects

use squareblob::{BlobClient, DownloadOutcome};
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
    let mut failed = 0;
    for object in client.get_objects().await? {
        match client.download_object(&object).await? {
            DownloadOutcome::Saved(path) => println!("{} -> {}", object.id(), path.display()),
            DownloadOutcome::Failed { reason, .. } => {
                failed += 1;
                println!("{} failed: {}", object.id(), reason);
            }
        }
    }
    println!("Done, {} failure(s)", failed);

    Ok(())
}
