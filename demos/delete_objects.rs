//! Delete every object whose id contains the given pattern.
//!
//! Run with: SQUARECLOUD_API_KEY=... cargo run --example delete_objects -- <pattern>

use anyhow::Context;
use squareblob::{BlobClient, StoredObject};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "squareblob_client=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pattern = std::env::args().nth(1).context("missing id pattern")?;

    let client = BlobClient::from_env()?;
    let targets: Vec<StoredObject> = client
        .get_objects()
        .await?
        .into_iter()
        .filter(|object| object.id().contains(&pattern))
        .collect();

    if targets.is_empty() {
        println!("Nothing matches {:?}", pattern);
        return Ok(());
    }

    client.delete_objects(&targets).await?;
    println!("Deleted {} object(s)", targets.len());
    println!("Remaining in cache: {}", client.cache().objects().map_or(0, |o| o.len()));

    Ok(())
}
