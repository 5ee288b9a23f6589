//! Print account usage and billing estimates.
//!
//! Run with: SQUARECLOUD_API_KEY=... cargo run --example account_info

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
    let account = client.get_account_info().await?;

    println!("Objects:          {}", account.objects);
    println!("Storage occupied: {} bytes", account.storage_occupied);
    println!("Plan included:    {} bytes", account.plan_included);
    println!("Extra storage:    {} bytes", account.billing.extra_storage);
    println!("Total estimate:   {} BRL", account.billing.total_estimate);

    Ok(())
}
