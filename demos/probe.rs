//! Headless probe: connect, run discovery, dump what the controller reports.
//!
//! Usage: probe [host] [port]

use std::time::Duration;

use russound_rio::{RioClient, SystemConfig, DEFAULT_PORT};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = std::env::args()
        .nth(2)
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    println!("Connecting to {host}:{port}...");
    let mut client = RioClient::connect(host, port, SystemConfig::default()).await?;

    // Give the staggered discovery sweep time to finish and the controller
    // time to answer.
    tokio::time::sleep(Duration::from_secs(3)).await;

    let sources = client.sources();
    println!("\n{} source(s):", sources.len());
    for entry in &sources {
        let source = client.source(entry.source)?;
        println!("  S[{}]  {:20} {}", entry.source, entry.name, source.source_type);
    }

    let zones = client.zones();
    println!("\n{} zone(s):", zones.len());
    for entry in &zones {
        let zone = client.zone(entry.zone)?;
        println!(
            "  {}  {:20} status={:?} volume={} source={}",
            entry.zone, zone.name, zone.status, zone.volume, zone.current_source
        );
    }

    if let Some(current) = client.current_zone() {
        println!("\nSelected zone: {current}");
    }

    client.shutdown().await;
    Ok(())
}
