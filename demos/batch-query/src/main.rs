//! # Batch Query Demo
//!
//! Sends a run of block lookups to a JSON-RPC endpoint through the batching client
//! and reports how they were batched and how many came back with errors.
//!
//! ## Usage
//! ```bash
//! # 1000 blocks from 0x0, 8 connections, 100 requests per batch
//! cargo run --package batch-query -- --url http://127.0.0.1:8545 --count 1000 \
//!   --max-connections 8 --max-batch-size 100
//!
//! # Raw payloads only, no decoding
//! RUST_LOG=jrc_client=debug cargo run --package batch-query -- --url http://127.0.0.1:8545 --raw
//! ```
//!
//! Press Ctrl-C to cancel an in-flight run.

use anyhow::{Context, Result};
use clap::Parser;
use jrc_client::{BatchClientBuilder, CancellationToken, JsonRpcRequest};
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target JSON-RPC endpoint URL
    #[arg(short, long, default_value = "http://127.0.0.1:8545")]
    url: String,

    /// Number of requests to send
    #[arg(short, long, default_value = "1000")]
    count: i64,

    /// First block number to query
    #[arg(long, default_value = "0")]
    start: i64,

    /// Method to call for each block
    #[arg(short, long, default_value = "eth_getBlockByNumber")]
    method: String,

    /// Maximum concurrent batch exchanges
    #[arg(long, default_value = "4")]
    max_connections: usize,

    /// Maximum requests per batch
    #[arg(long, default_value = "50")]
    max_batch_size: usize,

    /// Print raw payload sizes instead of decoding responses
    #[arg(long, default_value = "false")]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let client = BatchClientBuilder::new()
        .with_endpoint(args.url.as_str())
        .with_max_connections(args.max_connections)
        .with_max_batch_size(args.max_batch_size)
        .build()
        .context("Failed to build batching client")?;

    let requests: Vec<JsonRpcRequest> = (0..args.count)
        .map(|id| {
            let block = args.start + id;
            JsonRpcRequest::new_with_array_params(
                id,
                args.method.as_str(),
                vec![json!(format!("{:#x}", block)), json!(false)],
            )
        })
        .collect();

    info!(
        url = %client.endpoint(),
        requests = requests.len(),
        max_connections = client.max_connections(),
        max_batch_size = client.max_batch_size(),
        "Starting batch run"
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, cancelling");
            ctrl_c.cancel();
        }
    });

    let started = Instant::now();

    if args.raw {
        let payloads = client.execute_raw_with_cancel(requests, cancel).await?;
        let failed = payloads.iter().filter(|p| p.is_transport_failure()).count();
        let bytes: usize = payloads.iter().map(|p| p.as_bytes().len()).sum();
        println!(
            "{} payloads ({} failed exchanges, {} bytes) in {:?}",
            payloads.len(),
            failed,
            bytes,
            started.elapsed()
        );
        return Ok(());
    }

    let responses = client
        .execute_with_cancel(requests, cancel)
        .await
        .context("Batch run failed")?;
    let errors = responses.iter().filter(|r| r.is_error()).count();

    println!(
        "{} responses ({} errors) in {:?}",
        responses.len(),
        errors,
        started.elapsed()
    );

    if let Some((id, error)) = responses
        .iter()
        .find_map(|r| r.error.as_ref().map(|e| (r.id, e)))
    {
        println!("first error: id {} -> {}", id, error);
    }

    Ok(())
}
