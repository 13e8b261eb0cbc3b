//! Two Pulse clients on an in-memory session, pinging each other.
//!
//! Run with `RUST_LOG=debug cargo run -p ping-pong` to see the transport
//! and session tracing alongside the log entries.

use std::sync::Arc;
use std::time::Duration;

use pulse::prelude::*;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const ROUNDS: usize = 5;

#[tokio::main]
async fn main() -> Result<(), PulseError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let hub = MemoryHub::new();
    let alice = PulseClient::builder().build(hub.transport());
    let bob = PulseClient::builder()
        .delivery_mode(DeliveryMode::Unreliable)
        .build(hub.transport());

    // Print every entry; feed Alice's latency samples into a channel.
    let (latency_tx, mut latencies) = mpsc::unbounded_channel();
    alice
        .subscribe_log(Arc::new(move |entry: &LogEntry| {
            tracing::info!(client = "alice", "{entry}");
            if let Some(latency) = entry.latency {
                let _ = latency_tx.send(latency);
            }
        }))
        .await?;
    bob.subscribe_log(Arc::new(|entry: &LogEntry| {
        tracing::info!(client = "bob", "{entry}");
    }))
    .await?;
    bob.subscribe_ready(Arc::new(|ready: bool| {
        tracing::info!(client = "bob", ready, "readiness changed");
    }))
    .await?;

    let session = SessionDescriptor::new("127.0.0.1", 7000, "demo-token");
    alice.connect_session(session.clone()).await?;
    bob.connect_session(session).await?;

    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    for _ in 0..ROUNDS {
        ticker.tick().await;
        alice.send_timestamp_ping().await?;
    }
    bob.send_blank_packet(7).await?;

    let mut total = 0i64;
    let mut samples = 0i64;
    while samples < ROUNDS as i64 {
        match tokio::time::timeout(Duration::from_secs(1), latencies.recv()).await {
            Ok(Some(latency)) => {
                total += latency.value();
                samples += 1;
            }
            _ => break,
        }
    }
    if samples > 0 {
        tracing::info!(
            samples,
            mean_ns = total / samples,
            "latency summary"
        );
    }

    alice.leave_session().await?;
    bob.leave_session().await?;
    alice.shutdown().await?;
    bob.shutdown().await?;
    Ok(())
}
