//! Notifier Service - Entry Point
//!
//! HTTP front for the notification dispatcher plus its background queue worker.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    zerg_notifier::run().await
}
