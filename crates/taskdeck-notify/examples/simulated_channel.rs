//! Example driving the notification engine through a flaky channel.
//!
//! Spawns the service with aggressive fault injection so disconnects and
//! reconnect drains happen within seconds, sends a notification every few
//! hundred milliseconds, and prints what the subscribers observe.
//!
//! Run with:
//! ```bash
//! RUST_LOG=taskdeck_notify=debug cargo run --example simulated_channel
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use taskdeck_core::{NotificationKind, SendNotification};
use taskdeck_notify::{ConnectionConfig, NotificationService, ServiceConfig};
use taskdeck_store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Heartbeats every 500ms with a 40% fault chance, short recovery
    // windows: plenty of disconnects in a 10 second run.
    let config = ServiceConfig::default()
        .with_delivery_delay(Duration::from_millis(50), Duration::from_millis(200))
        .with_connection(
            ConnectionConfig::default()
                .with_heartbeat_interval(Duration::from_millis(500))
                .with_fault_probability(0.4)
                .with_reconnect_window(Duration::from_millis(800), Duration::from_millis(1500))
                .with_connecting_duration(Duration::from_millis(300)),
        );

    let store = Arc::new(MemoryStore::new());
    let service = NotificationService::new(store, config);

    let mut status_sub = service.subscribe_connection();
    tokio::spawn(async move {
        while let Some(status) = status_sub.recv().await {
            println!("  [channel] {}", status);
        }
    });

    let mut list_sub = service.subscribe("demo-user");
    tokio::spawn(async move {
        while let Some(list) = list_sub.recv().await {
            let unread = list.iter().filter(|n| !n.is_read).count();
            println!("  [push] {} notifications, {} unread", list.len(), unread);
        }
    });

    let mut deliveries = service.delivery_events();
    tokio::spawn(async move {
        while let Ok(event) = deliveries.recv().await {
            println!(
                "  [delivered] {} \"{}\"",
                event.notification.kind, event.notification.title
            );
        }
    });

    println!("Sending 20 notifications across a flaky channel...\n");
    for i in 1..=20 {
        let sent = service
            .send(
                SendNotification::new(
                    NotificationKind::TaskUpdated,
                    "demo-user",
                    format!("Task #{i} updated"),
                    "Someone touched a task you follow",
                )
                .with_sender("demo-bot")
                .with_metadata(json!({"sequence": i})),
            )
            .await?;
        println!(
            "send #{i}: {} (queued: {})",
            sent.id,
            service.offline_queue_len()
        );
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    // Let stragglers drain and deliver
    tokio::time::sleep(Duration::from_secs(3)).await;

    let archived = service
        .archive_old_notifications("demo-user", taskdeck_core::defaults::ARCHIVE_AFTER_DAYS)
        .await?;
    let all = service.get_notifications("demo-user").await?;
    let unread = service.get_unread_count("demo-user").await?;
    println!(
        "\nFinal state: {} stored, {} unread, {} archived by retention",
        all.len(),
        unread,
        archived
    );

    service.cleanup().await;
    Ok(())
}
