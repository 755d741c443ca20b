//! Fitroom server binary.
//!
//! Wires the in-memory adapters into the call use case and serves the HTTP
//! and WebSocket API.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use fitroom_application::CallUseCase;
use fitroom_core::ports::Product;
use fitroom_infrastructure::{
    BroadcastEventPublisher, MemoryCallRepository, MemoryProductCatalog, MemoryWardrobeStore,
    StaticRoomDirectory, TracingNotificationDispatcher,
};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

fn build_state(config: &ServerConfig) -> AppState {
    // TODO: replace the seeded directory and catalog with clients for the
    // platform's room and catalog services.
    let directory = StaticRoomDirectory::new()
        .with_room("showroom", ["hanna", "amir", "bea"])
        .with_room("studio", ["dana", "eli"]);
    let catalog = MemoryProductCatalog::new()
        .with_product(Product {
            id: "prod-1".to_string(),
            name: "Red Midi Dress".to_string(),
            price: 89.0,
            image_url: Some("https://cdn.fitroom.dev/prod-1.jpg".to_string()),
        })
        .with_product(Product {
            id: "prod-2".to_string(),
            name: "Linen Blazer".to_string(),
            price: 129.0,
            image_url: Some("https://cdn.fitroom.dev/prod-2.jpg".to_string()),
        })
        .with_product(Product {
            id: "prod-3".to_string(),
            name: "Canvas Sneakers".to_string(),
            price: 59.0,
            image_url: None,
        });

    let publisher = Arc::new(BroadcastEventPublisher::default());
    let calls = Arc::new(
        CallUseCase::new(
            Arc::new(MemoryCallRepository::new()),
            Arc::new(directory),
            Arc::new(TracingNotificationDispatcher::new()),
            Arc::new(catalog),
            Arc::new(MemoryWardrobeStore::new()),
            publisher.clone(),
        )
        .with_max_duration(config.max_call_minutes),
    );

    AppState {
        calls,
        events: publisher,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let app = routes::router(build_state(&config));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("[Server] listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
