//! Room Broadcast Chat Server - Entry Point
//!
//! Loads configuration, starts the room registry with the configured startup
//! rooms, and accepts WebSocket connections.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use room_broadcast::{
    handle_connection, Config, RoleAuthorizer, RoomRegistry, ServerState, StooqGateway, User,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=room_broadcast=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("room_broadcast=info")),
        )
        .init();

    let mut config = Config::load()?;

    // Bind address from command line overrides the config file
    if let Some(addr) = env::args().nth(1) {
        config.bind_addr = addr;
    }

    // Start the registry actor and the startup rooms
    let registry = RoomRegistry::spawn(Arc::new(RoleAuthorizer));
    let system = User::system();
    for room in &config.rooms {
        if let Err(e) = registry.create_room(room, &system).await {
            warn!("Skipping startup room {}: {}", room, e);
        }
    }
    info!("Rooms: {}", registry.room_names().await?.join(", "));

    let gateway = Arc::new(StooqGateway::new(&config.quote)?);
    let state = ServerState::new(&config, registry, gateway);

    // Start TCP listener
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("WebSocket Chat Server listening on {}", config.bind_addr);

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let state = state.clone();

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
