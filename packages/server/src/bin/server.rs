//! Swarmchat session bridge server.
//!
//! Serves the browser UI and bridges each WebSocket client into the
//! peer-to-peer room it joins.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin swarmchat-server
//! cargo run --bin swarmchat-server -- --host 0.0.0.0 --port 3000 --static-dir public
//! ```

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use clap::Parser;
use swarmchat_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher, overlay::LoopbackOverlay,
        repository::InMemoryClientRepository,
    },
    ui::{AppState, Server},
};
use swarmchat_shared::{logger::setup_logger, time::SystemClock};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "swarmchat-server")]
#[command(about = "WebSocket to peer-to-peer chat bridge", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Directory holding the browser UI
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. Overlay network and clock
    // 4. UseCases (AppState)
    // 5. Server

    // 1. Create Repository (in-memory connection registry)
    let repository = Arc::new(InMemoryClientRepository::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher_clients = Arc::new(Mutex::new(HashMap::new()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_clients));

    // 3. Create overlay network (in-process provider) and clock
    let overlay = Arc::new(LoopbackOverlay::new());
    tracing::info!("Using in-process loopback overlay network");
    let clock = Arc::new(SystemClock);

    // 4. Create UseCases
    let state = AppState::new(repository, message_pusher, overlay, clock);

    // 5. Create and run the server
    let server = Server::new(state, args.static_dir);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
