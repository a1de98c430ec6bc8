//! WebSocket transport adapter and HTTP surface of the bridge.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
