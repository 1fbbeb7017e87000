//! WebSocket Observer Gateway
//!
//! Push surface for read-only observers (scoreboards, consoles). Each
//! observer receives the current snapshot on attach and every broadcast
//! after that.

pub mod gateway;
pub mod handler;
pub mod messages;

pub use gateway::Gateway;
pub use handler::ws_handler;
