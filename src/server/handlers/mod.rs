//! HTTP request handlers for the web server.

mod api;
mod chat;
mod reading;
mod types;

// Re-export handlers for use by the router
pub use api::{api_lookup, health, root_status};
pub use chat::{chat_end, chat_history, chat_message};
pub use reading::generate_reading;
