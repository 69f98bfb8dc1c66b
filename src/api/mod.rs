//! API handler, slash-command acknowledgment and job dispatch

pub mod dispatch;
pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod relay;
pub mod signature;

// Re-export the main handler for convenience
pub use handler::handler;
