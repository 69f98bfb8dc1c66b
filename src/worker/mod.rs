//! The deferred half of a command: fetch history, summarize, deliver

pub mod deliver;
pub mod handler;
pub mod history;
pub mod pipeline;
pub mod summarize;

// Re-export the main handler for convenience
pub use handler::handler;
