//! All Slack-specific functionality

pub mod client;
pub mod command_parser;
pub mod response_builder;
pub mod transport;

// Re-export main types for convenience
pub use client::SlackClient;
pub use transport::ChatTransport;
