//! Configuration and the values that flow between the relay and the worker

pub mod config;
pub mod models;
