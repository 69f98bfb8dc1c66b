//! Small helpers shared by the relay and the worker

pub mod filters;
pub mod redact;
