//! Core business logic abstractions

pub mod config;
pub mod context;
pub mod exchange;
pub mod log;

// Re-export main types for cleaner imports
pub use context::{CallContext, Interrupted};
pub use exchange::{ExchangeError, ExchangeRequest, Exchanger};
