// Penwright - Writer and reviewer agents for long-form content
// Library exports

// Core modules
pub mod agent;
pub mod cli;
pub mod config;
pub mod context;
pub mod document;
pub mod errors;
pub mod knowledge;
pub mod logging;
pub mod outline;
pub mod providers;
pub mod server;
pub mod session;
pub mod store;

pub use context::AppContext;
pub use errors::{LlmError, StoreError, TransportError};
