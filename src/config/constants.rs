// Project-wide constants
//
// Centralised here so defaults have one source of truth.
// Import via `use crate::config::constants::*;`.

/// Default bind address for `penwright serve` (localhost only).
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";

/// Sampling temperature used when a call does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Temperature for inline text tasks (simplify, rephrase, ...): biased toward
/// deterministic output.
pub const TEXT_TASK_TEMPERATURE: f32 = 0.3;

/// Anthropic rejects requests without `max_tokens`; used when the caller
/// leaves it unset.
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

/// Whole-request timeout applied by the shared HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// TCP connect timeout applied by the shared HTTP client.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Directory (under the workspace or home) holding config and store.
pub const APP_DIR: &str = ".penwright";

/// Upper bound on reference text spliced into a single prompt.
pub const KNOWLEDGE_CHAR_BUDGET: usize = 6000;
