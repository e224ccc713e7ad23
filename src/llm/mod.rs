//! LLM access
//!
//! `provider` is the raw chat-completions seam, `providers` holds the HTTP
//! implementation, and `client` is the narrow capability agents consume.

pub mod client;
pub mod provider;
pub mod providers;

pub use client::{CompletionCall, CompletionClient, ProviderCompletionClient};
pub use provider::*;
pub use providers::*;
