//! Testing utilities and mock implementations
//!
//! Mocks for the LLM provider and completion client so routing can be tested
//! without a network.

pub mod mocks;

pub use mocks::*;
