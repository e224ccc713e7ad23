//! Observability: structured logging setup and span macros

pub mod logging;

pub use logging::{init_default_logging, init_logging, parse_level, parse_spans_flag, LogFormat};

// Span macros for structured logging
pub use logging::{agent_span, guardrail_span, run_span};
