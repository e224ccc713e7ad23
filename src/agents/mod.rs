//! Agent definitions, registry and per-role turn behaviour

pub mod bank;
pub mod behavior;
pub mod definition;
pub mod registry;

pub use behavior::{parse_amount, ContextEffect, RequestedAmount, TurnPlan};
pub use definition::{AgentDefinition, AgentRole};
pub use registry::AgentRegistry;
