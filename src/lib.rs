//! Mail triage — queue-driven email classification and auto-reply.

pub mod config;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod providers;
pub mod queue;
pub mod worker;
