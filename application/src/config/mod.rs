//! Application-level configuration.
//!
//! - [`EngineConfig`]: timing parameters of the reconciliation engine

pub mod engine_config;

pub use engine_config::EngineConfig;
