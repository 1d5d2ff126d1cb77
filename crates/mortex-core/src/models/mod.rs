//! Data models: pipeline configuration and the extraction output contract.

pub mod config;
pub mod statement;
