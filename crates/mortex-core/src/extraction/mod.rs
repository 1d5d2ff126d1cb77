//! Statement field extraction module.

mod engine;
pub mod rules;

pub use engine::FieldExtractionEngine;
pub use rules::RuleContext;
