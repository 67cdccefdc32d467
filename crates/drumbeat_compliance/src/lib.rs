//! Regulatory compliance screening for rendered content.
//!
//! The engine evaluates a piece of rendered HTML against an ordered list of
//! deterministic rules, plus one LLM-based secondary pass, and aggregates
//! the findings into a `pass|warn|block` verdict. The deterministic pass
//! always stands alone: a secondary-pass failure contributes zero findings
//! rather than an error.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod llm;
mod rules;
mod text;

pub use engine::ComplianceEngine;
pub use rules::{ComplianceRule, ContextQualifier, standard_rules};
pub use text::strip_html;
