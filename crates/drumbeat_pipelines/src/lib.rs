//! Drumbeat's pipelines: keyword research (Scholar), content generation
//! (Ghostwriter), campaign orchestration (Conductor), and the review-queue
//! decision surface.
//!
//! Each pipeline is an explicit stage enum, a pure routing function
//! `(state) -> Option<stage>`, and a small interpreter loop, so the state
//! machines stay diagrammable and unit-testable. Collaborators arrive as
//! trait objects constructed once at process start.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod conductor;
pub mod ghostwriter;
pub mod review;
pub mod scholar;
pub mod seo;

pub use conductor::{
    AccountCycleResult, Conductor, ConductorStage, ConductorState, CycleOutcome, CycleStatus,
    WeeklyCycleReport,
};
pub use ghostwriter::{
    ContentBrief, DraftContent, Ghostwriter, GhostwriterOutcome, GhostwriterStage,
    GhostwriterState,
};
pub use review::{BulkApproveReport, ReviewOps};
pub use scholar::{RankedKeyword, Scholar, ScholarOutcome, ScholarStage, ScholarState};
pub use seo::{SeoInput, score_seo, word_count};
