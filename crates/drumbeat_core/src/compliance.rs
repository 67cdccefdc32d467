//! Compliance verdicts and flagged-phrase details.

use serde::{Deserialize, Serialize};

/// Severity of a single compliance detail.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplianceSeverity {
    /// Content must not publish without remediation or human sign-off
    Block,
    /// Content may publish once a disclaimer is attached
    Warn,
}

/// Aggregated compliance verdict for a piece of content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplianceStatus {
    /// No rule fired
    Pass,
    /// Only warn-severity details present
    Warn,
    /// At least one block-severity detail present
    Block,
}

/// One flagged phrase/rule pair with severity and remediation guidance.
///
/// Transient: embedded into content pieces and review-queue proposals,
/// never independently persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceDetail {
    /// Rule name (e.g. "guaranteed_results")
    pub rule: String,
    /// Severity of the finding
    pub severity: ComplianceSeverity,
    /// The matched phrase, verbatim from the text
    pub phrase: String,
    /// Human-readable reason the phrase was flagged
    pub reason: String,
    /// Suggested replacement wording, when one exists
    pub suggestion: Option<String>,
    /// Disclaimer paragraph to append for warn-severity findings
    pub disclaimer: Option<String>,
}

/// Result of a compliance check: aggregate status plus every detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Aggregate verdict
    pub status: ComplianceStatus,
    /// Deduplicated findings, deterministic rules first
    pub details: Vec<ComplianceDetail>,
}

impl ComplianceReport {
    /// Aggregate a detail list into a report.
    ///
    /// `Block` if any detail blocks; else `Warn` if any warns; else `Pass`.
    pub fn from_details(details: Vec<ComplianceDetail>) -> Self {
        let status = if details
            .iter()
            .any(|d| d.severity == ComplianceSeverity::Block)
        {
            ComplianceStatus::Block
        } else if details
            .iter()
            .any(|d| d.severity == ComplianceSeverity::Warn)
        {
            ComplianceStatus::Warn
        } else {
            ComplianceStatus::Pass
        };
        Self { status, details }
    }

    /// A passing report with no findings.
    pub fn pass() -> Self {
        Self {
            status: ComplianceStatus::Pass,
            details: Vec::new(),
        }
    }
}
