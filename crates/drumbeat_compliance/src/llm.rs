//! LLM secondary pass.

use drumbeat_core::extraction::extract_json;
use drumbeat_core::{ComplianceDetail, ComplianceSeverity, CompletionRequest};
use drumbeat_interface::CompletionDriver;
use serde::Deserialize;

/// Characters of plain text sent to the completion service.
const REVIEW_CHAR_LIMIT: usize = 3_000;

#[derive(Debug, Deserialize)]
struct LlmFinding {
    rule: String,
    severity: String,
    phrase: String,
    reason: String,
    #[serde(default)]
    suggestion: Option<String>,
}

/// Ask the completion service for additional issues the deterministic
/// rules missed.
///
/// Any failure (transport, missing JSON, parse) yields an empty list;
/// the deterministic pass always stands alone.
#[tracing::instrument(skip(driver, plain_text), fields(text_len = plain_text.len()))]
pub(crate) async fn secondary_pass(
    driver: &dyn CompletionDriver,
    plain_text: &str,
    vertical: &str,
) -> Vec<ComplianceDetail> {
    let excerpt: String = plain_text.chars().take(REVIEW_CHAR_LIMIT).collect();

    let system = format!(
        "You review {vertical} marketing copy for regulatory compliance. Identify claims a \
         deterministic phrase scanner would miss: implied guarantees, medical advice, misleading \
         pricing, or unsubstantiated superiority claims. Output ONLY a JSON array, each element \
         shaped {{\"rule\": string, \"severity\": \"block\"|\"warn\", \"phrase\": string, \
         \"reason\": string, \"suggestion\": string}}. Output [] when nothing is wrong."
    );

    let request = CompletionRequest::from_prompt(system, excerpt);

    let response = match driver.complete(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Compliance secondary pass failed, continuing with rule findings only");
            return Vec::new();
        }
    };

    let Some(json) = extract_json(&response.text) else {
        tracing::warn!("Compliance secondary pass returned no JSON, ignoring");
        return Vec::new();
    };

    let findings: Vec<LlmFinding> = match serde_json::from_str(&json) {
        Ok(findings) => findings,
        Err(e) => {
            tracing::warn!(error = %e, "Compliance secondary pass returned malformed JSON, ignoring");
            return Vec::new();
        }
    };

    findings
        .into_iter()
        .map(|f| ComplianceDetail {
            rule: f.rule,
            severity: if f.severity.eq_ignore_ascii_case("block") {
                ComplianceSeverity::Block
            } else {
                ComplianceSeverity::Warn
            },
            phrase: f.phrase,
            reason: f.reason,
            suggestion: f.suggestion,
            disclaimer: None,
        })
        .collect()
}
