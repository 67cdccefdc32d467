//! Tests for the compliance engine.

use async_trait::async_trait;
use drumbeat_compliance::ComplianceEngine;
use drumbeat_core::{ComplianceSeverity, ComplianceStatus, CompletionRequest, CompletionResponse};
use drumbeat_error::{CompletionError, DrumbeatResult};
use drumbeat_interface::CompletionDriver;
use std::sync::Arc;

/// Completion fake returning a canned response, or an error when `None`.
struct ScriptedDriver {
    response: Option<String>,
}

#[async_trait]
impl CompletionDriver for ScriptedDriver {
    async fn complete(&self, _req: &CompletionRequest) -> DrumbeatResult<CompletionResponse> {
        match &self.response {
            Some(text) => Ok(CompletionResponse { text: text.clone() }),
            None => Err(CompletionError::new("scripted failure"))?,
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

#[tokio::test]
async fn empty_input_passes() {
    let engine = ComplianceEngine::new().unwrap();
    let report = engine.check("", "dental").await;
    assert_eq!(report.status, ComplianceStatus::Pass);
    assert!(report.details.is_empty());
}

#[tokio::test]
async fn guaranteed_outcome_language_blocks() {
    let engine = ComplianceEngine::new().unwrap();
    let report = engine
        .check("<p>This treatment is guaranteed to work.</p>", "dental")
        .await;

    assert_eq!(report.status, ComplianceStatus::Block);
    assert_eq!(report.details[0].rule, "guaranteed_results");
}

#[tokio::test]
async fn dollar_amount_without_context_blocks() {
    let engine = ComplianceEngine::new().unwrap();
    let report = engine
        .check("<p>Dental implants cost $500 at our office.</p>", "dental")
        .await;

    assert_eq!(report.status, ComplianceStatus::Block);
    assert!(report.details.iter().any(|d| d.rule == "price_without_context"));
}

#[tokio::test]
async fn qualified_dollar_amount_does_not_fire() {
    let engine = ComplianceEngine::new().unwrap();
    let report = engine
        .check("<p>Implants starting at $500 for qualifying patients.</p>", "dental")
        .await;

    assert!(report.details.iter().all(|d| d.rule != "price_without_context"));
}

#[tokio::test]
async fn warn_rules_carry_disclaimers() {
    let engine = ComplianceEngine::new().unwrap();
    let report = engine
        .check(
            "<p>See our before and after gallery. Insurance covers whitening.</p>",
            "dental",
        )
        .await;

    assert_eq!(report.status, ComplianceStatus::Warn);
    assert_eq!(report.details.len(), 2);
    for detail in &report.details {
        assert_eq!(detail.severity, ComplianceSeverity::Warn);
        assert!(detail.disclaimer.is_some());
    }
}

#[tokio::test]
async fn block_outranks_warn_in_aggregation() {
    let engine = ComplianceEngine::new().unwrap();
    let report = engine
        .check(
            "<p>Before and after photos show results. We guarantee success.</p>",
            "dental",
        )
        .await;

    assert_eq!(report.status, ComplianceStatus::Block);
}

#[tokio::test]
async fn secondary_pass_findings_merge_and_dedupe() {
    let llm_json = r#"[
        {"rule": "guaranteed_results", "severity": "block",
         "phrase": "GUARANTEED TO WORK", "reason": "dup of rule hit", "suggestion": null},
        {"rule": "superiority_claim", "severity": "warn",
         "phrase": "the best dentist in the state",
         "reason": "Unsubstantiated superiority claim", "suggestion": "Say 'a trusted local practice'"}
    ]"#;
    let driver = Arc::new(ScriptedDriver {
        response: Some(format!("```json\n{llm_json}\n```")),
    });
    let engine = ComplianceEngine::new().unwrap().with_driver(driver);

    let report = engine
        .check(
            "<p>Treatment guaranteed to work from the best dentist in the state.</p>",
            "dental",
        )
        .await;

    assert_eq!(report.status, ComplianceStatus::Block);
    // The LLM duplicate of the deterministic hit is dropped by the
    // (rule, lower-cased phrase) dedupe; the novel finding is kept.
    let guaranteed: Vec<_> = report
        .details
        .iter()
        .filter(|d| d.rule == "guaranteed_results")
        .collect();
    assert_eq!(guaranteed.len(), 1);
    assert!(report.details.iter().any(|d| d.rule == "superiority_claim"));
}

#[tokio::test]
async fn no_two_details_share_rule_and_phrase() {
    let engine = ComplianceEngine::new().unwrap();
    let report = engine
        .check(
            "<p>Guaranteed to work. Really, guaranteed to work.</p>",
            "dental",
        )
        .await;

    let mut seen = std::collections::HashSet::new();
    for detail in &report.details {
        assert!(seen.insert((detail.rule.clone(), detail.phrase.to_lowercase())));
    }
}

#[tokio::test]
async fn secondary_pass_failure_is_ignored() {
    let driver = Arc::new(ScriptedDriver { response: None });
    let engine = ComplianceEngine::new().unwrap().with_driver(driver);

    let report = engine
        .check("<p>This treatment is guaranteed to work.</p>", "dental")
        .await;

    // The deterministic verdict stands alone.
    assert_eq!(report.status, ComplianceStatus::Block);
    assert_eq!(report.details.len(), 1);
}
