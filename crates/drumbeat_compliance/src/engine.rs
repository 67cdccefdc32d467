//! The compliance engine.

use crate::{llm::secondary_pass, rules::ComplianceRule, strip_html};
use drumbeat_core::{ComplianceDetail, ComplianceReport};
use drumbeat_error::DrumbeatResult;
use drumbeat_interface::CompletionDriver;
use std::collections::HashSet;
use std::sync::Arc;

/// Evaluates rendered content against the deterministic rule set plus an
/// optional LLM secondary pass.
///
/// # Examples
///
/// ```no_run
/// use drumbeat_compliance::ComplianceEngine;
/// use drumbeat_core::ComplianceStatus;
///
/// # async fn demo() -> drumbeat_error::DrumbeatResult<()> {
/// let engine = ComplianceEngine::new()?;
/// let report = engine.check("<p>Whitening is guaranteed to work.</p>", "dental").await;
/// assert_eq!(report.status, ComplianceStatus::Block);
/// # Ok(())
/// # }
/// ```
pub struct ComplianceEngine {
    rules: Vec<ComplianceRule>,
    driver: Option<Arc<dyn CompletionDriver>>,
}

impl ComplianceEngine {
    /// Create an engine with the standard rule set and no secondary pass.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule pattern fails to compile.
    pub fn new() -> DrumbeatResult<Self> {
        Ok(Self {
            rules: crate::rules::standard_rules()?,
            driver: None,
        })
    }

    /// Create an engine with a custom rule set.
    pub fn with_rules(rules: Vec<ComplianceRule>) -> Self {
        Self {
            rules,
            driver: None,
        }
    }

    /// Enable the LLM secondary pass.
    pub fn with_driver(mut self, driver: Arc<dyn CompletionDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Check rendered HTML, producing an aggregated verdict.
    ///
    /// Empty input passes with no details. Findings from both passes are
    /// merged and deduplicated by `(rule, lower-cased phrase)`, first
    /// occurrence kept.
    #[tracing::instrument(skip(self, html), fields(html_len = html.len(), vertical = %vertical))]
    pub async fn check(&self, html: &str, vertical: &str) -> ComplianceReport {
        let plain = strip_html(html);
        if plain.is_empty() {
            return ComplianceReport::pass();
        }

        let mut details: Vec<ComplianceDetail> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(&plain))
            .collect();

        if let Some(driver) = &self.driver {
            details.extend(secondary_pass(driver.as_ref(), &plain, vertical).await);
        }

        let mut seen = HashSet::new();
        details.retain(|d| seen.insert((d.rule.clone(), d.phrase.to_lowercase())));

        let report = ComplianceReport::from_details(details);
        tracing::info!(
            status = %report.status,
            findings = report.details.len(),
            "Compliance check finished"
        );
        report
    }
}
