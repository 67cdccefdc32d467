//! Deterministic compliance rules.

use drumbeat_core::{ComplianceDetail, ComplianceSeverity};
use drumbeat_error::{ConfigError, DrumbeatResult};
use regex::Regex;

/// Suppresses a match when a qualifying phrase appears nearby.
///
/// The dollar-amount rule uses this: "$500" is only flagged when no phrase
/// like "starting at" or "may vary" occurs within the window on either
/// side of the match.
#[derive(Debug, Clone)]
pub struct ContextQualifier {
    /// Characters inspected before and after the match
    pub window: usize,
    /// Lower-cased phrases that qualify the claim
    pub phrases: Vec<&'static str>,
}

impl ContextQualifier {
    /// Whether the match at `start..end` in `text` is qualified away.
    pub fn qualifies(&self, text: &str, start: usize, end: usize) -> bool {
        let lower = text.to_lowercase();
        let from = char_floor(&lower, start.saturating_sub(self.window));
        let to = char_ceil(&lower, (end + self.window).min(lower.len()));
        let window = &lower[from..to];
        self.phrases.iter().any(|phrase| window.contains(phrase))
    }
}

fn char_floor(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn char_ceil(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// One deterministic rule: a severity, one or more patterns, and optional
/// remediation guidance. A rule fires at most once per check.
#[derive(Debug, Clone)]
pub struct ComplianceRule {
    /// Rule name, stable across runs (e.g. "guaranteed_results")
    pub name: &'static str,
    /// Severity of a firing
    pub severity: ComplianceSeverity,
    /// Patterns tried in order; the first match wins
    pub patterns: Vec<Regex>,
    /// Human-readable reason attached to findings
    pub reason: &'static str,
    /// Suggested replacement wording
    pub suggestion: Option<&'static str>,
    /// Disclaimer paragraph for warn-severity findings
    pub disclaimer: Option<&'static str>,
    /// Context check that can suppress a match
    pub context: Option<ContextQualifier>,
}

impl ComplianceRule {
    /// Evaluate the rule against plain text, returning at most one detail.
    ///
    /// Patterns are tried in order; within a pattern, the first match that
    /// survives the context check fires the rule.
    pub fn evaluate(&self, text: &str) -> Option<ComplianceDetail> {
        for pattern in &self.patterns {
            for found in pattern.find_iter(text) {
                if let Some(context) = &self.context {
                    if context.qualifies(text, found.start(), found.end()) {
                        continue;
                    }
                }
                return Some(ComplianceDetail {
                    rule: self.name.to_string(),
                    severity: self.severity,
                    phrase: found.as_str().to_string(),
                    reason: self.reason.to_string(),
                    suggestion: self.suggestion.map(str::to_string),
                    disclaimer: self.disclaimer.map(str::to_string),
                });
            }
        }
        None
    }
}

fn compile(patterns: &[&str]) -> DrumbeatResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| ConfigError::new(format!("invalid rule pattern '{p}': {e}")).into())
        })
        .collect()
}

/// The standard rule set, ordered.
///
/// Block severity: guaranteed-outcome language, diagnostic language,
/// absolute-cure language, unqualified dollar amounts. Warn severity:
/// unqualified before/after claims and insurance-coverage claims, each
/// carrying a standard disclaimer.
///
/// # Errors
///
/// Returns an error if a pattern fails to compile.
pub fn standard_rules() -> DrumbeatResult<Vec<ComplianceRule>> {
    Ok(vec![
        ComplianceRule {
            name: "guaranteed_results",
            severity: ComplianceSeverity::Block,
            patterns: compile(&[
                r"(?i)\bguaranteed?\s+to\s+\w+",
                r"(?i)\bguaranteed?\s+(?:results?|outcomes?|success)\b",
                r"(?i)\b100%\s+(?:effective|success(?:ful)?|guaranteed)\b",
                r"(?i)\bwe\s+guarantee\b",
            ])?,
            reason: "Guaranteed-outcome language promises results no treatment can assure",
            suggestion: Some("Describe typical outcomes and note that results vary"),
            disclaimer: None,
            context: None,
        },
        ComplianceRule {
            name: "diagnostic_language",
            severity: ComplianceSeverity::Block,
            patterns: compile(&[
                r"(?i)\byou\s+(?:have|are\s+suffering\s+from)\s+\w+",
                r"(?i)\byou\s+need\s+(?:a\s+|this\s+)?(?:treatment|procedure|surgery)\b",
                r"(?i)\bdiagnos(?:e|is\s+for)\s+you\b",
            ])?,
            reason: "Diagnostic language addressed to the reader constitutes medical advice",
            suggestion: Some("Describe symptoms generally and direct readers to an exam"),
            disclaimer: None,
            context: None,
        },
        ComplianceRule {
            name: "absolute_cure",
            severity: ComplianceSeverity::Block,
            patterns: compile(&[
                r"(?i)\b(?:completely|permanently|totally)\s+cures?\b",
                r"(?i)\bcures?\s+(?:all|any|every)\b",
                r"(?i)\bpermanent\s+(?:cure|fix)\b",
                r"(?i)\beliminates?\s+(?:all|any|every)\b",
            ])?,
            reason: "Absolute-cure language overstates what any treatment can deliver",
            suggestion: Some("Use measured language such as 'can significantly improve'"),
            disclaimer: None,
            context: None,
        },
        ComplianceRule {
            name: "price_without_context",
            severity: ComplianceSeverity::Block,
            patterns: compile(&[r"\$\s?\d[\d,]*(?:\.\d{2})?"])?,
            reason: "Dollar amounts without qualifying context read as binding quotes",
            suggestion: Some("Qualify amounts with 'starting at' or note that prices vary"),
            disclaimer: None,
            context: Some(ContextQualifier {
                window: 200,
                phrases: vec![
                    "starting at",
                    "as low as",
                    "may vary",
                    "approximately",
                    "average",
                    "typically",
                    "estimate",
                    "financing",
                ],
            }),
        },
        ComplianceRule {
            name: "before_after_claims",
            severity: ComplianceSeverity::Warn,
            patterns: compile(&[
                r"(?i)\bbefore\s+and\s+after\b",
                r"(?i)\bresults?\s+(?:shown|pictured)\b",
            ])?,
            reason: "Before/after claims need an individual-results disclaimer",
            suggestion: None,
            disclaimer: Some(
                "Individual results may vary. Outcomes shown are examples and are not a \
                 guarantee of your results.",
            ),
            context: None,
        },
        ComplianceRule {
            name: "insurance_coverage",
            severity: ComplianceSeverity::Warn,
            patterns: compile(&[
                r"(?i)\binsurance\s+(?:covers?|will\s+pay|pays)\b",
                r"(?i)\bcovered\s+by\s+(?:most\s+)?insurance\b",
            ])?,
            reason: "Coverage claims need a plan-variability disclaimer",
            suggestion: None,
            disclaimer: Some(
                "Insurance coverage varies by plan. Contact your insurance provider to \
                 confirm your benefits before scheduling.",
            ),
            context: None,
        },
    ])
}
