//! Evaluation result models.
//!
//! Every rule check produces an [`EvaluationResult`]: the numeric facts it
//! computed, the violations it found, and informational notes for checks
//! that passed. Results are pure values with no timestamps or ids, so
//! evaluating the same duty twice yields identical results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which rule set produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleSource {
    /// Regulatory baseline.
    #[serde(rename = "EASA")]
    Easa,
    /// Operator rules.
    #[serde(rename = "OMA")]
    Oma,
    /// Rest between consecutive duties.
    #[serde(rename = "REST")]
    Rest,
    /// Bid-line agreement night rules.
    #[serde(rename = "BLR")]
    Blr,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Easa => write!(f, "EASA"),
            RuleSource::Oma => write!(f, "OMA"),
            RuleSource::Rest => write!(f, "REST"),
            RuleSource::Blr => write!(f, "BLR"),
        }
    }
}

/// The check that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// FDP band/sector limit.
    Fdp,
    /// Augmented flight crew cap.
    Augmented,
    /// Cabin crew in-flight rest.
    Cabin,
    /// No operator constraint applied.
    Unconstrained,
    /// Home standby.
    HomeStandby,
    /// Airport standby.
    AirportStandby,
    /// Reserve day.
    Reserve,
    /// Rest period.
    Rest,
    /// Night duty classification.
    Night,
}

/// A rule breach.
///
/// `excess_minutes` is set for caps that were exceeded and
/// `shortfall_minutes` for minimums that were not met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule set the breached rule belongs to.
    pub rule_source: RuleSource,
    /// Machine-readable rule code, e.g. `fdp_exceeded`.
    pub rule: String,
    /// Human-readable title.
    pub title: String,
    /// Minutes over a cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_minutes: Option<i64>,
    /// Minutes short of a minimum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortfall_minutes: Option<i64>,
    /// Entitlements and other supporting facts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facts: BTreeMap<String, Value>,
}

impl Violation {
    /// Creates a violation without a measured amount.
    pub fn new(rule_source: RuleSource, rule: &str, title: &str) -> Self {
        Self {
            rule_source,
            rule: rule.to_string(),
            title: title.to_string(),
            excess_minutes: None,
            shortfall_minutes: None,
            facts: BTreeMap::new(),
        }
    }

    /// Creates a violation for a cap exceeded by `minutes`.
    pub fn excess(rule_source: RuleSource, rule: &str, title: &str, minutes: i64) -> Self {
        Self {
            excess_minutes: Some(minutes),
            ..Self::new(rule_source, rule, title)
        }
    }

    /// Creates a violation for a minimum missed by `minutes`.
    pub fn shortfall(rule_source: RuleSource, rule: &str, title: &str, minutes: i64) -> Self {
        Self {
            shortfall_minutes: Some(minutes),
            ..Self::new(rule_source, rule, title)
        }
    }

    /// Adds a supporting fact.
    pub fn with_fact(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.facts.insert(key.to_string(), value.into());
        self
    }
}

/// A note recorded for a check that passed, with any supporting facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoNote {
    /// Rule set the note belongs to.
    pub rule_source: RuleSource,
    /// Human-readable note.
    pub note: String,
    /// Supporting facts such as `flex_minutes`.
    #[serde(flatten)]
    pub facts: BTreeMap<String, Value>,
}

impl InfoNote {
    /// Creates a note with no facts.
    pub fn new(rule_source: RuleSource, note: impl Into<String>) -> Self {
        Self {
            rule_source,
            note: note.into(),
            facts: BTreeMap::new(),
        }
    }

    /// Adds a supporting fact.
    pub fn with_fact(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.facts.insert(key.to_string(), value.into());
        self
    }
}

/// The outcome of one rule check against one duty.
///
/// # Example
///
/// ```
/// use ftl_engine::models::{EvaluationMode, EvaluationResult, RuleSource, Violation};
///
/// let mut result = EvaluationResult::new(RuleSource::Easa, EvaluationMode::Fdp);
/// result.set_limit("legal_limit_minutes", 780);
/// assert!(result.is_compliant());
///
/// result.violations.push(Violation::excess(RuleSource::Easa, "fdp_exceeded", "FDP exceeded", 15));
/// assert!(!result.is_compliant());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Rule set applied.
    pub rule_source: RuleSource,
    /// Check applied.
    pub mode: EvaluationMode,
    /// Named numeric facts computed by the check.
    pub limits: BTreeMap<String, Value>,
    /// Breaches found; empty when compliant.
    pub violations: Vec<Violation>,
    /// Notes for checks that passed.
    pub info: Vec<InfoNote>,
}

impl EvaluationResult {
    /// Creates an empty result.
    pub fn new(rule_source: RuleSource, mode: EvaluationMode) -> Self {
        Self {
            rule_source,
            mode,
            limits: BTreeMap::new(),
            violations: Vec::new(),
            info: Vec::new(),
        }
    }

    /// Records a named fact.
    pub fn set_limit(&mut self, key: &str, value: impl Into<Value>) {
        self.limits.insert(key.to_string(), value.into());
    }

    /// Returns a named fact as an integer, when present and integral.
    pub fn limit_i64(&self, key: &str) -> Option<i64> {
        self.limits.get(key).and_then(Value::as_i64)
    }

    /// Adds an informational note.
    pub fn push_info(&mut self, note: InfoNote) {
        self.info.push(note);
    }

    /// Returns true when no violations were recorded.
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}
