//! Core data models for the FTL compliance engine.
//!
//! This module contains all the domain models used throughout the engine.

mod duty;
mod evaluation_result;
mod rest_evaluation;
mod roster_report;

pub use duty::{
    CrewRole, DisruptionReason, DutyRecord, DutyStatus, DutyType, NextPlannedDuty,
};
pub use evaluation_result::{EvaluationMode, EvaluationResult, InfoNote, RuleSource, Violation};
pub use rest_evaluation::{
    AdjustmentKind, ColorCode, RestAdjustment, RestEvaluation, RestPolicy, RestStatus,
};
pub use roster_report::{
    ComplianceStatus, DutyEvaluation, RestPeriodEvaluation, RosterReport, RosterSummary,
};
