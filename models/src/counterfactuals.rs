// models/src/counterfactuals.rs
//! Counterfactual ("alternative diagnosis") payloads.
//!
//! Generated by an external explainer; this system only deserializes and
//! displays them verbatim, so the types mirror the wire shape exactly.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Remove,
}

/// One factor edit that would move the diagnosis toward an alternative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorChange {
    pub action: ChangeAction,
    pub factor: String,
    pub factor_type: String,
    pub relationship: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlternativeDiagnosis {
    pub alternative_disease: String,
    pub similarity: f64,
    pub changes_needed: Vec<FactorChange>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinimalChanges {
    pub explanation: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Counterfactuals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal_changes: Option<MinimalChanges>,
    #[serde(default)]
    pub alternatives: Vec<AlternativeDiagnosis>,
}
