// models/src/assessment.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reliability tier derived from the confidence score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Reliability {
    High,
    Medium,
    Low,
}

impl Reliability {
    /// HIGH at 0.8, MEDIUM at 0.5, LOW below.
    pub fn from_confidence(score: f64) -> Self {
        if score >= 0.8 {
            Reliability::High
        } else if score >= 0.5 {
            Reliability::Medium
        } else {
            Reliability::Low
        }
    }
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reliability::High => "HIGH",
            Reliability::Medium => "MEDIUM",
            Reliability::Low => "LOW",
        };
        write!(f, "{}", s)
    }
}

/// Overall verdict on how well the prediction's reasoning matches the
/// curated knowledge, keyed off reasoning accuracy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchAssessment {
    #[serde(rename = "STRONG MATCH")]
    Strong,
    #[serde(rename = "PARTIAL MATCH")]
    Partial,
    #[serde(rename = "WEAK MATCH")]
    Weak,
}

impl MatchAssessment {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 0.8 {
            MatchAssessment::Strong
        } else if accuracy >= 0.5 {
            MatchAssessment::Partial
        } else {
            MatchAssessment::Weak
        }
    }
}

impl fmt::Display for MatchAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchAssessment::Strong => "STRONG MATCH",
            MatchAssessment::Partial => "PARTIAL MATCH",
            MatchAssessment::Weak => "WEAK MATCH",
        };
        write!(f, "{}", s)
    }
}

/// Scalar scores comparing a prediction graph against ground truth for one
/// predicted disease. All scores live in [0, 1].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentMetrics {
    pub predicted_disease: String,
    pub reasoning_accuracy: f64,
    pub semantic_similarity: f64,
    pub factor_coverage: f64,
    pub novelty: f64,
    pub confidence_score: f64,
    pub reliability: Reliability,
    pub assessment: MatchAssessment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliability_thresholds() {
        assert_eq!(Reliability::from_confidence(0.8), Reliability::High);
        assert_eq!(Reliability::from_confidence(0.79), Reliability::Medium);
        assert_eq!(Reliability::from_confidence(0.5), Reliability::Medium);
        assert_eq!(Reliability::from_confidence(0.49), Reliability::Low);
    }

    #[test]
    fn assessment_thresholds() {
        assert_eq!(MatchAssessment::from_accuracy(1.0), MatchAssessment::Strong);
        assert_eq!(MatchAssessment::from_accuracy(0.5), MatchAssessment::Partial);
        assert_eq!(MatchAssessment::from_accuracy(0.2), MatchAssessment::Weak);
    }

    #[test]
    fn wire_spellings_match_display() {
        assert_eq!(serde_json::to_string(&Reliability::High).unwrap(), r#""HIGH""#);
        assert_eq!(
            serde_json::to_string(&MatchAssessment::Partial).unwrap(),
            r#""PARTIAL MATCH""#
        );
    }
}
