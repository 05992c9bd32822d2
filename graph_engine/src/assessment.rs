// graph_engine/src/assessment.rs
//! Structural assessment of a prediction graph against ground truth.
//!
//! Every score is computed from graph structure around the predicted
//! disease (the first disease node of the prediction). Reasoning paths are
//! the prediction's outgoing disease edges: each one is validated against
//! the curated graph, with absence claims (`DOES_NOT_HAVE_SYMPTOM`) checked
//! against the curated symptom weight and explicitly-novel factors kept out
//! of the accuracy denominator.

use std::collections::{HashMap, HashSet};

use models::assessment::{AssessmentMetrics, MatchAssessment, Reliability};
use models::errors::{GraphError, GraphResult};
use models::graph::Graph;
use models::links::Relationship;
use models::nodes::NodeType;

/// A curated factor the prediction should have used but did not.
#[derive(Clone, Debug)]
pub struct MissingFactor {
    pub factor: String,
    pub factor_type: NodeType,
    pub relationship: Relationship,
    pub weight: f64,
}

/// Metrics plus the reasoning-path tallies behind them.
#[derive(Clone, Debug)]
pub struct ReasoningReport {
    pub metrics: AssessmentMetrics,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub novel_count: usize,
    pub missing_factors: Vec<MissingFactor>,
}

// Weight above which a curated factor counts as important enough that its
// absence from the prediction is worth reporting.
const IMPORTANT_FACTOR_WEIGHT: f64 = 0.4;
// Weight above which a curated symptom makes an absence claim invalid, and
// above which a relationship mismatch is flagged.
const STRONG_FACTOR_WEIGHT: f64 = 0.5;

/// Score the prediction graph against ground truth.
///
/// Fails with a schema error when the prediction carries no disease node;
/// a predicted disease missing from ground truth is not an error, it just
/// scores zero on similarity and coverage.
pub fn assess(ground_truth: &Graph, prediction: &Graph) -> GraphResult<ReasoningReport> {
    let predicted_disease = prediction
        .nodes
        .iter()
        .find(|n| n.node_type == NodeType::Disease)
        .map(|n| n.id.clone())
        .ok_or_else(|| GraphError::Schema("prediction contains no disease node".to_string()))?;

    let gt_edges: Vec<_> = ground_truth.outgoing_links(&predicted_disease).collect();
    let pred_edges: Vec<_> = prediction.outgoing_links(&predicted_disease).collect();

    // Reasoning-path validation.
    let mut valid_count = 0usize;
    let mut invalid_count = 0usize;
    let mut novel_count = 0usize;
    let mut processed: HashSet<(String, Relationship)> = HashSet::new();

    for edge in &pred_edges {
        let key = (edge.target.clone(), edge.relationship.clone());
        if !processed.insert(key) {
            continue;
        }

        let factor_is_novel = edge.is_novel
            || prediction.node(&edge.target).map(|n| n.is_novel).unwrap_or(false);
        if factor_is_novel {
            novel_count += 1;
            continue;
        }

        let valid = match edge.relationship {
            Relationship::DoesNotHaveSymptom => {
                // An absence claim fails only when the curated graph says
                // the symptom is common for this disease.
                match gt_edges.iter().find(|gt| {
                    gt.target == edge.target && gt.relationship == Relationship::HasSymptom
                }) {
                    Some(gt) => gt.weight <= STRONG_FACTOR_WEIGHT,
                    None => true,
                }
            }
            _ => gt_edges
                .iter()
                .any(|gt| gt.target == edge.target && gt.relationship == edge.relationship),
        };

        if valid {
            valid_count += 1;
        } else {
            invalid_count += 1;
        }
    }

    // Important curated factors the prediction missed, plus relationship
    // mismatches on strong factors.
    let mut missing_factors = Vec::new();
    for gt_edge in &gt_edges {
        if gt_edge.weight <= IMPORTANT_FACTOR_WEIGHT {
            continue;
        }
        match pred_edges.iter().find(|p| p.target == gt_edge.target) {
            None => missing_factors.push(MissingFactor {
                factor: gt_edge.target.clone(),
                factor_type: ground_truth
                    .node(&gt_edge.target)
                    .map(|n| n.node_type.clone())
                    .unwrap_or(NodeType::Other(String::new())),
                relationship: gt_edge.relationship.clone(),
                weight: gt_edge.weight,
            }),
            Some(pred_edge) => {
                if pred_edge.relationship != gt_edge.relationship
                    && gt_edge.weight > STRONG_FACTOR_WEIGHT
                    && processed.insert((pred_edge.target.clone(), pred_edge.relationship.clone()))
                {
                    invalid_count += 1;
                }
            }
        }
    }

    let evaluated = valid_count + invalid_count;
    let reasoning_accuracy = if evaluated > 0 {
        valid_count as f64 / evaluated as f64
    } else {
        0.0
    };

    let semantic_similarity = semantic_similarity(&gt_edges, &pred_edges);
    let (factor_coverage, novelty) = coverage_and_novelty(prediction, &gt_edges, &pred_edges);

    let confidence_score =
        0.4 * reasoning_accuracy + 0.3 * semantic_similarity + 0.3 * factor_coverage;

    let metrics = AssessmentMetrics {
        predicted_disease,
        reasoning_accuracy,
        semantic_similarity,
        factor_coverage,
        novelty,
        confidence_score,
        reliability: Reliability::from_confidence(confidence_score),
        assessment: MatchAssessment::from_accuracy(reasoning_accuracy),
    };

    Ok(ReasoningReport {
        metrics,
        valid_count,
        invalid_count,
        novel_count,
        missing_factors,
    })
}

/// Per-relationship-type target overlap, aggregated over every curated
/// target of the predicted disease.
fn semantic_similarity(
    gt_edges: &[&models::links::Link],
    pred_edges: &[&models::links::Link],
) -> f64 {
    let mut gt_by_rel: HashMap<&Relationship, HashSet<&str>> = HashMap::new();
    for edge in gt_edges {
        gt_by_rel.entry(&edge.relationship).or_default().insert(edge.target.as_str());
    }
    let mut pred_by_rel: HashMap<&Relationship, HashSet<&str>> = HashMap::new();
    for edge in pred_edges {
        pred_by_rel.entry(&edge.relationship).or_default().insert(edge.target.as_str());
    }

    let mut total_matches = 0usize;
    let mut total_gt_items = 0usize;
    for (rel, gt_targets) in &gt_by_rel {
        let matches = match pred_by_rel.get(rel) {
            Some(pred_targets) => gt_targets.intersection(pred_targets).count(),
            None => 0,
        };
        total_matches += matches;
        total_gt_items += gt_targets.len();
    }

    if total_gt_items > 0 {
        total_matches as f64 / total_gt_items as f64
    } else {
        0.0
    }
}

fn coverage_and_novelty(
    prediction: &Graph,
    gt_edges: &[&models::links::Link],
    pred_edges: &[&models::links::Link],
) -> (f64, f64) {
    let strong_gt_factors: HashSet<&str> = gt_edges
        .iter()
        .filter(|e| e.weight > STRONG_FACTOR_WEIGHT)
        .map(|e| e.target.as_str())
        .collect();

    let pred_factors: HashSet<&str> = pred_edges.iter().map(|e| e.target.as_str()).collect();
    let novel_factors: HashSet<&str> = pred_edges
        .iter()
        .filter(|e| {
            e.is_novel || prediction.node(&e.target).map(|n| n.is_novel).unwrap_or(false)
        })
        .map(|e| e.target.as_str())
        .collect();

    let coverage = if strong_gt_factors.is_empty() {
        0.0
    } else {
        strong_gt_factors.intersection(&pred_factors).count() as f64
            / strong_gt_factors.len() as f64
    };

    let novelty = if pred_factors.is_empty() {
        0.0
    } else if !novel_factors.is_empty() {
        // Prefer explicit novelty marks from the prediction pipeline when
        // present, else fall back to set difference against ground truth.
        novel_factors.len() as f64 / pred_factors.len() as f64
    } else {
        pred_factors.difference(&strong_gt_factors).count() as f64 / pred_factors.len() as f64
    };

    (coverage, novelty)
}
