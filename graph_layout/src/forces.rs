// graph_layout/src/forces.rs
//! Force parameters keyed by node type and relationship kind.
//!
//! These are exhaustive matches rather than string-keyed maps so adding a
//! vocabulary variant forces every table to take a position on it.

use std::time::Duration;

use models::links::Relationship;
use models::nodes::NodeType;

/// Rest-length multiplier for the spring force along a link. Symptom links
/// pull tighter than the demographic and clinical factor links.
pub fn distance_multiplier(relationship: &Relationship) -> f64 {
    match relationship {
        Relationship::HasSymptom => 0.8,
        Relationship::DoesNotHaveSymptom => 1.0,
        Relationship::CommonIn => 1.0,
        Relationship::PrevalentIn => 1.0,
        Relationship::AssociatedWith => 1.0,
        Relationship::CorrelatedWith => 1.0,
        Relationship::Other(_) => 1.0,
    }
}

/// Repulsion scale per node type. Disease nodes repel harder so they stay
/// visually dominant; symptoms cluster closer.
pub fn charge_scale(node_type: &NodeType) -> f64 {
    match node_type {
        NodeType::Disease => 1.5,
        NodeType::Symptom => 0.5,
        NodeType::AgeGroup => 1.0,
        NodeType::Gender => 1.0,
        NodeType::BloodPressure => 1.0,
        NodeType::CholesterolLevel => 1.0,
        NodeType::Other(_) => 1.0,
    }
}

/// Rendered radius per node type; collision separation derives from it.
pub fn node_radius(node_type: &NodeType) -> f64 {
    match node_type {
        NodeType::Disease => 12.0,
        NodeType::Symptom => 8.0,
        NodeType::AgeGroup => 8.0,
        NodeType::Gender => 8.0,
        NodeType::BloodPressure => 8.0,
        NodeType::CholesterolLevel => 8.0,
        NodeType::Other(_) => 8.0,
    }
}

/// Tunables of the relaxation loop. Defaults mirror the interactive
/// viewer's settings.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Base rest length of the spring force, before the per-relationship
    /// multiplier.
    pub link_distance: f64,
    /// Base many-body charge (negative repels), before the per-type scale.
    pub charge_strength: f64,
    /// Collision response strength, clamped into [0, 1] at use.
    pub collide_strength: f64,
    /// Strength of the weak per-axis pull toward the canvas center.
    pub centering_strength: f64,
    /// Alpha below this counts as converged.
    pub alpha_min: f64,
    /// Per-step geometric decay of alpha toward its target.
    pub alpha_decay: f64,
    /// Fraction of velocity lost each step.
    pub velocity_decay: f64,
    /// Alpha value a drag reheats to.
    pub reheat_alpha: f64,
    /// Wall-clock budget for a full `run`.
    pub time_budget: Duration,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            width: 1280.0,
            height: 800.0,
            link_distance: 180.0,
            charge_strength: -400.0,
            collide_strength: 1.5,
            centering_strength: 0.05,
            alpha_min: 0.001,
            // Reaches alpha_min in roughly 300 steps from 1.0, the usual
            // relaxation schedule for interactive force layouts.
            alpha_decay: 1.0 - 0.001f64.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            reheat_alpha: 0.3,
            time_budget: Duration::from_secs(3),
        }
    }
}
