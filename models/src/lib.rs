// models/src/lib.rs

// Declare all top-level modules within the 'models' crate
pub mod assessment;
pub mod counterfactuals;
pub mod errors;
pub mod graph;
pub mod links;
pub mod nodes;

// Re-export common core types for convenience when other crates use 'models::*'
pub use assessment::{AssessmentMetrics, MatchAssessment, Reliability};
pub use counterfactuals::{AlternativeDiagnosis, ChangeAction, Counterfactuals, FactorChange, MinimalChanges};
pub use errors::{GraphError, GraphResult};
pub use graph::{CombinedGraph, Graph};
pub use links::{Link, LinkKey, Relationship};
pub use nodes::{Node, NodeType, SourceTag};
