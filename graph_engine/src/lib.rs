// graph_engine/src/lib.rs
pub mod assessment;
pub mod merge;
pub mod selection;
pub mod store;

// Re-export the exact types the rest of the workspace uses
pub use assessment::{assess, ReasoningReport};
pub use merge::merge;
pub use selection::{render_state, select_node, RenderState, Selection};
pub use store::GraphStore;

pub use models::errors::{GraphError, GraphResult};
pub use models::graph::{CombinedGraph, Graph};
pub use models::links::{Link, LinkKey, Relationship};
pub use models::nodes::{Node, NodeType, SourceTag};
