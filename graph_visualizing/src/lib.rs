// graph_visualizing/src/lib.rs
pub mod events;
pub mod visualizing;

pub use events::{Dispatcher, InteractionEvent};
pub use visualizing::{visualize_analysis_from_json, visualize_graph, AnalysisJson};
