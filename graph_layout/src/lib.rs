// graph_layout/src/lib.rs
pub mod forces;
pub mod simulation;

pub use forces::{charge_scale, distance_multiplier, node_radius, LayoutConfig};
pub use simulation::Simulation;
