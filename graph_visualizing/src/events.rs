// graph_visualizing/src/events.rs
//! Interaction events and their single-threaded dispatcher.
//!
//! Clicks, drags and resets arrive as explicit messages rather than
//! callbacks holding mutable captures; the dispatcher owns the combined
//! graph, the layout simulation and the current selection, and the
//! highlight state is always recomputed as a pure function of
//! (graph, selection). Loading a new analysis replaces the simulation, so
//! an in-flight relaxation can never write positions into a discarded
//! graph.

use graph_engine::selection::{render_state, select_node, RenderState, Selection};
use graph_layout::{LayoutConfig, Simulation};
use log::{debug, info};
use models::errors::GraphResult;
use models::graph::CombinedGraph;

#[derive(Clone, Debug)]
pub enum InteractionEvent {
    NodeClicked(String),
    DragStarted(String),
    Dragged { id: String, x: f64, y: f64 },
    DragEnded(String),
    SelectionReset,
    AnalysisLoaded(CombinedGraph),
}

pub struct Dispatcher {
    graph: CombinedGraph,
    simulation: Simulation,
    selection: Option<Selection>,
    config: LayoutConfig,
}

impl Dispatcher {
    /// Lay out the graph and take ownership of the interaction state. The
    /// initial relaxation runs to completion (or budget) here, so
    /// selection handling always sees positioned nodes.
    pub fn new(mut graph: CombinedGraph, config: LayoutConfig) -> Self {
        let mut simulation = Simulation::new(&graph, config.clone());
        simulation.run();
        simulation.apply_to(&mut graph);
        Dispatcher { graph, simulation, selection: None, config }
    }

    pub fn graph(&self) -> &CombinedGraph {
        &self.graph
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Current visual state for the rendering layer.
    pub fn render_state(&self) -> RenderState {
        render_state(&self.graph, self.selection.as_ref())
    }

    /// Consume one event. Selection errors (unknown node ids) propagate;
    /// everything else is infallible.
    pub fn handle(&mut self, event: InteractionEvent) -> GraphResult<()> {
        match event {
            InteractionEvent::NodeClicked(id) => {
                let selection = select_node(&self.graph, &id)?;
                debug!(
                    "selected '{}': {} neighbors, {} links",
                    id,
                    selection.summary.connected_entities,
                    selection.summary.relationship_count
                );
                self.selection = Some(selection);
            }
            InteractionEvent::DragStarted(id) => {
                if let Some((x, y)) = self.simulation.position(&id) {
                    self.simulation.pin(&id, x, y);
                }
            }
            InteractionEvent::Dragged { id, x, y } => {
                self.simulation.drag(&id, x, y);
                self.simulation.apply_to(&mut self.graph);
            }
            InteractionEvent::DragEnded(id) => {
                self.simulation.release(&id);
            }
            InteractionEvent::SelectionReset => {
                self.selection = None;
            }
            InteractionEvent::AnalysisLoaded(graph) => {
                // Dropping the old simulation cancels any in-flight
                // relaxation before the new graph takes over.
                info!(
                    "loaded analysis with {} nodes, {} links",
                    graph.node_count(),
                    graph.link_count()
                );
                self.graph = graph;
                self.selection = None;
                self.simulation = Simulation::new(&self.graph, self.config.clone());
                self.simulation.run();
                self.simulation.apply_to(&mut self.graph);
            }
        }
        Ok(())
    }

    /// Advance the layout one tick (used while a drag keeps it warm) and
    /// sync positions back onto the graph. Returns false when settled.
    pub fn tick(&mut self) -> bool {
        let moved = self.simulation.step();
        if moved {
            self.simulation.apply_to(&mut self.graph);
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_engine::merge;
    use models::errors::GraphError;
    use models::graph::Graph;
    use models::links::{Link, Relationship};
    use models::nodes::{Node, NodeType};

    fn dispatcher() -> Dispatcher {
        let gt = Graph {
            nodes: vec![
                Node::new("Flu", NodeType::Disease),
                Node::new("Fever", NodeType::Symptom),
            ],
            links: vec![Link::new("Flu", "Fever", Relationship::HasSymptom, 0.8)],
        };
        let combined = merge(&gt, &gt).unwrap();
        Dispatcher::new(combined, LayoutConfig::default())
    }

    #[test]
    fn layout_runs_before_any_interaction() {
        let d = dispatcher();
        assert!(d.graph().nodes.iter().all(|n| n.x.is_some() && n.y.is_some()));
    }

    #[test]
    fn click_selects_and_reset_clears() {
        let mut d = dispatcher();
        d.handle(InteractionEvent::NodeClicked("Flu".into())).unwrap();
        assert_eq!(d.selection().unwrap().selected, "Flu");

        d.handle(InteractionEvent::SelectionReset).unwrap();
        assert!(d.selection().is_none());
        let state = d.render_state();
        assert!(state.nodes.iter().all(|s| s.opacity == 1.0));
    }

    #[test]
    fn clicking_a_neighbor_recenters() {
        let mut d = dispatcher();
        d.handle(InteractionEvent::NodeClicked("Flu".into())).unwrap();
        d.handle(InteractionEvent::NodeClicked("Fever".into())).unwrap();
        assert_eq!(d.selection().unwrap().selected, "Fever");
    }

    #[test]
    fn unknown_click_is_not_found() {
        let mut d = dispatcher();
        let result = d.handle(InteractionEvent::NodeClicked("Migraine".into()));
        assert!(matches!(result, Err(GraphError::NotFound(_))));
    }

    #[test]
    fn drag_pins_and_release_unpins() {
        let mut d = dispatcher();
        d.handle(InteractionEvent::DragStarted("Fever".into())).unwrap();
        d.handle(InteractionEvent::Dragged { id: "Fever".into(), x: 5.0, y: 6.0 }).unwrap();
        let fever = d.graph().node("Fever").unwrap();
        assert_eq!((fever.x, fever.y), (Some(5.0), Some(6.0)));
        assert_eq!((fever.fx, fever.fy), (Some(5.0), Some(6.0)));

        d.handle(InteractionEvent::DragEnded("Fever".into())).unwrap();
        while d.tick() {}
        let fever = d.graph().node("Fever").unwrap();
        assert!(fever.fx.is_none() && fever.fy.is_none());
    }

    #[test]
    fn new_analysis_replaces_graph_and_clears_selection() {
        let mut d = dispatcher();
        d.handle(InteractionEvent::NodeClicked("Flu".into())).unwrap();

        let gt = Graph {
            nodes: vec![Node::new("Eczema", NodeType::Disease)],
            links: vec![],
        };
        let combined = merge(&gt, &gt).unwrap();
        d.handle(InteractionEvent::AnalysisLoaded(combined)).unwrap();

        assert!(d.selection().is_none());
        assert!(d.graph().has_node("Eczema"));
        assert!(!d.graph().has_node("Flu"));
        assert!(d.graph().node("Eczema").unwrap().x.is_some());
    }
}
