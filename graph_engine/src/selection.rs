// graph_engine/src/selection.rs
//! Selection and highlight computation.
//!
//! Clicking a node yields its 1-hop neighborhood plus a relationship
//! summary for the info panel; the render state maps that selection onto
//! per-element opacity, size and width values the rendering layer applies.
//! Everything here is a pure function of (graph, selection), so a repeated
//! click on a neighbor simply re-centers the neighborhood.

use std::collections::HashSet;

use models::errors::{GraphError, GraphResult};
use models::graph::CombinedGraph;
use models::links::LinkKey;
use models::nodes::{NodeType, SourceTag};

/// The 1-hop closure around a selected node together with the bucketed
/// relationship summary shown in the info panel.
#[derive(Clone, Debug)]
pub struct Selection {
    pub selected: String,
    pub neighborhood_nodes: HashSet<String>,
    pub neighborhood_links: HashSet<LinkKey>,
    pub summary: RelationshipSummary,
}

/// Relationship breakdown of the selected node, bucketed by source graph.
/// Buckets appear in display order: shared first, then ground-truth-only,
/// then prediction-only; empty buckets are omitted.
#[derive(Clone, Debug, Default)]
pub struct RelationshipSummary {
    pub connected_entities: usize,
    pub relationship_count: usize,
    pub buckets: Vec<SourceBucket>,
}

#[derive(Clone, Debug)]
pub struct SourceBucket {
    pub source_graph: SourceTag,
    pub groups: Vec<RelationshipGroup>,
}

/// All partners of the selected node under one relationship label. Incoming
/// links appear under the synthesized reverse label (`IS_<REL>_OF`).
#[derive(Clone, Debug)]
pub struct RelationshipGroup {
    pub label: String,
    pub entries: Vec<RelationshipEntry>,
}

impl RelationshipGroup {
    /// Human-readable form of the label: reverse-label affixes stripped,
    /// underscores spaced out ("IS_HAS_SYMPTOM_OF" becomes "HAS SYMPTOM").
    pub fn display_name(&self) -> String {
        let label = self.label.strip_prefix("IS_").unwrap_or(&self.label);
        let label = label.strip_suffix("_OF").unwrap_or(label);
        label.replace('_', " ")
    }
}

#[derive(Clone, Debug)]
pub struct RelationshipEntry {
    pub partner: String,
    pub weight: f64,
}

impl RelationshipEntry {
    pub fn weight_percent(&self) -> String {
        format!("{:.0}%", self.weight * 100.0)
    }
}

/// Compute the neighborhood and relationship summary for a clicked node.
///
/// The neighborhood is the selected node plus every node exactly one link
/// away in either direction; the link set is every link touching the node.
pub fn select_node(graph: &CombinedGraph, node_id: &str) -> GraphResult<Selection> {
    if !graph.has_node(node_id) {
        return Err(GraphError::NotFound(format!("node '{}' is not in the graph", node_id)));
    }

    let mut neighborhood_nodes = HashSet::new();
    neighborhood_nodes.insert(node_id.to_string());
    let mut neighborhood_links = HashSet::new();

    for link in graph.links_touching(node_id) {
        neighborhood_links.insert(link.key());
        neighborhood_nodes.insert(link.source.clone());
        neighborhood_nodes.insert(link.target.clone());
    }

    let summary = summarize(graph, node_id, &neighborhood_nodes, &neighborhood_links);

    Ok(Selection {
        selected: node_id.to_string(),
        neighborhood_nodes,
        neighborhood_links,
        summary,
    })
}

fn summarize(
    graph: &CombinedGraph,
    node_id: &str,
    neighborhood_nodes: &HashSet<String>,
    neighborhood_links: &HashSet<LinkKey>,
) -> RelationshipSummary {
    let bucket_order = [SourceTag::Both, SourceTag::GroundTruth, SourceTag::Prediction];
    let mut buckets = Vec::new();

    for source in bucket_order {
        let mut groups: Vec<RelationshipGroup> = Vec::new();
        for link in graph.links_touching(node_id) {
            if link.source_graph != Some(source) {
                continue;
            }
            // Outgoing links keep their relationship label and point at the
            // target; incoming links flip to the reverse label and point at
            // the partner on the source side.
            let (label, partner) = if link.source == node_id {
                (link.relationship.as_str().to_string(), link.target.clone())
            } else {
                (link.relationship.reverse_label(), link.source.clone())
            };
            let entry = RelationshipEntry { partner, weight: link.weight };
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.entries.push(entry),
                None => groups.push(RelationshipGroup { label, entries: vec![entry] }),
            }
        }
        if !groups.is_empty() {
            buckets.push(SourceBucket { source_graph: source, groups });
        }
    }

    RelationshipSummary {
        connected_entities: neighborhood_nodes.len().saturating_sub(1),
        relationship_count: neighborhood_links.len(),
        buckets,
    }
}

/// Per-node visual state handed to the rendering layer, aligned by index
/// with `CombinedGraph::nodes`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub opacity: f64,
    pub radius_scale: f64,
    pub emphasized: bool,
}

/// Per-link visual state, aligned by index with `CombinedGraph::links`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStyle {
    pub opacity: f64,
    pub width: f64,
}

#[derive(Clone, Debug)]
pub struct RenderState {
    pub nodes: Vec<NodeStyle>,
    pub links: Vec<LinkStyle>,
}

/// Map a selection (or its absence) onto the whole graph's visual state.
///
/// De-emphasized elements are dimmed, never removed. Passing `None`
/// restores full opacity and default sizing for every element, which is
/// also the reset-action contract.
pub fn render_state(graph: &CombinedGraph, selection: Option<&Selection>) -> RenderState {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| match selection {
            None => NodeStyle {
                opacity: 1.0,
                radius_scale: 1.0,
                emphasized: node.node_type == NodeType::Disease,
            },
            Some(sel) => {
                let in_neighborhood = sel.neighborhood_nodes.contains(&node.id);
                let is_selected = sel.selected == node.id;
                NodeStyle {
                    opacity: if in_neighborhood { 1.0 } else { 0.2 },
                    radius_scale: if is_selected { 1.3 } else { 1.0 },
                    emphasized: is_selected || node.node_type == NodeType::Disease,
                }
            }
        })
        .collect();

    let links = graph
        .links
        .iter()
        .map(|link| {
            let shared = link.source_graph == Some(SourceTag::Both);
            match selection {
                None => LinkStyle {
                    opacity: if shared { 0.8 } else { 0.5 },
                    width: if shared {
                        (link.weight * 2.0).max(1.5)
                    } else {
                        (link.weight * 1.5).max(0.5)
                    },
                },
                Some(sel) => {
                    if sel.neighborhood_links.contains(&link.key()) {
                        LinkStyle {
                            opacity: 1.0,
                            width: if shared {
                                (link.weight * 2.5).max(2.0)
                            } else {
                                (link.weight * 2.0).max(1.0)
                            },
                        }
                    } else {
                        LinkStyle {
                            opacity: if shared { 0.3 } else { 0.1 },
                            width: if shared {
                                (link.weight * 1.5).max(1.0)
                            } else {
                                (link.weight * 0.8).max(0.3)
                            },
                        }
                    }
                }
            }
        })
        .collect();

    RenderState { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use models::graph::Graph;
    use models::links::{Link, Relationship};
    use models::nodes::Node;

    fn combined() -> CombinedGraph {
        let ground_truth = Graph {
            nodes: vec![
                Node::new("Flu", NodeType::Disease),
                Node::new("Fever", NodeType::Symptom),
            ],
            links: vec![Link::new("Flu", "Fever", Relationship::HasSymptom, 0.8)],
        };
        let prediction = Graph {
            nodes: vec![
                Node::new("Flu", NodeType::Disease),
                Node::new("Fever", NodeType::Symptom),
                Node::new("Nausea", NodeType::Symptom),
            ],
            links: vec![
                Link::new("Flu", "Fever", Relationship::HasSymptom, 0.6),
                Link::new("Flu", "Nausea", Relationship::HasSymptom, 0.5),
            ],
        };
        merge(&ground_truth, &prediction).unwrap()
    }

    #[test]
    fn selecting_a_disease_collects_its_whole_neighborhood() {
        let graph = combined();
        let selection = select_node(&graph, "Flu").unwrap();

        let expected: HashSet<String> =
            ["Flu", "Fever", "Nausea"].iter().map(|s| s.to_string()).collect();
        assert_eq!(selection.neighborhood_nodes, expected);
        assert_eq!(selection.neighborhood_links.len(), 2);
        assert_eq!(selection.summary.connected_entities, 2);
        assert_eq!(selection.summary.relationship_count, 2);
    }

    #[test]
    fn neighborhood_is_symmetric() {
        let graph = combined();
        let from_source = select_node(&graph, "Flu").unwrap();
        let from_target = select_node(&graph, "Fever").unwrap();
        assert!(from_source.neighborhood_nodes.contains("Fever"));
        assert!(from_target.neighborhood_nodes.contains("Flu"));
    }

    #[test]
    fn selecting_a_neighbor_recenters_instead_of_accumulating() {
        let graph = combined();
        let fever = select_node(&graph, "Fever").unwrap();
        // Fever touches only the Flu link, so Nausea is outside its 1-hop set.
        assert!(!fever.neighborhood_nodes.contains("Nausea"));
        assert_eq!(fever.neighborhood_links.len(), 1);
    }

    #[test]
    fn incoming_links_get_reverse_labels() {
        let graph = combined();
        let selection = select_node(&graph, "Fever").unwrap();

        let bucket = selection
            .summary
            .buckets
            .iter()
            .find(|b| b.source_graph == SourceTag::Both)
            .unwrap();
        assert_eq!(bucket.groups[0].label, "IS_HAS_SYMPTOM_OF");
        assert_eq!(bucket.groups[0].display_name(), "HAS SYMPTOM");
        assert_eq!(bucket.groups[0].entries[0].partner, "Flu");
        assert_eq!(bucket.groups[0].entries[0].weight_percent(), "60%");
    }

    #[test]
    fn summary_buckets_by_source_graph() {
        let graph = combined();
        let selection = select_node(&graph, "Flu").unwrap();

        let sources: Vec<SourceTag> =
            selection.summary.buckets.iter().map(|b| b.source_graph).collect();
        assert_eq!(sources, vec![SourceTag::Both, SourceTag::Prediction]);
    }

    #[test]
    fn unknown_node_is_not_found() {
        let graph = combined();
        assert!(matches!(
            select_node(&graph, "Migraine"),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn render_state_dims_everything_outside_the_neighborhood() {
        let graph = combined();
        let selection = select_node(&graph, "Fever").unwrap();
        let state = render_state(&graph, Some(&selection));

        let nausea_pos = graph.nodes.iter().position(|n| n.id == "Nausea").unwrap();
        let fever_pos = graph.nodes.iter().position(|n| n.id == "Fever").unwrap();
        assert_eq!(state.nodes[nausea_pos].opacity, 0.2);
        assert_eq!(state.nodes[fever_pos].opacity, 1.0);
        assert_eq!(state.nodes[fever_pos].radius_scale, 1.3);

        let novel_pos = graph.links.iter().position(|l| l.target == "Nausea").unwrap();
        assert_eq!(state.links[novel_pos].opacity, 0.1);
    }

    #[test]
    fn reset_restores_default_styling() {
        let graph = combined();
        let state = render_state(&graph, None);
        assert!(state.nodes.iter().all(|s| s.opacity == 1.0 && s.radius_scale == 1.0));
        let shared_pos = graph.links.iter().position(|l| l.target == "Fever").unwrap();
        assert_eq!(state.links[shared_pos].opacity, 0.8);
    }
}
