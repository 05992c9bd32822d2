// models/src/graph.rs
//! Raw and merged graph containers.
//!
//! `Graph` is the wire and file shape: plain node/link arrays as the curated
//! knowledge-graph file stores them. `CombinedGraph` is the derived,
//! read-only merge view with an id index; its constructor enforces the
//! structural invariants so downstream code can rely on them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::{GraphError, GraphResult};
use crate::links::{Link, LinkKey};
use crate::nodes::Node;

/// An input or persisted graph: the ground-truth file and prediction
/// payloads both deserialize into this.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn new() -> Self {
        Graph { nodes: Vec::new(), links: Vec::new() }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn has_link(&self, key: &LinkKey) -> bool {
        self.links.iter().any(|l| &l.key() == key)
    }

    /// Outgoing links of one node, in file order.
    pub fn outgoing_links(&self, id: &str) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.source == id)
    }

    /// Structural validation of a caller-supplied graph.
    ///
    /// Duplicate ids and duplicate identity triples are schema errors;
    /// dangling endpoints are schema errors; an out-of-range weight is a
    /// validation error. Nothing is repaired, the first violation wins.
    pub fn validate(&self) -> GraphResult<()> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if node.id.trim().is_empty() {
                return Err(GraphError::Schema("node with empty id".to_string()));
            }
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::Schema(format!("duplicate node id '{}'", node.id)));
            }
        }

        let mut keys = HashSet::new();
        for link in &self.links {
            if !ids.contains(link.source.as_str()) {
                return Err(GraphError::Schema(format!(
                    "link source '{}' does not reference a node",
                    link.source
                )));
            }
            if !ids.contains(link.target.as_str()) {
                return Err(GraphError::Schema(format!(
                    "link target '{}' does not reference a node",
                    link.target
                )));
            }
            validate_weight(link.weight)?;
            if let Some(gt_weight) = link.ground_truth_weight {
                validate_weight(gt_weight)?;
            }
            if !keys.insert(link.key()) {
                return Err(GraphError::Schema(format!("duplicate link {}", link.key())));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_weight(weight: f64) -> GraphResult<()> {
    if !(0.0..=1.0).contains(&weight) || weight.is_nan() {
        return Err(GraphError::Validation(format!(
            "weight {} outside [0, 1]",
            weight
        )));
    }
    Ok(())
}

/// The merged, attributed view of a ground-truth and a prediction graph.
///
/// Recomputed on every analysis and never persisted. Nodes keep a
/// deterministic order (ground truth first, then prediction-only) while the
/// id index answers endpoint lookups; links store ids, not node references.
#[derive(Clone, Debug, Serialize)]
pub struct CombinedGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CombinedGraph {
    /// Build the view, enforcing the merge-output invariants: unique node
    /// ids, unique link triples, every endpoint present, weights in range,
    /// and source attribution filled in on every element.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> GraphResult<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            if node.source.is_none() {
                return Err(GraphError::Schema(format!(
                    "combined node '{}' missing source attribution",
                    node.id
                )));
            }
            if index.insert(node.id.clone(), pos).is_some() {
                return Err(GraphError::Schema(format!("duplicate node id '{}'", node.id)));
            }
        }

        let mut keys = HashSet::with_capacity(links.len());
        for link in &links {
            if !index.contains_key(&link.source) {
                return Err(GraphError::Schema(format!(
                    "link source '{}' does not reference a node",
                    link.source
                )));
            }
            if !index.contains_key(&link.target) {
                return Err(GraphError::Schema(format!(
                    "link target '{}' does not reference a node",
                    link.target
                )));
            }
            if link.source_graph.is_none() {
                return Err(GraphError::Schema(format!(
                    "combined link {} missing source attribution",
                    link.key()
                )));
            }
            validate_weight(link.weight)?;
            if !keys.insert(link.key()) {
                return Err(GraphError::Schema(format!("duplicate link {}", link.key())));
            }
        }

        Ok(CombinedGraph { nodes, links, index })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        match self.index.get(id) {
            Some(&pos) => self.nodes.get_mut(pos),
            None => None,
        }
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Every link with `id` as either endpoint.
    pub fn links_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| l.touches(id))
    }
}

/// A serialized combined graph (attribution fields present on the wire)
/// re-imported as the indexed view.
impl TryFrom<Graph> for CombinedGraph {
    type Error = GraphError;

    fn try_from(graph: Graph) -> GraphResult<Self> {
        CombinedGraph::new(graph.nodes, graph.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::Relationship;
    use crate::nodes::{NodeType, SourceTag};

    fn attributed(id: &str, node_type: NodeType) -> Node {
        let mut node = Node::new(id, node_type);
        node.source = Some(SourceTag::GroundTruth);
        node
    }

    #[test]
    fn validate_rejects_dangling_link() {
        let graph = Graph {
            nodes: vec![Node::new("Flu", NodeType::Disease)],
            links: vec![Link::new("Flu", "Fever", Relationship::HasSymptom, 0.8)],
        };
        assert!(matches!(graph.validate(), Err(GraphError::Schema(_))));
    }

    #[test]
    fn validate_rejects_duplicate_triple() {
        let graph = Graph {
            nodes: vec![Node::new("Flu", NodeType::Disease), Node::new("Fever", NodeType::Symptom)],
            links: vec![
                Link::new("Flu", "Fever", Relationship::HasSymptom, 0.8),
                Link::new("Flu", "Fever", Relationship::HasSymptom, 0.4),
            ],
        };
        assert!(matches!(graph.validate(), Err(GraphError::Schema(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_weight() {
        let graph = Graph {
            nodes: vec![Node::new("Flu", NodeType::Disease), Node::new("Fever", NodeType::Symptom)],
            links: vec![Link::new("Flu", "Fever", Relationship::HasSymptom, 1.2)],
        };
        assert!(matches!(graph.validate(), Err(GraphError::Validation(_))));
    }

    #[test]
    fn combined_graph_indexes_nodes_by_id() {
        let mut link = Link::new("Flu", "Fever", Relationship::HasSymptom, 0.6);
        link.source_graph = Some(SourceTag::Both);
        let combined = CombinedGraph::new(
            vec![attributed("Flu", NodeType::Disease), attributed("Fever", NodeType::Symptom)],
            vec![link],
        )
        .unwrap();
        assert!(combined.node("Flu").is_some());
        assert!(combined.node("Nausea").is_none());
        assert_eq!(combined.links_touching("Fever").count(), 1);
    }

    #[test]
    fn combined_graph_requires_attribution() {
        let result = CombinedGraph::new(vec![Node::new("Flu", NodeType::Disease)], vec![]);
        assert!(matches!(result, Err(GraphError::Schema(_))));
    }
}
