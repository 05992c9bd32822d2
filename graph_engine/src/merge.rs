// graph_engine/src/merge.rs
//! Merge a ground-truth graph and a prediction graph into one attributed
//! view. Pure and deterministic: ground-truth elements come first in input
//! order, prediction-only elements follow, and source/novelty flags are
//! derived from set membership alone, never copied from the inputs.

use std::collections::HashMap;

use models::errors::{GraphError, GraphResult};
use models::graph::{CombinedGraph, Graph};
use models::links::{Link, LinkKey};
use models::nodes::{Node, SourceTag};

/// Combine the two input graphs with per-element source attribution.
///
/// Node attribution: present in both inputs means `both`; only in ground
/// truth means `ground_truth`; only in the prediction means `prediction`
/// and novel. Link attribution works the same way on the identity triple,
/// except that a triple present in both keeps the prediction weight as
/// primary and retains the ground-truth weight in `ground_truth_weight`.
///
/// A link whose endpoint is absent from both inputs is a data-quality
/// violation and fails with a schema error rather than being dropped.
pub fn merge(ground_truth: &Graph, prediction: &Graph) -> GraphResult<CombinedGraph> {
    let mut nodes: Vec<Node> = Vec::with_capacity(ground_truth.nodes.len() + prediction.nodes.len());
    let mut node_index: HashMap<&str, usize> = HashMap::new();

    for node in &ground_truth.nodes {
        if node_index.contains_key(node.id.as_str()) {
            return Err(GraphError::Schema(format!(
                "duplicate node id '{}' in ground truth",
                node.id
            )));
        }
        let mut merged = Node::new(node.id.clone(), node.node_type.clone());
        merged.source = Some(SourceTag::GroundTruth);
        node_index.insert(node.id.as_str(), nodes.len());
        nodes.push(merged);
    }

    for node in &prediction.nodes {
        match node_index.get(node.id.as_str()) {
            Some(&pos) => {
                // Shared node. Duplicates within the prediction itself would
                // flip an already-merged entry, so catch them explicitly.
                if nodes[pos].source == Some(SourceTag::Both) {
                    return Err(GraphError::Schema(format!(
                        "duplicate node id '{}' in prediction",
                        node.id
                    )));
                }
                nodes[pos].source = Some(SourceTag::Both);
            }
            None => {
                let mut merged = Node::new(node.id.clone(), node.node_type.clone());
                merged.source = Some(SourceTag::Prediction);
                merged.is_novel = true;
                node_index.insert(node.id.as_str(), nodes.len());
                nodes.push(merged);
            }
        }
    }

    let mut links: Vec<Link> = Vec::with_capacity(ground_truth.links.len() + prediction.links.len());
    let mut link_index: HashMap<LinkKey, usize> = HashMap::new();

    for link in &ground_truth.links {
        check_endpoints(&node_index, link, "ground truth")?;
        let mut merged = link.clone();
        merged.source_graph = Some(SourceTag::GroundTruth);
        merged.is_novel = false;
        merged.ground_truth_weight = None;
        if link_index.insert(merged.key(), links.len()).is_some() {
            return Err(GraphError::Schema(format!(
                "duplicate link {} in ground truth",
                merged.key()
            )));
        }
        links.push(merged);
    }

    for link in &prediction.links {
        check_endpoints(&node_index, link, "prediction")?;
        match link_index.get(&link.key()) {
            Some(&pos) => {
                let existing = &mut links[pos];
                if existing.source_graph == Some(SourceTag::Both) {
                    return Err(GraphError::Schema(format!(
                        "duplicate link {} in prediction",
                        link.key()
                    )));
                }
                // The prior-truth weight must never be silently lost: the
                // prediction weight becomes primary, the ground-truth weight
                // moves aside for display.
                existing.ground_truth_weight = Some(existing.weight);
                existing.weight = link.weight;
                existing.source_graph = Some(SourceTag::Both);
            }
            None => {
                let mut merged = link.clone();
                merged.source_graph = Some(SourceTag::Prediction);
                merged.is_novel = true;
                merged.ground_truth_weight = None;
                link_index.insert(merged.key(), links.len());
                links.push(merged);
            }
        }
    }

    CombinedGraph::new(nodes, links)
}

fn check_endpoints(
    node_index: &HashMap<&str, usize>,
    link: &Link,
    input_name: &str,
) -> GraphResult<()> {
    for endpoint in [&link.source, &link.target] {
        if !node_index.contains_key(endpoint.as_str()) {
            return Err(GraphError::Schema(format!(
                "{} link {} references unknown node '{}'",
                input_name,
                link.key(),
                endpoint
            )));
        }
    }
    Ok(())
}
