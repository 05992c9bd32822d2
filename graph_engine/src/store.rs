// graph_engine/src/store.rs
//! Persistent store for the curated ground-truth graph.
//!
//! One JSON file holds the graph. The in-memory copy lives behind a
//! `tokio::sync::RwLock`; every mutation holds the write lock across the
//! whole read-modify-write cycle, so concurrent writers are serialized
//! within the process instead of racing on the file. Mutations validate
//! first, persist to a temp file that is renamed over the original, and
//! only then commit to memory, so a failed write never leaves a partial
//! state on either side. Before each overwrite the current file is copied
//! to a timestamped backup; backup failure is logged, not fatal.

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;

use models::errors::{GraphError, GraphResult};
use models::graph::Graph;
use models::links::Link;
use models::nodes::{Node, NodeType};

pub struct GraphStore {
    path: PathBuf,
    graph: RwLock<Graph>,
}

impl GraphStore {
    /// Load the persisted graph from `path`. Fails with an IO error when
    /// the file is unreadable and a schema error when its contents do not
    /// parse or validate.
    pub async fn open(path: impl Into<PathBuf>) -> GraphResult<Self> {
        let path = path.into();
        let data = tokio_fs::read_to_string(&path)
            .await
            .map_err(|e| GraphError::Io(format!("failed to read {}: {}", path.display(), e)))?;
        let graph: Graph = serde_json::from_str(&data)?;
        graph.validate()?;
        info!(
            "loaded knowledge graph from {}: {} nodes, {} links",
            path.display(),
            graph.nodes.len(),
            graph.links.len()
        );
        Ok(GraphStore { path, graph: RwLock::new(graph) })
    }

    /// Create a store for a graph that does not exist on disk yet.
    pub async fn create(path: impl Into<PathBuf>, graph: Graph) -> GraphResult<Self> {
        let path = path.into();
        graph.validate()?;
        persist(&path, &graph).await?;
        Ok(GraphStore { path, graph: RwLock::new(graph) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current graph.
    pub async fn graph(&self) -> Graph {
        self.graph.read().await.clone()
    }

    /// Replace the whole persisted graph after validating its shape.
    pub async fn replace(&self, new_graph: Graph) -> GraphResult<()> {
        new_graph.validate()?;
        let mut guard = self.graph.write().await;
        self.backup().await;
        persist(&self.path, &new_graph).await?;
        *guard = new_graph;
        info!("knowledge graph replaced at {}", self.path.display());
        Ok(())
    }

    /// Append one node. Duplicate ids conflict; the stored graph is left
    /// untouched on any failure.
    pub async fn add_node(&self, node: Node) -> GraphResult<()> {
        if node.id.trim().is_empty() {
            return Err(GraphError::Validation("node id must not be empty".to_string()));
        }
        let mut guard = self.graph.write().await;
        if guard.has_node(&node.id) {
            return Err(GraphError::Conflict(format!(
                "a node with id '{}' already exists",
                node.id
            )));
        }
        let mut candidate = guard.clone();
        candidate.nodes.push(node);
        self.backup().await;
        persist(&self.path, &candidate).await?;
        *guard = candidate;
        Ok(())
    }

    /// Append one link. Both endpoints must already exist and the identity
    /// triple must be new; the stored graph is left untouched on failure.
    pub async fn add_link(&self, link: Link) -> GraphResult<()> {
        if !(0.0..=1.0).contains(&link.weight) || link.weight.is_nan() {
            return Err(GraphError::Validation(format!(
                "weight {} outside [0, 1]",
                link.weight
            )));
        }
        let mut guard = self.graph.write().await;
        if !guard.has_node(&link.source) {
            return Err(GraphError::NotFound(format!(
                "source node '{}' does not exist",
                link.source
            )));
        }
        if !guard.has_node(&link.target) {
            return Err(GraphError::NotFound(format!(
                "target node '{}' does not exist",
                link.target
            )));
        }
        if guard.has_link(&link.key()) {
            return Err(GraphError::Conflict(format!(
                "relationship {} already exists",
                link.key()
            )));
        }
        let mut candidate = guard.clone();
        candidate.links.push(link);
        self.backup().await;
        persist(&self.path, &candidate).await?;
        *guard = candidate;
        Ok(())
    }

    /// Ids of every disease node.
    pub async fn diseases(&self) -> Vec<String> {
        self.graph
            .read()
            .await
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Disease)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Ids of every symptom node.
    pub async fn symptoms(&self) -> Vec<String> {
        self.graph
            .read()
            .await
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Symptom)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Outgoing links of one disease, in file order.
    pub async fn disease_connections(&self, name: &str) -> GraphResult<Vec<Link>> {
        let guard = self.graph.read().await;
        let exists = guard
            .nodes
            .iter()
            .any(|n| n.node_type == NodeType::Disease && n.id == name);
        if !exists {
            return Err(GraphError::NotFound(format!("disease '{}' not found", name)));
        }
        Ok(guard.outgoing_links(name).cloned().collect())
    }

    /// Copy the current file to a timestamped sibling. Best effort: a
    /// missing file or a failed copy is a warning, never an error.
    async fn backup(&self) {
        let timestamp = Utc::now()
            .to_rfc3339()
            .replace([':', '.'], "-");
        let backup_path = PathBuf::from(format!("{}.backup-{}", self.path.display(), timestamp));
        match tokio_fs::copy(&self.path, &backup_path).await {
            Ok(_) => debug!("created backup at {}", backup_path.display()),
            Err(e) => warn!(
                "could not create backup of {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Whole-file replace: serialize to a temp sibling, then rename over the
/// target so readers never observe a half-written file.
async fn persist(path: &Path, graph: &Graph) -> GraphResult<()> {
    let data = serde_json::to_string_pretty(graph)?;
    let tmp_path = PathBuf::from(format!("{}.tmp", path.display()));
    tokio_fs::write(&tmp_path, data.as_bytes())
        .await
        .map_err(|e| GraphError::Io(format!("failed to write {}: {}", tmp_path.display(), e)))?;
    tokio_fs::rename(&tmp_path, path)
        .await
        .map_err(|e| GraphError::Io(format!("failed to replace {}: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::links::Relationship;

    fn sample_graph() -> Graph {
        Graph {
            nodes: vec![
                Node::new("Flu", NodeType::Disease),
                Node::new("Fever", NodeType::Symptom),
            ],
            links: vec![Link::new("Flu", "Fever", Relationship::HasSymptom, 0.8)],
        }
    }

    async fn store_in(dir: &tempfile::TempDir) -> GraphStore {
        let path = dir.path().join("knowledge_graph.json");
        GraphStore::create(&path, sample_graph()).await.unwrap()
    }

    #[tokio::test]
    async fn round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let path = store.path().to_path_buf();
        drop(store);

        let reopened = GraphStore::open(&path).await.unwrap();
        assert_eq!(reopened.graph().await, sample_graph());
    }

    #[tokio::test]
    async fn open_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = GraphStore::open(dir.path().join("absent.json")).await;
        assert!(matches!(result, Err(GraphError::Io(_))));
    }

    #[tokio::test]
    async fn open_fails_on_invalid_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio_fs::write(&path, b"{\"nodes\": 7}").await.unwrap();
        assert!(matches!(GraphStore::open(&path).await, Err(GraphError::Schema(_))));
    }

    #[tokio::test]
    async fn duplicate_node_conflicts_and_leaves_graph_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let result = store.add_node(Node::new("Flu", NodeType::Disease)).await;
        assert!(matches!(result, Err(GraphError::Conflict(_))));
        assert_eq!(store.graph().await, sample_graph());
    }

    #[tokio::test]
    async fn link_with_missing_endpoint_is_not_found_and_leaves_graph_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let result = store
            .add_link(Link::new("Flu", "Chills", Relationship::HasSymptom, 0.4))
            .await;
        assert!(matches!(result, Err(GraphError::NotFound(_))));
        assert_eq!(store.graph().await, sample_graph());
    }

    #[tokio::test]
    async fn duplicate_link_triple_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let result = store
            .add_link(Link::new("Flu", "Fever", Relationship::HasSymptom, 0.3))
            .await;
        assert!(matches!(result, Err(GraphError::Conflict(_))));
    }

    #[tokio::test]
    async fn same_endpoints_different_relationship_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .add_link(Link::new("Flu", "Fever", Relationship::DoesNotHaveSymptom, 0.2))
            .await
            .unwrap();
        assert_eq!(store.graph().await.links.len(), 2);
    }

    #[tokio::test]
    async fn out_of_range_weight_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let result = store
            .add_link(Link::new("Flu", "Fever", Relationship::CommonIn, 1.5))
            .await;
        assert!(matches!(result, Err(GraphError::Validation(_))));
    }

    #[tokio::test]
    async fn replace_validates_and_creates_a_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let bad = Graph {
            nodes: vec![Node::new("Flu", NodeType::Disease)],
            links: vec![Link::new("Flu", "Fever", Relationship::HasSymptom, 0.8)],
        };
        assert!(matches!(store.replace(bad).await, Err(GraphError::Schema(_))));

        let mut replacement = sample_graph();
        replacement.nodes.push(Node::new("Cough", NodeType::Symptom));
        store.replace(replacement.clone()).await.unwrap();
        assert_eq!(store.graph().await, replacement);

        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".backup-"))
            .collect();
        assert!(!backups.is_empty());
    }

    #[tokio::test]
    async fn mutations_persist_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store.add_node(Node::new("Nausea", NodeType::Symptom)).await.unwrap();
        store
            .add_link(Link::new("Flu", "Nausea", Relationship::HasSymptom, 0.5))
            .await
            .unwrap();
        let path = store.path().to_path_buf();
        drop(store);

        let reopened = GraphStore::open(&path).await.unwrap();
        let graph = reopened.graph().await;
        assert!(graph.has_node("Nausea"));
        assert_eq!(graph.links.len(), 2);
    }

    #[tokio::test]
    async fn disease_and_symptom_listings() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        assert_eq!(store.diseases().await, vec!["Flu"]);
        assert_eq!(store.symptoms().await, vec!["Fever"]);

        let connections = store.disease_connections("Flu").await.unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].target, "Fever");

        assert!(matches!(
            store.disease_connections("Fever").await,
            Err(GraphError::NotFound(_))
        ));
    }
}
