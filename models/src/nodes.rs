// models/src/nodes.rs
use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Clinical category of a node. The wire spellings match the curated
/// graph files ("Age Group", "Blood Pressure", ...); anything outside the
/// known vocabulary round-trips through `Other` untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Disease,
    Symptom,
    AgeGroup,
    Gender,
    BloodPressure,
    CholesterolLevel,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Disease => "Disease",
            NodeType::Symptom => "Symptom",
            NodeType::AgeGroup => "Age Group",
            NodeType::Gender => "Gender",
            NodeType::BloodPressure => "Blood Pressure",
            NodeType::CholesterolLevel => "Cholesterol Level",
            NodeType::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "Disease" => NodeType::Disease,
            "Symptom" => NodeType::Symptom,
            "Age Group" => NodeType::AgeGroup,
            "Gender" => NodeType::Gender,
            "Blood Pressure" => NodeType::BloodPressure,
            "Cholesterol Level" => NodeType::CholesterolLevel,
            other => NodeType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(NodeType::from_name(&name))
    }
}

/// Which input graph an element came from. Never supplied by callers for
/// derived views; the merge engine computes it from set membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    GroundTruth,
    Prediction,
    Both,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceTag::GroundTruth => "ground_truth",
            SourceTag::Prediction => "prediction",
            SourceTag::Both => "both",
        };
        write!(f, "{}", s)
    }
}

/// A graph node keyed by its natural id (exact string match across inputs,
/// no fuzzy or synonym matching).
///
/// `source` is absent on raw input graphs and filled in by the merge engine.
/// `fx`/`fy` are pinned coordinates, set only while the node is dragged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceTag>,
    #[serde(default)]
    pub is_novel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Node {
            id: id.into(),
            node_type,
            source: None,
            is_novel: false,
            x: None,
            y: None,
            fx: None,
            fy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_round_trips_wire_spellings() {
        for name in ["Disease", "Symptom", "Age Group", "Gender", "Blood Pressure", "Cholesterol Level"] {
            assert_eq!(NodeType::from_name(name).as_str(), name);
        }
    }

    #[test]
    fn unknown_node_type_is_preserved() {
        let t = NodeType::from_name("Comorbidity");
        assert_eq!(t, NodeType::Other("Comorbidity".to_string()));
        assert_eq!(t.as_str(), "Comorbidity");
    }

    #[test]
    fn node_deserializes_without_source_or_coordinates() {
        let node: Node = serde_json::from_str(r#"{"id": "Flu", "type": "Disease"}"#).unwrap();
        assert_eq!(node.id, "Flu");
        assert_eq!(node.node_type, NodeType::Disease);
        assert!(node.source.is_none());
        assert!(!node.is_novel);
        assert!(node.x.is_none());
    }

    #[test]
    fn source_tag_uses_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&SourceTag::GroundTruth).unwrap(), r#""ground_truth""#);
        assert_eq!(serde_json::to_string(&SourceTag::Both).unwrap(), r#""both""#);
    }
}
