// models/src/links.rs
use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::nodes::SourceTag;

/// Relationship vocabulary between a disease and its factors.
///
/// `Other` keeps the model open for relationship kinds the curated files
/// have not used yet; everything else carries the exact wire spelling.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Relationship {
    HasSymptom,
    DoesNotHaveSymptom,
    CommonIn,
    PrevalentIn,
    AssociatedWith,
    CorrelatedWith,
    Other(String),
}

impl Relationship {
    pub fn as_str(&self) -> &str {
        match self {
            Relationship::HasSymptom => "HAS_SYMPTOM",
            Relationship::DoesNotHaveSymptom => "DOES_NOT_HAVE_SYMPTOM",
            Relationship::CommonIn => "COMMON_IN",
            Relationship::PrevalentIn => "PREVALENT_IN",
            Relationship::AssociatedWith => "ASSOCIATED_WITH",
            Relationship::CorrelatedWith => "CORRELATED_WITH",
            Relationship::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "HAS_SYMPTOM" => Relationship::HasSymptom,
            "DOES_NOT_HAVE_SYMPTOM" => Relationship::DoesNotHaveSymptom,
            "COMMON_IN" => Relationship::CommonIn,
            "PREVALENT_IN" => Relationship::PrevalentIn,
            "ASSOCIATED_WITH" => Relationship::AssociatedWith,
            "CORRELATED_WITH" => Relationship::CorrelatedWith,
            other => Relationship::Other(other.to_string()),
        }
    }

    /// Synthesized label for displaying an incoming link from the target's
    /// point of view, e.g. `IS_HAS_SYMPTOM_OF` for `HAS_SYMPTOM`.
    pub fn reverse_label(&self) -> String {
        format!("IS_{}_OF", self.as_str())
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Relationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Relationship::from_name(&name))
    }
}

/// A directed, weighted edge between two node ids.
///
/// Links reference ids rather than nodes; endpoint lookups go through the
/// owning graph's index. `source_graph` is absent on raw inputs, derived on
/// merge. `ground_truth_weight` retains the prior-truth weight when the same
/// triple appears in both graphs (the prediction weight becomes primary).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub relationship: Relationship,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_graph: Option<SourceTag>,
    #[serde(default)]
    pub is_novel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth_weight: Option<f64>,
}

impl Link {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: Relationship,
        weight: f64,
    ) -> Self {
        Link {
            source: source.into(),
            target: target.into(),
            relationship,
            weight,
            source_graph: None,
            is_novel: false,
            ground_truth_weight: None,
        }
    }

    /// Identity key for duplicate detection. Two links with the same
    /// ordered `(source, target, relationship)` triple are the same link.
    pub fn key(&self) -> LinkKey {
        LinkKey {
            source: self.source.clone(),
            target: self.target.clone(),
            relationship: self.relationship.clone(),
        }
    }

    /// True when `id` is either endpoint.
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Ordered identity triple of a link.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub source: String,
    pub target: String,
    pub relationship: Relationship,
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.relationship, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_round_trips_wire_spellings() {
        for name in [
            "HAS_SYMPTOM",
            "DOES_NOT_HAVE_SYMPTOM",
            "COMMON_IN",
            "PREVALENT_IN",
            "ASSOCIATED_WITH",
            "CORRELATED_WITH",
        ] {
            assert_eq!(Relationship::from_name(name).as_str(), name);
        }
    }

    #[test]
    fn reverse_label_is_synthesized() {
        assert_eq!(Relationship::HasSymptom.reverse_label(), "IS_HAS_SYMPTOM_OF");
        assert_eq!(Relationship::CommonIn.reverse_label(), "IS_COMMON_IN_OF");
    }

    #[test]
    fn link_keys_distinguish_relationship_kinds() {
        let a = Link::new("Flu", "Fever", Relationship::HasSymptom, 0.8);
        let b = Link::new("Flu", "Fever", Relationship::DoesNotHaveSymptom, 0.8);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().key());
    }

    #[test]
    fn link_deserializes_without_derived_fields() {
        let link: Link = serde_json::from_str(
            r#"{"source": "Flu", "target": "Fever", "relationship": "HAS_SYMPTOM", "weight": 0.8}"#,
        )
        .unwrap();
        assert!(link.source_graph.is_none());
        assert!(link.ground_truth_weight.is_none());
        assert!(!link.is_novel);
    }
}
