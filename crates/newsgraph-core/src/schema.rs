//! Graph ontology: node kinds, relationship kinds and their keys.

use serde::Serialize;

/// Node kinds held in the news graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Article,
    Reporter,
    Category,
    Traffic,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Article,
        NodeKind::Reporter,
        NodeKind::Category,
        NodeKind::Traffic,
    ];

    /// Graph label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Article => "Article",
            Self::Reporter => "Reporter",
            Self::Category => "Category",
            Self::Traffic => "Traffic",
        }
    }

    /// Property carrying the node's identity.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Article => "article_id",
            Self::Reporter => "reporter_name",
            Self::Category => "category_name",
            Self::Traffic => "traffic_date",
        }
    }

    /// Name of the uniqueness constraint on the key.
    pub fn constraint_name(&self) -> &'static str {
        match self {
            Self::Article => "article_id_unique",
            Self::Reporter => "reporter_name_unique",
            Self::Category => "category_name_unique",
            Self::Traffic => "traffic_date_unique",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Relationship kinds, all directed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelKind {
    /// Reporter -> Article
    Wrote,
    /// Category -> Article
    Contain,
    /// Article -> Traffic, carries the day's metrics
    Gain,
}

impl RelKind {
    pub fn rel_type(&self) -> &'static str {
        match self {
            Self::Wrote => "WROTE",
            Self::Contain => "CONTAIN",
            Self::Gain => "GAIN",
        }
    }

    pub fn endpoints(&self) -> (NodeKind, NodeKind) {
        match self {
            Self::Wrote => (NodeKind::Reporter, NodeKind::Article),
            Self::Contain => (NodeKind::Category, NodeKind::Article),
            Self::Gain => (NodeKind::Article, NodeKind::Traffic),
        }
    }
}

impl std::fmt::Display for RelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.rel_type())
    }
}

/// Uniqueness constraint on one node kind's key property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub kind: NodeKind,
}

impl UniqueConstraint {
    /// One constraint per node kind, in creation order.
    pub fn all() -> Vec<UniqueConstraint> {
        NodeKind::ALL
            .iter()
            .map(|&kind| UniqueConstraint { kind })
            .collect()
    }

    /// Idempotent Cypher statement creating this constraint.
    ///
    /// Labels and property names cannot be query parameters; both come from
    /// the closed `NodeKind` enum.
    pub fn cypher(&self) -> String {
        format!(
            "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
            self.kind.constraint_name(),
            self.kind.label(),
            self.kind.key()
        )
    }
}
