//! Core Operation types for triple-level knowledge base mutations

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::adapter::{AdapterError, KnowledgeBaseAdapter, OperationErrorKind};
use crate::graph::Triple;
use crate::sync::classify::EntityKind;

/// A single mutation to apply to a knowledge base.
///
/// The entity kind of the triple's subject travels with the operation so the
/// executor can order and group work; it is not sent to the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Assert a triple that is missing from the knowledge base
    AddTriple { triple: Triple, kind: EntityKind },
    /// Retract a triple that is no longer desired
    RemoveTriple { triple: Triple, kind: EntityKind },
}

/// Execution phase of an operation. Lower tiers run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Remove,
    PropertyAdd,
    ClassAdd,
    InstanceAdd,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Remove => "removals",
            Self::PropertyAdd => "property additions",
            Self::ClassAdd => "class additions",
            Self::InstanceAdd => "instance additions",
        }
    }
}

impl Operation {
    pub fn add(triple: Triple, kind: EntityKind) -> Self {
        Self::AddTriple { triple, kind }
    }

    pub fn remove(triple: Triple, kind: EntityKind) -> Self {
        Self::RemoveTriple { triple, kind }
    }

    pub fn triple(&self) -> &Triple {
        match self {
            Self::AddTriple { triple, .. } | Self::RemoveTriple { triple, .. } => triple,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::AddTriple { kind, .. } | Self::RemoveTriple { kind, .. } => *kind,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::AddTriple { .. })
    }

    pub fn tier(&self) -> Tier {
        match self {
            Self::RemoveTriple { .. } => Tier::Remove,
            Self::AddTriple { kind, .. } => match kind {
                EntityKind::Property => Tier::PropertyAdd,
                EntityKind::Class => Tier::ClassAdd,
                EntityKind::Instance => Tier::InstanceAdd,
            },
        }
    }

    /// Get the operation type as a string
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::AddTriple { .. } => "add_triple",
            Self::RemoveTriple { .. } => "remove_triple",
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::AddTriple { .. } => '+',
            Self::RemoveTriple { .. } => '-',
        }
    }

    /// Execute this operation individually against a knowledge base
    pub async fn execute(&self, adapter: &dyn KnowledgeBaseAdapter) -> Result<SyncResult, AdapterError> {
        match self {
            Self::AddTriple { triple, .. } => adapter.add_triple(triple).await,
            Self::RemoveTriple { triple, .. } => adapter.remove_triple(triple).await,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.symbol(), self.triple(), self.kind())
    }
}

/// Outcome category of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Applied,
    Failed,
    /// Never attempted (cancelled or after a fatal error)
    Skipped,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Applied => "applied",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Result of executing an Operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Whether the operation succeeded
    pub successful: bool,
    /// Detail from the knowledge base or the failure description
    pub message: Option<String>,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<OperationErrorKind>,
}

impl SyncResult {
    /// Create a new successful result
    pub fn success() -> Self {
        Self {
            successful: true,
            message: None,
            status: OperationStatus::Applied,
            error_kind: None,
        }
    }

    /// Successful result with a detail message (e.g., the entity id touched)
    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success()
        }
    }

    /// Create a new error result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            successful: false,
            message: Some(message.into()),
            status: OperationStatus::Failed,
            error_kind: None,
        }
    }

    pub fn from_error(error: &AdapterError) -> Self {
        Self {
            error_kind: error.operation_kind(),
            ..Self::failure(error.to_string())
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            successful: false,
            message: Some(reason.into()),
            status: OperationStatus::Skipped,
            error_kind: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.successful
    }

    pub fn is_skipped(&self) -> bool {
        self.status == OperationStatus::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryAdapter;
    use crate::graph::Term;

    fn fluffy_is_cat() -> Triple {
        Triple::new(
            Term::iri("http://example.org/fluffy"),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
            Term::iri("http://example.org/Cat"),
        )
    }

    #[test]
    fn test_display() {
        let op = Operation::add(fluffy_is_cat(), EntityKind::Instance);
        assert_eq!(
            op.to_string(),
            "+ <http://example.org/fluffy> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/Cat> [Instance]"
        );

        let op = Operation::remove(fluffy_is_cat(), EntityKind::Instance);
        assert!(op.to_string().starts_with("- <http://example.org/fluffy>"));
    }

    #[test]
    fn test_tiers_order() {
        let remove = Operation::remove(fluffy_is_cat(), EntityKind::Property);
        let prop = Operation::add(fluffy_is_cat(), EntityKind::Property);
        let class = Operation::add(fluffy_is_cat(), EntityKind::Class);
        let inst = Operation::add(fluffy_is_cat(), EntityKind::Instance);

        assert!(remove.tier() < prop.tier());
        assert!(prop.tier() < class.tier());
        assert!(class.tier() < inst.tier());
    }

    #[test]
    fn test_serialized_shape() {
        let op = Operation::add(fluffy_is_cat(), EntityKind::Instance);
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["op"], "add_triple");
        assert_eq!(json["kind"], "Instance");
        assert_eq!(json["triple"]["subject"]["type"], "iri");
    }

    #[test]
    fn test_result_constructors() {
        assert!(SyncResult::success().is_success());
        assert_eq!(SyncResult::failure("nope").status, OperationStatus::Failed);

        let err = AdapterError::not_found("no such claim");
        let result = SyncResult::from_error(&err);
        assert!(!result.successful);
        assert_eq!(result.error_kind, Some(OperationErrorKind::NotFound));

        assert!(SyncResult::skipped("cancelled").is_skipped());
    }

    #[tokio::test]
    async fn test_execute_delegates_to_adapter() {
        let adapter = MemoryAdapter::new();
        let add = Operation::add(fluffy_is_cat(), EntityKind::Instance);

        assert!(add.execute(&adapter).await.unwrap().is_success());
        assert!(adapter.snapshot().await.contains(&fluffy_is_cat()));

        let remove = Operation::remove(fluffy_is_cat(), EntityKind::Instance);
        assert!(remove.execute(&adapter).await.unwrap().is_success());
        assert!(adapter.snapshot().await.is_empty());
    }
}
