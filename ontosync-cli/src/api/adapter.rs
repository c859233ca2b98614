//! Knowledge base adapter capability and its error taxonomy

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::api::operations::SyncResult;
use crate::graph::Triple;

/// One SPARQL solution: variable name to value
pub type Binding = BTreeMap<String, String>;

/// Why a single operation was refused. None of these stop a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationErrorKind {
    /// The triple cannot be expressed as a valid knowledge base value
    Malformed,
    AlreadyExists,
    NotFound,
    /// The knowledge base refused the edit for another reason
    Rejected,
    /// The adapter has no mapping for this kind of mutation
    NotImplemented,
}

impl fmt::Display for OperationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Malformed => "malformed value",
            Self::AlreadyExists => "already exists",
            Self::NotFound => "not found",
            Self::Rejected => "rejected",
            Self::NotImplemented => "not implemented",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("knowledge base unreachable: {0}")]
    Unreachable(String),

    #[error("{kind}: {message}")]
    Operation {
        kind: OperationErrorKind,
        message: String,
    },
}

impl AdapterError {
    pub fn operation(kind: OperationErrorKind, message: impl Into<String>) -> Self {
        Self::Operation {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::operation(OperationErrorKind::Malformed, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::operation(OperationErrorKind::AlreadyExists, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operation(OperationErrorKind::NotFound, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::operation(OperationErrorKind::Rejected, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::operation(OperationErrorKind::NotImplemented, message)
    }

    /// Fatal errors abort the whole run; everything else is recorded per operation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Unreachable(_))
    }

    pub fn operation_kind(&self) -> Option<OperationErrorKind> {
        match self {
            Self::Operation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Mutation and query access to a knowledge base.
///
/// An adapter holds one authenticated session. Methods take `&self` so that
/// operations of one tier can be issued concurrently; only one executor may
/// drive an adapter at a time.
#[async_trait]
pub trait KnowledgeBaseAdapter: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn add_triple(&self, triple: &Triple) -> Result<SyncResult, AdapterError>;

    async fn remove_triple(&self, triple: &Triple) -> Result<SyncResult, AdapterError>;

    /// Map a URI (or bare local name) to the knowledge base's own identifier,
    /// creating an entity when none exists yet.
    async fn resolve_uri(&self, uri: &str) -> Result<String, AdapterError>;

    async fn query(&self, sparql: &str) -> Result<Vec<Binding>, AdapterError>;
}
