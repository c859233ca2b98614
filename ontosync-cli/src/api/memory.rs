//! In-process knowledge base backed by a [`Graph`]
//!
//! Used for dry runs and for exercising the executor without a network.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use crate::api::adapter::{AdapterError, Binding, KnowledgeBaseAdapter};
use crate::api::operations::SyncResult;
use crate::graph::{Graph, Triple};

#[derive(Debug, Default)]
struct UriTable {
    ids: BTreeMap<String, String>,
    next: u64,
}

#[derive(Debug, Default)]
pub struct MemoryAdapter {
    graph: Mutex<Graph>,
    uris: Mutex<UriTable>,
    failures: Mutex<HashMap<Triple, AdapterError>>,
    attempts: Mutex<Vec<Triple>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing knowledge base state
    pub fn with_graph(graph: Graph) -> Self {
        Self {
            graph: Mutex::new(graph),
            ..Self::default()
        }
    }

    /// Make every add or remove of `triple` fail with `error`
    pub async fn fail_on(&self, triple: Triple, error: AdapterError) {
        self.failures.lock().await.insert(triple, error);
    }

    /// Current contents
    pub async fn snapshot(&self) -> Graph {
        self.graph.lock().await.clone()
    }

    /// Every triple an add or remove was attempted for, in call order
    pub async fn attempts(&self) -> Vec<Triple> {
        self.attempts.lock().await.clone()
    }

    async fn check_scripted(&self, triple: &Triple) -> Result<(), AdapterError> {
        self.attempts.lock().await.push(triple.clone());
        match self.failures.lock().await.get(triple) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KnowledgeBaseAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    async fn add_triple(&self, triple: &Triple) -> Result<SyncResult, AdapterError> {
        self.check_scripted(triple).await?;

        if !self.graph.lock().await.insert(triple.clone()) {
            return Err(AdapterError::already_exists(triple.to_string()));
        }
        Ok(SyncResult::success())
    }

    async fn remove_triple(&self, triple: &Triple) -> Result<SyncResult, AdapterError> {
        self.check_scripted(triple).await?;

        if !self.graph.lock().await.remove(triple) {
            return Err(AdapterError::not_found(triple.to_string()));
        }
        Ok(SyncResult::success())
    }

    async fn resolve_uri(&self, uri: &str) -> Result<String, AdapterError> {
        let mut table = self.uris.lock().await;
        if let Some(id) = table.ids.get(uri) {
            return Ok(id.clone());
        }

        table.next += 1;
        let id = format!("Q{}", table.next);
        table.ids.insert(uri.to_string(), id.clone());
        Ok(id)
    }

    async fn query(&self, _sparql: &str) -> Result<Vec<Binding>, AdapterError> {
        Err(AdapterError::not_implemented(
            "SPARQL queries are not supported by the in-memory adapter",
        ))
    }
}
