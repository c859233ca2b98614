//! Top-level synchronization: load both graphs, diff, execute

use anyhow::{Context, Result};

use super::diff::{DiffPlan, diff_plan};
use super::executor::{CancelHandle, ExecutorConfig, OperationExecutor};
use super::report::SyncReport;
use crate::api::adapter::KnowledgeBaseAdapter;
use crate::api::memory::MemoryAdapter;
use crate::graph::{Graph, GraphLoader, GraphSource};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Apply the plan to an in-memory copy of the current graph instead of the adapter
    pub dry_run: bool,
    pub executor: ExecutorConfig,
    pub cancel: CancelHandle,
}

/// A computed plan together with the graph it applies to
#[derive(Debug, Clone)]
pub struct PreparedSync {
    pub current: Graph,
    pub desired: Graph,
    pub plan: DiffPlan,
}

#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    loader: GraphLoader,
    options: SyncOptions,
}

impl Synchronizer {
    pub fn new(options: SyncOptions) -> Self {
        Self {
            loader: GraphLoader::new(),
            options,
        }
    }

    pub fn with_loader(mut self, loader: GraphLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Load both sources and compute the plan. Nothing is executed.
    pub fn prepare(&self, current: &GraphSource, desired: &GraphSource) -> Result<PreparedSync> {
        log::info!("Loading current graph from {}", current.describe());
        let current = self
            .loader
            .load(current)
            .context("Failed to load current graph")?;

        log::info!("Loading desired graph from {}", desired.describe());
        let desired = self
            .loader
            .load(desired)
            .context("Failed to load desired graph")?;

        Ok(self.prepare_graphs(current, desired))
    }

    /// Plan against graphs that are already loaded
    pub fn prepare_graphs(&self, current: Graph, desired: Graph) -> PreparedSync {
        let plan = diff_plan(&current, &desired);
        if !plan.ambiguities.is_empty() {
            log::warn!(
                "{} subjects have conflicting types and were classified by precedence",
                plan.ambiguities.len()
            );
        }
        if !plan.untyped.is_empty() {
            log::info!(
                "{} subjects carry no rdf:type and are treated as instances",
                plan.untyped.len()
            );
        }
        log::info!(
            "Planned {} operations ({} removals, {} additions, {} unchanged)",
            plan.len(),
            plan.stats.to_remove,
            plan.stats.to_add,
            plan.stats.unchanged
        );

        PreparedSync {
            current,
            desired,
            plan,
        }
    }

    pub fn loader(&self) -> &GraphLoader {
        &self.loader
    }

    /// Execute a prepared plan.
    ///
    /// A fatal abort comes back as a [`SyncAborted`](super::executor::SyncAborted)
    /// inside the error and can be recovered with `downcast`.
    pub async fn apply(&self, prepared: PreparedSync, adapter: &dyn KnowledgeBaseAdapter) -> Result<SyncReport> {
        let executor = OperationExecutor::new(self.options.executor.clone())
            .with_cancel_handle(self.options.cancel.clone());
        let operations = prepared.plan.into_operations();

        if self.options.dry_run {
            log::info!("Dry run: applying plan to an in-memory copy");
            let shadow = MemoryAdapter::with_graph(prepared.current);
            return match executor.execute(operations, &shadow).await {
                Ok(mut report) => {
                    report.dry_run = true;
                    Ok(report)
                }
                Err(mut aborted) => {
                    aborted.report.dry_run = true;
                    Err(aborted.into())
                }
            };
        }

        Ok(executor.execute(operations, adapter).await?)
    }

    pub async fn synchronize(
        &self,
        current: &GraphSource,
        desired: &GraphSource,
        adapter: &dyn KnowledgeBaseAdapter,
    ) -> Result<SyncReport> {
        let prepared = self.prepare(current, desired)?;
        self.apply(prepared, adapter).await
    }
}

/// Bring the knowledge base from `current` to `desired`
pub async fn synchronize(
    current: &GraphSource,
    desired: &GraphSource,
    adapter: &dyn KnowledgeBaseAdapter,
    options: SyncOptions,
) -> Result<SyncReport> {
    Synchronizer::new(options)
        .synchronize(current, desired, adapter)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::adapter::AdapterError;
    use crate::api::operations::OperationStatus;
    use crate::graph::{Term, Triple, Vocabulary};
    use crate::sync::classify::EntityKind;
    use crate::sync::executor::SyncAborted;
    use crate::sync::report::AbortReason;

    const PREFIXES: &str = "@prefix ex: <http://example.org/> .\n\
        @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n\
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
        @prefix owl: <http://www.w3.org/2002/07/owl#> .\n";

    fn turtle(body: &str) -> GraphSource {
        GraphSource::turtle(format!("{}{}", PREFIXES, body))
    }

    fn ex(name: &str) -> Term {
        Term::iri(format!("http://example.org/{}", name))
    }

    #[tokio::test]
    async fn test_adds_instance_typing() {
        let current = turtle("ex:Cat a owl:Class .");
        let desired = turtle("ex:Cat a owl:Class . ex:fluffy a ex:Cat .");
        let adapter = MemoryAdapter::with_graph(GraphLoader::new().load(&current).unwrap());

        let report = synchronize(&current, &desired, &adapter, SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.applied, 1);
        let entry = &report.entries[0];
        assert!(entry.operation.is_add());
        assert_eq!(entry.operation.kind(), EntityKind::Instance);
        assert_eq!(
            entry.operation.triple(),
            &Triple::new(ex("fluffy"), Vocabulary::RdfType.iri(), ex("Cat"))
        );
    }

    #[tokio::test]
    async fn test_second_run_is_empty() {
        let desired = turtle(
            "ex:owner a owl:ObjectProperty .\n\
             ex:Cat a owl:Class ; rdfs:label \"Cat\"@en .\n\
             ex:fluffy a ex:Cat ; ex:owner ex:alice .",
        );
        let adapter = MemoryAdapter::new();
        let sync = Synchronizer::default();

        let first = sync
            .synchronize(&GraphSource::Empty, &desired, &adapter)
            .await
            .unwrap();
        assert!(first.is_success());
        assert_eq!(first.applied, 5);
        assert_eq!(adapter.snapshot().await, GraphLoader::new().load(&desired).unwrap());

        let second = sync.synchronize(&desired, &desired, &adapter).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_adapter_untouched() {
        let desired = turtle("ex:Cat a owl:Class .");
        let adapter = MemoryAdapter::new();
        let options = SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        };

        let report = synchronize(&GraphSource::Empty, &desired, &adapter, options)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.applied, 1);
        assert!(adapter.snapshot().await.is_empty());
        assert!(adapter.attempts().await.is_empty());
    }

    #[tokio::test]
    async fn test_parse_error_executes_nothing() {
        let adapter = MemoryAdapter::new();

        let err = synchronize(
            &GraphSource::Empty,
            &GraphSource::turtle("ex:broken a"),
            &adapter,
            SyncOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("desired graph"));
        assert!(adapter.attempts().await.is_empty());
    }

    #[tokio::test]
    async fn test_abort_keeps_partial_report() {
        let desired = turtle("ex:p a owl:DatatypeProperty . ex:Cat a owl:Class .");
        let adapter = MemoryAdapter::new();
        let property = Triple::new(ex("p"), Vocabulary::RdfType.iri(), Term::iri(Vocabulary::OwlDatatypeProperty.iri()));
        adapter
            .fail_on(property, AdapterError::Unreachable("connection refused".to_string()))
            .await;

        let err = synchronize(&GraphSource::Empty, &desired, &adapter, SyncOptions::default())
            .await
            .unwrap_err();

        let aborted = err.downcast_ref::<SyncAborted>().unwrap();
        assert!(matches!(aborted.reason, AbortReason::Fatal(_)));
        assert_eq!(aborted.report.entries[0].result.status, OperationStatus::Failed);
        assert_eq!(aborted.report.entries[1].result.status, OperationStatus::Skipped);
    }
}
