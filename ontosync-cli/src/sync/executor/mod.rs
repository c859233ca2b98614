//! Operation execution
//!
//! Runs an ordered list of operations through a knowledge base adapter and
//! records one result per operation. Recoverable adapter errors are recorded
//! and the batch continues; fatal errors and cancellation stop the batch and
//! mark everything not yet attempted as skipped.

pub mod cancel;
pub mod config;
pub mod limiter;

pub use cancel::CancelHandle;
pub use config::{ConcurrencyConfig, ExecutorConfig, ExecutorConfigBuilder};
pub use limiter::{ConcurrencyLimiter, ConcurrencyStats};

use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};

use super::report::{AbortReason, SyncReport};
use crate::api::adapter::{AdapterError, KnowledgeBaseAdapter};
use crate::api::operations::{Operation, SyncResult};

const SKIPPED_CANCELLED: &str = "skipped: run cancelled";
const SKIPPED_AFTER_FATAL: &str = "skipped after fatal error";

/// The run stopped early. The partial report is always available.
#[derive(Debug, thiserror::Error)]
#[error("synchronization aborted, {reason}: {}", .report.summary())]
pub struct SyncAborted {
    pub reason: AbortReason,
    pub report: SyncReport,
}

/// Outcome of one operation within a concurrently executed tier
enum Attempt {
    Finished(Result<SyncResult, AdapterError>),
    Cancelled,
    AfterFatal,
}

#[derive(Debug, Clone, Default)]
pub struct OperationExecutor {
    config: ExecutorConfig,
    cancel: CancelHandle,
}

impl OperationExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            cancel: CancelHandle::new(),
        }
    }

    /// Share an externally owned cancel handle (e.g., wired to Ctrl-C)
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub async fn execute(
        &self,
        operations: Vec<Operation>,
        adapter: &dyn KnowledgeBaseAdapter,
    ) -> Result<SyncReport, SyncAborted> {
        log::info!(
            "Executing {} operations against {} ({})",
            operations.len(),
            adapter.name(),
            if self.config.parallel_tiers { "parallel tiers" } else { "sequential" }
        );

        let mut report = SyncReport::new();
        let aborted = if self.config.parallel_tiers {
            self.run_tiers(operations, adapter, &mut report).await
        } else {
            self.run_sequential(operations, adapter, &mut report).await
        };
        report.finish();

        match aborted {
            Some(reason) => {
                log::error!("Synchronization aborted ({}): {}", reason, report.summary());
                report.aborted = Some(reason.clone());
                Err(SyncAborted { reason, report })
            }
            None => {
                log::info!("Synchronization finished: {}", report.summary());
                Ok(report)
            }
        }
    }

    async fn run_sequential(
        &self,
        operations: Vec<Operation>,
        adapter: &dyn KnowledgeBaseAdapter,
        report: &mut SyncReport,
    ) -> Option<AbortReason> {
        let mut remaining = operations.into_iter();
        let mut aborted = None;

        for operation in remaining.by_ref() {
            if self.cancel.is_cancelled() {
                report.record(operation, SyncResult::skipped(SKIPPED_CANCELLED));
                aborted = Some(AbortReason::Cancelled);
                break;
            }

            let outcome = operation.execute(adapter).await;
            if let Some(reason) = record_outcome(report, operation, outcome) {
                aborted = Some(reason);
                break;
            }
        }

        if let Some(reason) = &aborted {
            let message = skip_message(reason);
            for operation in remaining {
                report.record(operation, SyncResult::skipped(message));
            }
        }

        aborted
    }

    async fn run_tiers(
        &self,
        operations: Vec<Operation>,
        adapter: &dyn KnowledgeBaseAdapter,
        report: &mut SyncReport,
    ) -> Option<AbortReason> {
        let limiter = ConcurrencyLimiter::new(self.config.concurrency.clone());
        let mut aborted: Option<AbortReason> = None;

        for tier in group_by_tier(operations) {
            if aborted.is_none() && self.cancel.is_cancelled() {
                aborted = Some(AbortReason::Cancelled);
            }
            if let Some(reason) = &aborted {
                let message = skip_message(reason);
                for operation in tier {
                    report.record(operation, SyncResult::skipped(message));
                }
                continue;
            }

            if let Some(first) = tier.first() {
                log::debug!("Running {} {} concurrently", tier.len(), first.tier().label());
            }

            let fatal = AtomicBool::new(false);
            let attempts = join_all(tier.iter().map(|operation| {
                let limiter = &limiter;
                let fatal = &fatal;
                async move {
                    let Ok(_permit) = limiter.acquire().await else {
                        return Attempt::Cancelled;
                    };
                    if fatal.load(Ordering::SeqCst) {
                        return Attempt::AfterFatal;
                    }
                    if self.cancel.is_cancelled() {
                        return Attempt::Cancelled;
                    }
                    let outcome = operation.execute(adapter).await;
                    if matches!(&outcome, Err(e) if e.is_fatal()) {
                        fatal.store(true, Ordering::SeqCst);
                    }
                    Attempt::Finished(outcome)
                }
            }))
            .await;

            let mut cancelled = false;
            for (operation, attempt) in tier.into_iter().zip(attempts) {
                match attempt {
                    Attempt::Finished(outcome) => {
                        if let Some(reason) = record_outcome(report, operation, outcome) {
                            aborted.get_or_insert(reason);
                        }
                    }
                    Attempt::Cancelled => {
                        cancelled = true;
                        report.record(operation, SyncResult::skipped(SKIPPED_CANCELLED));
                    }
                    Attempt::AfterFatal => {
                        report.record(operation, SyncResult::skipped(SKIPPED_AFTER_FATAL));
                    }
                }
            }

            if cancelled {
                aborted.get_or_insert(AbortReason::Cancelled);
            }
        }

        let stats = limiter.stats();
        log::debug!(
            "Limiter: {} permits acquired, {:.0}% waited (max {})",
            stats.requests_acquired,
            stats.wait_rate() * 100.0,
            stats.max_concurrent_requests
        );

        aborted
    }
}

/// Execute with the default sequential configuration
pub async fn execute(
    operations: Vec<Operation>,
    adapter: &dyn KnowledgeBaseAdapter,
) -> Result<SyncReport, SyncAborted> {
    OperationExecutor::default().execute(operations, adapter).await
}

/// Record one adapter outcome; returns the abort reason if it was fatal
fn record_outcome(
    report: &mut SyncReport,
    operation: Operation,
    outcome: Result<SyncResult, AdapterError>,
) -> Option<AbortReason> {
    match outcome {
        Ok(result) => {
            log::debug!("{} -> {}", operation, result.status);
            report.record(operation, result);
            None
        }
        Err(error) if error.is_fatal() => {
            log::error!("{} -> {}", operation, error);
            report.record(operation, SyncResult::from_error(&error));
            Some(AbortReason::Fatal(error.to_string()))
        }
        Err(error) => {
            log::warn!("{} -> {}", operation, error);
            report.record(operation, SyncResult::from_error(&error));
            None
        }
    }
}

fn skip_message(reason: &AbortReason) -> &'static str {
    match reason {
        AbortReason::Cancelled => SKIPPED_CANCELLED,
        AbortReason::Fatal(_) => SKIPPED_AFTER_FATAL,
    }
}

/// Split plan-ordered operations into contiguous same-tier groups
fn group_by_tier(operations: Vec<Operation>) -> Vec<Vec<Operation>> {
    let mut tiers: Vec<Vec<Operation>> = Vec::new();
    for operation in operations {
        match tiers.last_mut() {
            Some(tier) if tier.first().is_some_and(|first| first.tier() == operation.tier()) => {
                tier.push(operation)
            }
            _ => tiers.push(vec![operation]),
        }
    }
    tiers
}
