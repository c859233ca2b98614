//! Synchronization pipeline
//!
//! Classification and diffing are pure functions over graphs. The executor
//! and the [`Synchronizer`] facade drive a knowledge base adapter.

pub mod classify;
pub mod diff;
pub mod executor;
pub mod report;
pub mod synchronizer;

pub use classify::{Classification, ClassificationAmbiguity, EntityKind, classify};
pub use diff::{DiffPlan, DiffStats, diff, diff_plan};
pub use executor::{CancelHandle, ExecutorConfig, OperationExecutor, SyncAborted, execute};
pub use report::{AbortReason, ReportEntry, ReportRow, SyncReport};
pub use synchronizer::{PreparedSync, SyncOptions, Synchronizer, synchronize};
