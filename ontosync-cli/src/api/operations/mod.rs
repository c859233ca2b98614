//! Knowledge Base Operations Module
//!
//! This module provides the unit of work the synchronizer hands to an
//! adapter, along with the per-operation result type.

pub mod operation;

pub use operation::{Operation, OperationStatus, SyncResult, Tier};
