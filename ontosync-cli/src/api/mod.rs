//! Knowledge base access
//!
//! [`KnowledgeBaseAdapter`] is the seam between the synchronizer and a store.
//! [`WikibaseAdapter`] talks to a live Wikibase; [`MemoryAdapter`] keeps
//! everything in process for dry runs and tests.

pub mod adapter;
pub mod memory;
pub mod operations;
pub mod wikibase;

pub use adapter::{AdapterError, Binding, KnowledgeBaseAdapter, OperationErrorKind};
pub use memory::MemoryAdapter;
pub use operations::{Operation, OperationStatus, SyncResult, Tier};
pub use wikibase::{UriFactory, WikibaseAdapter, WikibaseSettings};
