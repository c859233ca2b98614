//! RDF graph model and loading
//!
//! This module provides the in-memory triple store that both sides of a
//! synchronization are expressed in, plus parsers for the supported
//! serializations.

pub mod canonical;
pub mod loader;
pub mod model;
pub mod vocab;

pub use canonical::canonicalize_blank_nodes;
pub use loader::{GraphLoader, GraphSource, LoadError, RdfFormat, load};
pub use model::{Graph, Literal, Term, Triple, local_name};
pub use vocab::Vocabulary;
