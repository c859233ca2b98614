//! Ontology synchronization into Wikibase
//!
//! Load a current and a desired RDF graph, compute the ordered edit plan
//! between them, and apply it to a knowledge base through an adapter.

pub mod api;
pub mod config;
pub mod graph;
pub mod sync;
