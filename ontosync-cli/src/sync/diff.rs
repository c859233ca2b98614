//! Graph diff logic for turning a current and a desired graph into operations
//!
//! This module provides functions to:
//! - Compute the triples to add and remove
//! - Attach the entity kind of each triple's subject
//! - Order the result so removals run first and additions follow
//!   property, class, instance order
//! - Summarize the plan

use serde::Serialize;
use std::collections::BTreeSet;

use super::classify::{ClassificationAmbiguity, EntityKind, classify};
use crate::api::operations::{Operation, Tier};
use crate::graph::{Graph, Term};

/// An ordered set of operations plus what was learned while building it
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffPlan {
    pub operations: Vec<Operation>,
    pub stats: DiffStats,
    /// Ambiguous subjects from both graphs
    pub ambiguities: Vec<ClassificationAmbiguity>,
    /// Subjects of the desired graph that carry no rdf:type
    pub untyped: BTreeSet<Term>,
}

impl DiffPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Contiguous runs of operations sharing a tier, in execution order
    pub fn tiers(&self) -> Vec<(Tier, &[Operation])> {
        self.operations
            .chunk_by(|a, b| a.tier() == b.tier())
            .filter_map(|chunk| chunk.first().map(|op| (op.tier(), chunk)))
            .collect()
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}

/// Summary statistics for a diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub to_add: usize,
    pub to_remove: usize,
    pub unchanged: usize,
    pub property_additions: usize,
    pub class_additions: usize,
    pub instance_additions: usize,
}

impl DiffStats {
    pub fn from_operations(operations: &[Operation], unchanged: usize) -> Self {
        let count = |tier: Tier| operations.iter().filter(|op| op.tier() == tier).count();

        Self {
            to_add: operations.iter().filter(|op| op.is_add()).count(),
            to_remove: count(Tier::Remove),
            unchanged,
            property_additions: count(Tier::PropertyAdd),
            class_additions: count(Tier::ClassAdd),
            instance_additions: count(Tier::InstanceAdd),
        }
    }

    pub fn total(&self) -> usize {
        self.to_add + self.to_remove
    }
}

/// Compute the ordered operations that turn `current` into `desired`
pub fn diff(current: &Graph, desired: &Graph) -> Vec<Operation> {
    diff_plan(current, desired).operations
}

/// Compute the full plan that turns `current` into `desired`
pub fn diff_plan(current: &Graph, desired: &Graph) -> DiffPlan {
    let current_kinds = classify(current);
    let desired_kinds = classify(desired);

    // BTreeSet difference yields triples already sorted by (subject, predicate, object)
    let mut operations: Vec<Operation> = current
        .difference(desired)
        .map(|triple| Operation::remove(triple.clone(), current_kinds.kind_of(&triple.subject)))
        .collect();

    let additions: Vec<Operation> = desired
        .difference(current)
        .map(|triple| Operation::add(triple.clone(), desired_kinds.kind_of(&triple.subject)))
        .collect();

    for kind in EntityKind::ALL {
        operations.extend(additions.iter().filter(|op| op.kind() == kind).cloned());
    }

    let unchanged = current.intersection(desired).count();
    let stats = DiffStats::from_operations(&operations, unchanged);

    log::debug!(
        "Diff: {} to add, {} to remove, {} unchanged",
        stats.to_add,
        stats.to_remove,
        stats.unchanged
    );

    let mut ambiguities = desired_kinds.ambiguities;
    let seen: BTreeSet<Term> = ambiguities.iter().map(|a| a.subject.clone()).collect();
    ambiguities.extend(
        current_kinds
            .ambiguities
            .into_iter()
            .filter(|a| !seen.contains(&a.subject)),
    );

    DiffPlan {
        operations,
        stats,
        ambiguities,
        untyped: desired_kinds.untyped,
    }
}
