//! Transitive tag closure
//!
//! Group graphs may be cyclic (A ⊆ B and B ⊆ A is legal), so expansion is a
//! BFS worklist gated by a seen set: each distinct resource type is expanded
//! at most once, whatever the number of paths leading to it.

use crate::group::TagSet;
use crate::index::ResourceIndex;
use std::collections::VecDeque;
use tracing::trace;

/// Compute the smallest tag set containing `seed` that is closed under the
/// index's "member of" edges.
///
/// Algorithm: O(T+E) where T = distinct types reached, E = edges among them
/// 1. Start with the seed tags
/// 2. BFS: for each tag, add every canonical type of groups listing it
/// 3. Stop when the worklist is empty
///
/// Example:
/// ```text
/// log ∈ Wood, Wood ∈ Fuel, Fuel ∈ Burnable
///
/// seed {Wood} → {Wood, Fuel, Burnable}
/// ```
pub fn resolve_closure(seed: &TagSet, index: &ResourceIndex) -> TagSet {
    let mut closed = seed.clone();
    let mut queue: VecDeque<&str> = seed.iter().map(String::as_str).collect();

    while let Some(current) = queue.pop_front() {
        let Some(parents) = index.parents_of(current) else {
            continue;
        };

        for parent in parents {
            if closed.insert(parent.clone()) {
                trace!("{} grants {}", current, parent);
                queue.push_back(parent.as_str());
            }
        }
    }

    closed
}
