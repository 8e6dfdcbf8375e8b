//! Reverse lookup indices derived from the loaded groups
//!
//! Two maps, both rebuilt from scratch on every group change:
//! - resource type → canonical types of the groups listing it (one hop)
//! - item id → canonical types of the groups listing it directly
//!
//! Nothing here is patched incrementally; a build is a pure function of the
//! registry snapshot.

use crate::group::{Group, ResourceRef, TagSet};
use std::collections::HashMap;
use tracing::warn;

/// Reverse indices over group membership
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIndex {
    /// member resource type → {canonical types that include it}
    resource_type_lookup: HashMap<String, TagSet>,
    /// item id → {canonical types it directly belongs to}
    item_id_lookup: HashMap<String, TagSet>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `member_type` is a member of a group granting `canonical`
    pub fn add_type_edge(&mut self, member_type: &str, canonical: &str) {
        self.resource_type_lookup
            .entry(member_type.to_string())
            .or_default()
            .insert(canonical.to_string());
    }

    /// Record that `item_id` is a direct member of a group granting `canonical`
    pub fn add_item_membership(&mut self, item_id: &str, canonical: &str) {
        self.item_id_lookup
            .entry(item_id.to_string())
            .or_default()
            .insert(canonical.to_string());
    }

    /// Canonical types one hop above `resource_type`
    pub fn parents_of(&self, resource_type: &str) -> Option<&TagSet> {
        self.resource_type_lookup.get(resource_type)
    }

    /// Tags an item gains directly from group membership
    pub fn direct_tags(&self, item_id: &str) -> Option<&TagSet> {
        self.item_id_lookup.get(item_id)
    }

    /// Clear all data (for rebuild)
    pub fn clear(&mut self) {
        self.resource_type_lookup.clear();
        self.item_id_lookup.clear();
    }

    /// Number of distinct keys across both indices
    pub fn len(&self) -> usize {
        self.resource_type_lookup.len() + self.item_id_lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_type_lookup.is_empty() && self.item_id_lookup.is_empty()
    }
}

/// Member ids of one group, split by kind
#[derive(Debug, Default)]
struct PartitionedMembers<'a> {
    item_ids: Vec<&'a str>,
    resource_type_ids: Vec<&'a str>,
    malformed: usize,
}

fn partition_members(group: &Group) -> PartitionedMembers<'_> {
    let mut parts = PartitionedMembers::default();
    for member in &group.members {
        match member {
            ResourceRef::Item(id) => parts.item_ids.push(id),
            ResourceRef::ResourceType(id) => parts.resource_type_ids.push(id),
            ResourceRef::Malformed => parts.malformed += 1,
        }
    }
    parts
}

/// Builds [`ResourceIndex`] from a registry snapshot
pub struct IndexBuilder;

impl IndexBuilder {
    /// Build both reverse indices from the given groups.
    ///
    /// Groups sharing a canonical type or member are unioned; enumeration
    /// order does not affect the result. Members with neither an item id nor
    /// a resource type id are logged and dropped.
    pub fn build<'a, I>(groups: I) -> ResourceIndex
    where
        I: IntoIterator<Item = &'a Group>,
    {
        let mut index = ResourceIndex::new();

        for group in groups {
            let canonical = group.canonical_id();
            let parts = partition_members(group);

            if parts.malformed > 0 {
                warn!(
                    "Group {} has {} resource(s) with neither itemId nor resourceTypeId set",
                    group.id, parts.malformed
                );
            }

            for item_id in parts.item_ids {
                index.add_item_membership(item_id, canonical);
            }
            for type_id in parts.resource_type_ids {
                index.add_type_edge(type_id, canonical);
            }
        }

        index
    }
}
