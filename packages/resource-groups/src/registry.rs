use crate::group::{Group, GroupId};
use std::collections::HashMap;

/// Currently loaded group definitions, keyed by group id.
///
/// Mutations only mark the registry stale; rebuilding the indices is the
/// orchestrator's job once a whole batch of adds/removes is applied.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupId, Group>,
    stale: bool,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a group. Returns the previous definition, if any.
    pub fn upsert(&mut self, group: Group) -> Option<Group> {
        self.stale = true;
        self.groups.insert(group.id.clone(), group)
    }

    /// Remove a group by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Group> {
        let removed = self.groups.remove(id);
        if removed.is_some() {
            self.stale = true;
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Snapshot of every loaded group, ordered by id
    pub fn all(&self) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self.groups.values().collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether the registry changed since the last index build
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_fresh(&mut self) {
        self.stale = false;
    }

    pub fn clear(&mut self) {
        self.stale = !self.groups.is_empty();
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{ResourceRef, ResourceType};

    fn group(id: &str, canonical: &str) -> Group {
        Group::new(id, ResourceType::new(canonical), vec![ResourceRef::item("x")])
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut registry = GroupRegistry::new();
        assert!(registry.upsert(group("g1", "A")).is_none());
        let previous = registry.upsert(group("g1", "B")).unwrap();

        assert_eq!(previous.canonical_id(), "A");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("g1").unwrap().canonical_id(), "B");
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = GroupRegistry::new();
        assert!(registry.remove("missing").is_none());
        assert!(!registry.is_stale());
    }

    #[test]
    fn test_stale_tracking() {
        let mut registry = GroupRegistry::new();
        registry.upsert(group("g1", "A"));
        assert!(registry.is_stale());

        registry.mark_fresh();
        assert!(!registry.is_stale());

        registry.remove("g1");
        assert!(registry.is_stale());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_is_sorted_snapshot() {
        let mut registry = GroupRegistry::new();
        registry.upsert(group("b", "B"));
        registry.upsert(group("a", "A"));
        registry.upsert(group("c", "C"));

        let ids: Vec<&str> = registry.all().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
