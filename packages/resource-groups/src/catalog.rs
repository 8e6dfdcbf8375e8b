//! Seams to the host item catalog
//!
//! The core never reaches into item internals: it reads and writes tags
//! through [`TaggedItem`] and enumerates items through [`ItemCatalog`].
//! [`InMemoryCatalog`] is the reference host used by tests and embedders
//! without a catalog of their own.

use crate::error::CatalogError;
use crate::group::TagSet;
use std::collections::HashMap;

/// Tag surface of a catalog item
pub trait TaggedItem {
    fn id(&self) -> &str;

    /// Currently applied tags; `None` when the item carries no tags
    fn tags(&self) -> Option<&TagSet>;

    /// Overwrite the applied tags; `None` clears them
    fn set_tags(&mut self, tags: Option<TagSet>) -> Result<(), CatalogError>;
}

/// Host catalog of items
pub trait ItemCatalog {
    type Item: TaggedItem;

    /// Ids of every item currently known to the catalog
    fn item_ids(&self) -> Vec<String>;

    fn get(&self, item_id: &str) -> Option<&Self::Item>;

    fn get_mut(&mut self, item_id: &str) -> Option<&mut Self::Item>;

    /// Push patched items back into the catalog.
    ///
    /// Returns the item ids the catalog re-announced as loaded because of
    /// this write; the orchestrator treats them as echoes of its own patch.
    fn write_back(&mut self, item_ids: &[String]) -> Result<Vec<String>, CatalogError>;
}

/// One item whose applied tags changed during a patch pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedItem {
    pub item_id: String,
    pub previous: TagSet,
    pub tags: TagSet,
}

impl ChangedItem {
    /// Tags present now but not before
    pub fn added(&self) -> TagSet {
        self.tags.difference(&self.previous).cloned().collect()
    }

    /// Tags present before but not now
    pub fn removed(&self) -> TagSet {
        self.previous.difference(&self.tags).cloned().collect()
    }
}

/// Downstream reaction to changed items (e.g. recipe regeneration)
pub trait ItemsChangedHook {
    fn on_items_changed(&mut self, changed: &[ChangedItem]);
}

impl<F> ItemsChangedHook for F
where
    F: FnMut(&[ChangedItem]),
{
    fn on_items_changed(&mut self, changed: &[ChangedItem]) {
        self(changed)
    }
}

/// Hook that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl ItemsChangedHook for NoopHook {
    fn on_items_changed(&mut self, _changed: &[ChangedItem]) {}
}

/// Plain catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: String,
    pub tags: Option<TagSet>,
    /// Reject tag writes (simulates an incompatible host item)
    pub read_only: bool,
}

impl CatalogItem {
    pub fn new<I, S>(id: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: TagSet = tags.into_iter().map(Into::into).collect();
        Self {
            id: id.into(),
            tags: if tags.is_empty() { None } else { Some(tags) },
            read_only: false,
        }
    }

    pub fn untagged(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tags: None,
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl TaggedItem for CatalogItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> Option<&TagSet> {
        self.tags.as_ref()
    }

    fn set_tags(&mut self, tags: Option<TagSet>) -> Result<(), CatalogError> {
        if self.read_only {
            return Err(CatalogError::rejected(&self.id, "item is read-only"));
        }
        self.tags = tags;
        Ok(())
    }
}

/// In-memory catalog (interface-first host for testing)
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: HashMap<String, CatalogItem>,
    /// Re-announce written items as loaded, like an asset store reload
    announce_write_back: bool,
    write_backs: Vec<Vec<String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog whose write-back re-announces the written items
    pub fn announcing() -> Self {
        Self {
            announce_write_back: true,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, item: CatalogItem) -> Option<CatalogItem> {
        self.items.insert(item.id.clone(), item)
    }

    pub fn remove(&mut self, item_id: &str) -> Option<CatalogItem> {
        self.items.remove(item_id)
    }

    /// Applied tags of an item, empty when untagged or unknown
    pub fn tags_of(&self, item_id: &str) -> TagSet {
        self.items
            .get(item_id)
            .and_then(|item| item.tags.clone())
            .unwrap_or_default()
    }

    /// Batches passed to [`ItemCatalog::write_back`] so far
    pub fn write_backs(&self) -> &[Vec<String>] {
        &self.write_backs
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemCatalog for InMemoryCatalog {
    type Item = CatalogItem;

    fn item_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get(&self, item_id: &str) -> Option<&CatalogItem> {
        self.items.get(item_id)
    }

    fn get_mut(&mut self, item_id: &str) -> Option<&mut CatalogItem> {
        self.items.get_mut(item_id)
    }

    fn write_back(&mut self, item_ids: &[String]) -> Result<Vec<String>, CatalogError> {
        if let Some(missing) = item_ids.iter().find(|id| !self.items.contains_key(*id)) {
            return Err(CatalogError::UnknownItem(missing.clone()));
        }
        self.write_backs.push(item_ids.to_vec());

        if self.announce_write_back {
            Ok(item_ids.to_vec())
        } else {
            Ok(Vec::new())
        }
    }
}
