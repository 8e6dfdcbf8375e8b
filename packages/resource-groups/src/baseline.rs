use crate::group::TagSet;
use std::collections::HashMap;

/// How a baseline lookup treats an existing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Keep the stored baseline; capture only on first observation
    KeepExisting,
    /// Re-capture from the item's current tags (item was (re)loaded)
    Reset,
}

/// Tags each item carried when this system first observed it.
///
/// Every repatch starts from here, so derived tags never stack onto a
/// previous patch result.
#[derive(Debug, Default)]
pub struct BaselineCache {
    baselines: HashMap<String, TagSet>,
}

impl BaselineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the baseline for `item_id`, capturing `current` when the item
    /// is unseen or `mode` is [`CaptureMode::Reset`].
    pub fn get_or_capture(
        &mut self,
        item_id: &str,
        current: &TagSet,
        mode: CaptureMode,
    ) -> &TagSet {
        if mode == CaptureMode::Reset {
            self.baselines.remove(item_id);
        }
        self.baselines
            .entry(item_id.to_string())
            .or_insert_with(|| current.clone())
    }

    pub fn get(&self, item_id: &str) -> Option<&TagSet> {
        self.baselines.get(item_id)
    }

    /// Drop the baseline of an item removed from the catalog
    pub fn forget(&mut self, item_id: &str) -> Option<TagSet> {
        self.baselines.remove(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.baselines.contains_key(item_id)
    }

    pub fn clear(&mut self) {
        self.baselines.clear();
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
