use crate::catalog::TaggedItem;
use crate::closure::resolve_closure;
use crate::config::ChangeDetection;
use crate::error::CatalogError;
use crate::group::TagSet;
use crate::index::ResourceIndex;

/// Result of patching one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Whether the new tags were applied to the item
    pub changed: bool,
    /// Tags applied before the patch
    pub previous: TagSet,
    /// Computed tags (applied only when `changed`)
    pub tags: TagSet,
}

/// Combines baseline, direct membership and closure into an item's tags
pub struct Patcher<'a> {
    index: &'a ResourceIndex,
    detection: ChangeDetection,
}

impl<'a> Patcher<'a> {
    pub fn new(index: &'a ResourceIndex, detection: ChangeDetection) -> Self {
        Self { index, detection }
    }

    /// Final tags for an item: closure of `baseline ∪ direct tags`
    pub fn compute_tags(&self, item_id: &str, baseline: &TagSet) -> TagSet {
        let mut seed = baseline.clone();
        if let Some(direct) = self.index.direct_tags(item_id) {
            seed.extend(direct.iter().cloned());
        }
        resolve_closure(&seed, self.index)
    }

    /// Recompute the item's tags from `baseline` and apply them if they
    /// count as changed. An empty result is written as "no tags".
    pub fn patch<I: TaggedItem>(
        &self,
        item: &mut I,
        baseline: &TagSet,
    ) -> Result<PatchOutcome, CatalogError> {
        let tags = self.compute_tags(item.id(), baseline);
        let previous = item.tags().cloned().unwrap_or_default();

        let changed = match self.detection {
            ChangeDetection::SizeOnly => previous.len() != tags.len(),
            ChangeDetection::Membership => previous != tags,
        };

        if changed {
            let applied = if tags.is_empty() {
                None
            } else {
                Some(tags.clone())
            };
            item.set_tags(applied)?;
        }

        Ok(PatchOutcome {
            changed,
            previous,
            tags,
        })
    }
}
