//! Drives index rebuilds and item patching
//!
//! Two triggers:
//! - groups added/removed: rebuild both indices, repatch every catalog item
//!   from its stored baseline, write changed items back
//! - items (re)loaded: re-baseline those items and patch them against the
//!   current indices, no rebuild
//!
//! A write-back can make the host catalog re-announce the written items as
//! loaded. Those announcements are routed through the item-load handler with
//! [`OrchestratorMode::SelfPatching`] and ignored; handling them as real
//! loads would re-baseline from already patched tags.
//!
//! Not internally synchronized. Hosts that dispatch events from several
//! threads must serialize calls into one orchestrator (a mutex or a single
//! actor task), so a rebuild never interleaves with an item-load patch.

use crate::baseline::{BaselineCache, CaptureMode};
use crate::catalog::{ChangedItem, ItemCatalog, ItemsChangedHook, NoopHook, TaggedItem};
use crate::config::PropagationConfig;
use crate::error::{ResourceGroupError, Result};
use crate::group::{Group, TagSet};
use crate::index::{IndexBuilder, ResourceIndex};
use crate::patcher::Patcher;
use crate::registry::GroupRegistry;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorMode {
    Idle,
    Rebuilding,
    /// Writing patched items back to the catalog
    SelfPatching,
}

impl OrchestratorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorMode::Idle => "idle",
            OrchestratorMode::Rebuilding => "rebuilding",
            OrchestratorMode::SelfPatching => "self_patching",
        }
    }

    pub fn can_transition_to(&self, to: OrchestratorMode) -> bool {
        use OrchestratorMode::*;
        matches!(
            (*self, to),
            (Idle, Rebuilding)
                | (Rebuilding, SelfPatching)
                | (Rebuilding, Idle)
                | (SelfPatching, Idle)
        )
    }
}

impl std::fmt::Display for OrchestratorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of one patch pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    /// Items whose applied tags changed
    pub changed_items: Vec<ChangedItem>,
    pub items_examined: usize,
    /// Groups loaded when the pass ran
    pub groups_loaded: usize,
    /// Load announcements ignored as echoes of our own write-back
    pub suppressed_echoes: usize,
    pub elapsed_ms: f64,
}

impl PatchReport {
    pub fn changed_ids(&self) -> Vec<&str> {
        self.changed_items.iter().map(|c| c.item_id.as_str()).collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed_items.is_empty()
    }
}

/// Resource group propagation service
pub struct ResourceGroupOrchestrator {
    registry: GroupRegistry,
    index: ResourceIndex,
    baselines: BaselineCache,
    config: PropagationConfig,
    hook: Box<dyn ItemsChangedHook>,
    mode: OrchestratorMode,
}

impl ResourceGroupOrchestrator {
    pub fn new(config: PropagationConfig) -> Self {
        Self::with_hook(config, Box::new(NoopHook))
    }

    pub fn with_hook(config: PropagationConfig, hook: Box<dyn ItemsChangedHook>) -> Self {
        Self {
            registry: GroupRegistry::new(),
            index: ResourceIndex::new(),
            baselines: BaselineCache::new(),
            config,
            hook,
            mode: OrchestratorMode::Idle,
        }
    }

    pub fn mode(&self) -> OrchestratorMode {
        self.mode
    }

    pub fn index(&self) -> &ResourceIndex {
        &self.index
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn baselines(&self) -> &BaselineCache {
        &self.baselines
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// Apply a batch of group adds/removes, then rebuild and repatch
    /// everything. Removing an unknown group id is a no-op.
    pub fn on_groups_changed<C, S>(
        &mut self,
        catalog: &mut C,
        adds: Vec<Group>,
        removes: &[S],
    ) -> Result<PatchReport>
    where
        C: ItemCatalog,
        S: AsRef<str>,
    {
        for group in adds {
            self.registry.upsert(group);
        }
        for id in removes {
            self.registry.remove(id.as_ref());
        }
        self.rebuild(catalog)
    }

    /// Rebuild both indices from the registry and repatch every item from
    /// its baseline.
    pub fn rebuild<C: ItemCatalog>(&mut self, catalog: &mut C) -> Result<PatchReport> {
        self.transition(OrchestratorMode::Rebuilding)?;
        let result = self.run_rebuild(catalog);
        // Back to idle even when the pass aborted.
        self.mode = OrchestratorMode::Idle;
        result
    }

    /// Handle items newly (re)loaded into the catalog.
    ///
    /// Their baselines are re-captured from the current tags, since the host
    /// may have redefined them. Unknown ids are skipped.
    pub fn on_items_loaded<C, S>(&mut self, catalog: &mut C, item_ids: &[S]) -> Result<PatchReport>
    where
        C: ItemCatalog,
        S: AsRef<str>,
    {
        let mode = self.mode;
        self.items_loaded(catalog, item_ids, mode)
    }

    /// Forget baselines of items deleted from the catalog
    pub fn on_items_removed<S: AsRef<str>>(&mut self, item_ids: &[S]) {
        for id in item_ids {
            self.baselines.forget(id.as_ref());
        }
    }

    /// Drop all groups, indices and baselines
    pub fn reset(&mut self) {
        self.registry.clear();
        self.registry.mark_fresh();
        self.index.clear();
        self.baselines.clear();
        self.mode = OrchestratorMode::Idle;
    }

    fn transition(&mut self, to: OrchestratorMode) -> Result<()> {
        if !self.mode.can_transition_to(to) {
            return Err(ResourceGroupError::InvalidStateTransition {
                from: self.mode.to_string(),
                to: to.to_string(),
            });
        }
        self.mode = to;
        Ok(())
    }

    fn run_rebuild<C: ItemCatalog>(&mut self, catalog: &mut C) -> Result<PatchReport> {
        let start = Instant::now();

        if self.registry.is_stale() {
            self.index = IndexBuilder::build(self.registry.all());
            self.registry.mark_fresh();
        } else {
            debug!("Groups unchanged since last build, reusing indices");
        }

        let item_ids = catalog.item_ids();
        let changed = self.patch_items(catalog, item_ids.as_slice(), CaptureMode::KeepExisting)?;

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Patching took {:.2} ms ({} groups, {} items, {} changed)",
            elapsed_ms,
            self.registry.len(),
            item_ids.len(),
            changed.len()
        );

        let mut report = PatchReport {
            changed_items: changed,
            items_examined: item_ids.len(),
            groups_loaded: self.registry.len(),
            suppressed_echoes: 0,
            elapsed_ms,
        };

        if report.has_changes() {
            self.transition(OrchestratorMode::SelfPatching)?;
            let written: Vec<String> = report
                .changed_items
                .iter()
                .map(|c| c.item_id.clone())
                .collect();
            let echoes = catalog.write_back(&written)?;
            let echo_report =
                self.items_loaded(catalog, echoes.as_slice(), OrchestratorMode::SelfPatching)?;
            report.suppressed_echoes = echo_report.suppressed_echoes;
            self.transition(OrchestratorMode::Idle)?;

            self.hook.on_items_changed(&report.changed_items);
        }

        Ok(report)
    }

    fn items_loaded<C, S>(
        &mut self,
        catalog: &mut C,
        item_ids: &[S],
        mode: OrchestratorMode,
    ) -> Result<PatchReport>
    where
        C: ItemCatalog,
        S: AsRef<str>,
    {
        if mode == OrchestratorMode::SelfPatching {
            if !item_ids.is_empty() {
                debug!("Ignoring {} item load(s) caused by write-back", item_ids.len());
            }
            return Ok(PatchReport {
                suppressed_echoes: item_ids.len(),
                groups_loaded: self.registry.len(),
                ..PatchReport::default()
            });
        }

        let start = Instant::now();
        let changed = self.patch_items(catalog, item_ids, CaptureMode::Reset)?;

        let report = PatchReport {
            changed_items: changed,
            items_examined: item_ids.len(),
            groups_loaded: self.registry.len(),
            suppressed_echoes: 0,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        if report.has_changes() {
            self.hook.on_items_changed(&report.changed_items);
        }

        Ok(report)
    }

    /// Patch the given items against the current indices.
    ///
    /// On the first catalog write failure, items already patched in this
    /// pass get their previous tags back, so the next pass still sees them
    /// as changed.
    fn patch_items<C, S>(
        &mut self,
        catalog: &mut C,
        item_ids: &[S],
        capture: CaptureMode,
    ) -> Result<Vec<ChangedItem>>
    where
        C: ItemCatalog,
        S: AsRef<str>,
    {
        let patcher = Patcher::new(&self.index, self.config.change_detection);
        let mut changed = Vec::new();

        for id in item_ids {
            let id = id.as_ref();
            let Some(item) = catalog.get_mut(id) else {
                debug!("Skipping unknown item {}", id);
                continue;
            };

            let current = item.tags().cloned().unwrap_or_default();
            let baseline = self.baselines.get_or_capture(id, &current, capture);
            let outcome = match patcher.patch(item, baseline) {
                Ok(outcome) => outcome,
                Err(err) => {
                    rollback(catalog, &changed);
                    return Err(err.into());
                }
            };

            if outcome.changed {
                if self.config.log_item_diffs {
                    debug!(
                        "Patching item {} with resource types: {}",
                        id,
                        join_tags(&outcome.tags)
                    );
                }
                changed.push(ChangedItem {
                    item_id: id.to_string(),
                    previous: outcome.previous,
                    tags: outcome.tags,
                });
            }
        }

        Ok(changed)
    }
}

/// Restore the pre-pass tags of `changed`, newest first
fn rollback<C: ItemCatalog>(catalog: &mut C, changed: &[ChangedItem]) {
    for change in changed.iter().rev() {
        let Some(item) = catalog.get_mut(&change.item_id) else {
            continue;
        };
        let previous = if change.previous.is_empty() {
            None
        } else {
            Some(change.previous.clone())
        };
        if let Err(err) = item.set_tags(previous) {
            warn!("Failed to restore tags of {}: {}", change.item_id, err);
        }
    }
    if !changed.is_empty() {
        debug!("Rolled back {} item(s) after failed pass", changed.len());
    }
}

fn join_tags(tags: &TagSet) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, InMemoryCatalog};
    use crate::group::{ResourceRef, ResourceType};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tags(ids: &[&str]) -> TagSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn wood() -> Group {
        Group::new("Wood", ResourceType::new("Wood"), vec![ResourceRef::item("log")])
    }

    fn fuel() -> Group {
        Group::new(
            "Fuel",
            ResourceType::new("Fuel"),
            vec![ResourceRef::resource_type("Wood")],
        )
    }

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert(CatalogItem::untagged("log"));
        catalog.insert(CatalogItem::new("stone", ["C"]));
        catalog
    }

    #[test]
    fn test_mode_transitions() {
        use OrchestratorMode::*;
        assert!(Idle.can_transition_to(Rebuilding));
        assert!(Rebuilding.can_transition_to(SelfPatching));
        assert!(SelfPatching.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(SelfPatching));
        assert!(!SelfPatching.can_transition_to(Rebuilding));
        assert!(!Rebuilding.can_transition_to(Rebuilding));
    }

    #[test]
    fn test_groups_changed_patches_and_writes_back() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = catalog();

        let report = orch
            .on_groups_changed(&mut catalog, vec![wood(), fuel()], &[] as &[&str])
            .unwrap();

        assert_eq!(report.changed_ids(), vec!["log"]);
        assert_eq!(report.items_examined, 2);
        assert_eq!(report.groups_loaded, 2);
        assert_eq!(catalog.tags_of("log"), tags(&["Wood", "Fuel"]));
        assert_eq!(catalog.tags_of("stone"), tags(&["C"]));
        assert_eq!(catalog.write_backs(), &[vec!["log".to_string()]]);
        assert_eq!(orch.mode(), OrchestratorMode::Idle);
    }

    #[test]
    fn test_write_back_echo_is_suppressed() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = InMemoryCatalog::announcing();
        catalog.insert(CatalogItem::untagged("log"));

        let report = orch
            .on_groups_changed(&mut catalog, vec![wood(), fuel()], &[] as &[&str])
            .unwrap();

        assert_eq!(report.suppressed_echoes, 1);
        // Baseline still reflects the declared (empty) tags, not the patch.
        assert_eq!(orch.baselines().get("log"), Some(&TagSet::new()));
    }

    #[test]
    fn test_catalog_failure_aborts_and_returns_idle() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = InMemoryCatalog::new();
        catalog.insert(CatalogItem::untagged("log").read_only());

        let err = orch
            .on_groups_changed(&mut catalog, vec![wood()], &[] as &[&str])
            .unwrap_err();

        assert!(err.is_catalog_failure());
        assert_eq!(orch.mode(), OrchestratorMode::Idle);
        // Indices were fully rebuilt before the failing write.
        assert_eq!(orch.index().direct_tags("log"), Some(&tags(&["Wood"])));
    }

    #[test]
    fn test_failed_pass_restores_earlier_items() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = InMemoryCatalog::new();
        catalog.insert(CatalogItem::new("a_log", ["Bark"]));
        catalog.insert(CatalogItem::untagged("z_log").read_only());
        let wood = Group::new(
            "Wood",
            ResourceType::new("Wood"),
            vec![ResourceRef::item("a_log"), ResourceRef::item("z_log")],
        );

        orch.on_groups_changed(&mut catalog, vec![wood], &[] as &[&str])
            .unwrap_err();

        assert_eq!(catalog.tags_of("a_log"), tags(&["Bark"]));
        assert!(catalog.write_backs().is_empty());
    }

    #[test]
    fn test_rebuild_clears_stale_registry() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = catalog();
        orch.on_groups_changed(&mut catalog, vec![wood()], &[] as &[&str])
            .unwrap();
        assert!(!orch.registry().is_stale());

        // No group change: indices are reused and nothing is repatched.
        let index_before = orch.index().clone();
        let report = orch.rebuild(&mut catalog).unwrap();
        assert_eq!(orch.index(), &index_before);
        assert!(!report.has_changes());
    }

    #[test]
    fn test_hook_receives_changed_items() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let hook = move |changed: &[ChangedItem]| {
            let mut sink = sink.borrow_mut();
            sink.extend(changed.iter().map(|c| c.item_id.clone()));
        };
        let mut orch =
            ResourceGroupOrchestrator::with_hook(PropagationConfig::default(), Box::new(hook));
        let mut catalog = catalog();

        orch.on_groups_changed(&mut catalog, vec![wood()], &[] as &[&str])
            .unwrap();

        assert_eq!(*seen.borrow(), vec!["log".to_string()]);
    }

    #[test]
    fn test_items_loaded_rebaselines() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = catalog();
        orch.on_groups_changed(&mut catalog, vec![wood(), fuel()], &[] as &[&str])
            .unwrap();

        // Host redefines the log with a declared tag and reloads it.
        catalog.insert(CatalogItem::new("log", ["Bark"]));
        let report = orch.on_items_loaded(&mut catalog, &["log"]).unwrap();

        assert_eq!(report.changed_ids(), vec!["log"]);
        assert_eq!(orch.baselines().get("log"), Some(&tags(&["Bark"])));
        assert_eq!(catalog.tags_of("log"), tags(&["Bark", "Wood", "Fuel"]));
        // Item loads do not write back.
        assert_eq!(catalog.write_backs().len(), 1);
    }

    #[test]
    fn test_items_loaded_unknown_id_skipped() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = catalog();

        let report = orch.on_items_loaded(&mut catalog, &["ghost"]).unwrap();
        assert!(!report.has_changes());
        assert!(!orch.baselines().contains("ghost"));
    }

    #[test]
    fn test_items_removed_forgets_baseline() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = catalog();
        orch.rebuild(&mut catalog).unwrap();
        assert!(orch.baselines().contains("log"));

        catalog.remove("log");
        orch.on_items_removed(&["log"]);

        assert!(!orch.baselines().contains("log"));
    }

    #[test]
    fn test_reset() {
        let mut orch = ResourceGroupOrchestrator::new(PropagationConfig::default());
        let mut catalog = catalog();
        orch.on_groups_changed(&mut catalog, vec![wood()], &[] as &[&str])
            .unwrap();

        orch.reset();

        assert!(orch.registry().is_empty());
        assert!(orch.index().is_empty());
        assert!(orch.baselines().is_empty());
        assert_eq!(orch.mode(), OrchestratorMode::Idle);
    }
}
