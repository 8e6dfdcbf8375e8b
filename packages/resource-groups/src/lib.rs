/*
 * Resource Groups - transitive resource-type tagging
 *
 * Augments catalog items with resource types derived from declarative
 * group definitions.
 *
 * Architecture:
 * - Group registry (loaded definitions, keyed by id)
 * - Reverse indices (type → parents, item → direct types)
 * - BFS closure over possibly cyclic group graphs
 * - Baseline cache (non-compounding repatch)
 * - Orchestrator (rebuild on group change, patch on item load)
 */

// Public modules
pub mod baseline;
pub mod catalog;
pub mod closure;
pub mod config;
pub mod error;
pub mod group;
pub mod index;
pub mod orchestrator;
pub mod patcher;
pub mod registry;
pub mod telemetry;

// Re-exports
pub use baseline::{BaselineCache, CaptureMode};
pub use catalog::{
    CatalogItem, ChangedItem, InMemoryCatalog, ItemCatalog, ItemsChangedHook, NoopHook,
    TaggedItem,
};
pub use closure::resolve_closure;
pub use config::{ChangeDetection, PropagationConfig};
pub use error::{CatalogError, ResourceGroupError, Result};
pub use group::{Group, GroupId, ResourceRef, ResourceType, TagSet};
pub use index::{IndexBuilder, ResourceIndex};
pub use orchestrator::{OrchestratorMode, PatchReport, ResourceGroupOrchestrator};
pub use patcher::{PatchOutcome, Patcher};
pub use registry::GroupRegistry;
pub use telemetry::init_tracing;
