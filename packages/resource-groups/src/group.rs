//! Group definitions
//!
//! A group grants its canonical resource type to every member it lists.
//! Members are either concrete items or other resource types, so groups
//! chain: an item inside `Wood` also ends up with every type whose group
//! lists `Wood` as a member.
//!
//! Groups keep the asset JSON layout so hosts can decode them straight from
//! their definition files:
//!
//! ```json
//! { "Id": "Fuel",
//!   "ResourceType": { "Id": "Fuel", "Quantity": 1 },
//!   "Resources": [ { "ItemId": "log" }, { "ResourceTypeId": "Wood" } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroU32;

/// Group identifier (asset key)
pub type GroupId = String;

/// Set of resource type ids carried by an item
pub type TagSet = BTreeSet<String>;

/// Resource type declared as a group's canonical grant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceType {
    #[serde(rename = "Id")]
    pub id: String,

    /// Cosmetic for propagation; only the id takes part in closures.
    /// Zero is rejected at decode time.
    #[serde(rename = "Quantity", default = "default_quantity")]
    pub quantity: NonZeroU32,
}

fn default_quantity() -> NonZeroU32 {
    NonZeroU32::MIN
}

impl ResourceType {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            quantity: default_quantity(),
        }
    }

    pub fn with_quantity(id: impl Into<String>, quantity: NonZeroU32) -> Self {
        Self {
            id: id.into(),
            quantity,
        }
    }
}

/// One member entry of a group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawResourceRef", into = "RawResourceRef")]
pub enum ResourceRef {
    /// Concrete item id
    Item(String),
    /// Another resource type id
    ResourceType(String),
    /// Entry with neither id set; skipped with a warning at index build
    Malformed,
}

impl ResourceRef {
    pub fn item(id: impl Into<String>) -> Self {
        Self::Item(id.into())
    }

    pub fn resource_type(id: impl Into<String>) -> Self {
        Self::ResourceType(id.into())
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed)
    }
}

/// Wire shape of a member entry: two optional keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawResourceRef {
    #[serde(rename = "ItemId", default, skip_serializing_if = "Option::is_none")]
    item_id: Option<String>,

    #[serde(
        rename = "ResourceTypeId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    resource_type_id: Option<String>,
}

impl From<RawResourceRef> for ResourceRef {
    fn from(raw: RawResourceRef) -> Self {
        // Item id is checked first when both are present.
        match (raw.item_id, raw.resource_type_id) {
            (Some(item_id), _) => ResourceRef::Item(item_id),
            (None, Some(type_id)) => ResourceRef::ResourceType(type_id),
            (None, None) => ResourceRef::Malformed,
        }
    }
}

impl From<ResourceRef> for RawResourceRef {
    fn from(r: ResourceRef) -> Self {
        match r {
            ResourceRef::Item(id) => RawResourceRef {
                item_id: Some(id),
                resource_type_id: None,
            },
            ResourceRef::ResourceType(id) => RawResourceRef {
                item_id: None,
                resource_type_id: Some(id),
            },
            ResourceRef::Malformed => RawResourceRef::default(),
        }
    }
}

/// Declarative group definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "Id")]
    pub id: GroupId,

    /// Canonical resource type this group grants
    #[serde(rename = "ResourceType")]
    pub canonical: ResourceType,

    #[serde(rename = "Resources", default)]
    pub members: Vec<ResourceRef>,
}

impl Group {
    pub fn new(
        id: impl Into<GroupId>,
        canonical: ResourceType,
        members: Vec<ResourceRef>,
    ) -> Self {
        Self {
            id: id.into(),
            canonical,
            members,
        }
    }

    pub fn canonical_id(&self) -> &str {
        &self.canonical.id
    }

    /// Decode a group from its JSON definition
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
