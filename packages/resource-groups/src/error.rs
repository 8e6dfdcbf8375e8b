use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResourceGroupError>;

#[derive(Error, Debug)]
pub enum ResourceGroupError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResourceGroupError {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    /// Whether the error aborted a patch pass because the host catalog
    /// refused a write.
    pub fn is_catalog_failure(&self) -> bool {
        matches!(self, Self::Catalog(_))
    }
}

/// Failures reported by a host catalog when tags are written back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Item {item_id} rejected tag update: {reason}")]
    Rejected { item_id: String, reason: String },
}

impl CatalogError {
    pub fn rejected(item_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            item_id: item_id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_converts() {
        let err: ResourceGroupError = CatalogError::UnknownItem("log".to_string()).into();
        assert!(err.is_catalog_failure());
        assert_eq!(err.to_string(), "Catalog error: Unknown item: log");
    }

    #[test]
    fn test_rejected_message() {
        let err = CatalogError::rejected("log", "read-only");
        assert_eq!(err.to_string(), "Item log rejected tag update: read-only");
    }

    #[test]
    fn test_config_helper() {
        let err = ResourceGroupError::config("bad version");
        assert!(!err.is_catalog_failure());
        assert_eq!(err.to_string(), "Configuration error: bad version");
    }
}
