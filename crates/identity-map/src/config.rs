//! Identity mapping configuration.

/// Default domain tag.
pub const DEFAULT_DOMAIN: &str = "SalesDb";

/// Default mapping table name.
pub const DEFAULT_TABLE: &str = "entity_mappings";

/// Configuration for a mapping store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    /// Synchronization boundary the mappings belong to.
    ///
    /// Several domains can share one mapping table without collisions.
    pub domain: String,

    /// Table holding the mapping rows.
    pub table_name: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            table_name: DEFAULT_TABLE.to_string(),
        }
    }
}

impl MappingConfig {
    /// Create a config for the given domain using the default table.
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }
}
