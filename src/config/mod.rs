//! Command-line and environment configuration.

pub mod duration;

use clap::Parser;
use identity_map::{MappingConfig, DEFAULT_DOMAIN, DEFAULT_TABLE};

/// Connection options for the three stores a sync touches.
#[derive(Parser, Clone, Debug)]
pub struct StoreOpts {
    /// Source database connection string
    #[arg(long, env = "SOURCE_DATABASE_URL")]
    pub source_uri: String,

    /// Target database connection string
    #[arg(long, env = "TARGET_DATABASE_URL")]
    pub target_uri: String,

    /// Identity mapping database connection string (defaults to the target database)
    #[arg(long, env = "MAPPINGS_DATABASE_URL")]
    pub mappings_uri: Option<String>,

    /// Domain tag the identity mappings are scoped to
    #[arg(long, default_value = DEFAULT_DOMAIN, env = "SYNC_DOMAIN")]
    pub domain: String,

    /// Identity mapping table name
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub mappings_table: String,
}

impl StoreOpts {
    pub fn mappings_uri(&self) -> &str {
        self.mappings_uri.as_deref().unwrap_or(&self.target_uri)
    }

    pub fn mapping_config(&self) -> MappingConfig {
        MappingConfig {
            domain: self.domain.clone(),
            table_name: self.mappings_table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        stores: StoreOpts,
    }

    #[test]
    fn test_defaults_and_mapping_fallback() {
        let cli = TestCli::parse_from([
            "test",
            "--source-uri",
            "postgres://source",
            "--target-uri",
            "postgres://target",
        ]);
        assert_eq!(cli.stores.mappings_uri(), "postgres://target");
        let config = cli.stores.mapping_config();
        assert_eq!(config.domain, "SalesDb");
        assert_eq!(config.table_name, "entity_mappings");
    }

    #[test]
    fn test_explicit_mappings_uri_and_domain() {
        let cli = TestCli::parse_from([
            "test",
            "--source-uri",
            "postgres://source",
            "--target-uri",
            "postgres://target",
            "--mappings-uri",
            "postgres://mappings",
            "--domain",
            "Billing",
        ]);
        assert_eq!(cli.stores.mappings_uri(), "postgres://mappings");
        assert_eq!(cli.stores.mapping_config().domain, "Billing");
    }
}
