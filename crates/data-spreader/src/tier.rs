//! Named tier resolution.
//!
//! Pipelines and CLI flags refer to storage tiers by name (`source`,
//! `internal`, `public`, ...). The registry resolves those names against the
//! configured tier table and opens the backing store, so a typo surfaces as
//! one clear error listing what is actually configured.

use crate::config::{Config, TierConfig};
use crate::error::{Result, SpreadError};
use crate::store::StoreImpl;
use std::collections::BTreeMap;

/// Resolves tier names to their configuration and opens stores for them.
#[derive(Debug, Clone)]
pub struct TierRegistry {
    tiers: BTreeMap<String, TierConfig>,
}

impl TierRegistry {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            tiers: config.tiers.clone(),
        }
    }

    /// Look up a tier by name.
    pub fn resolve(&self, name: &str) -> Result<&TierConfig> {
        self.tiers.get(name).ok_or_else(|| SpreadError::TierResolve {
            name: name.to_string(),
            known: self.names().join(", "),
        })
    }

    /// Resolve a tier and open its backing store.
    pub fn open(&self, name: &str) -> Result<StoreImpl> {
        let tier = self.resolve(name)?;
        StoreImpl::open(name, tier)
    }

    /// Configured tier names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tiers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierKind;
    use crate::store::DatasetStore;

    fn registry() -> TierRegistry {
        let yaml = r#"
tiers:
  source:
    kind: memory
  public:
    kind: memory
datasets:
  - name: trails
    table: TRAILS
    fields:
      - from: NAME
        to: name
"#;
        TierRegistry::new(&Config::from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_resolve_known_tier() {
        let registry = registry();
        let tier = registry.resolve("source").unwrap();
        assert_eq!(tier.kind, TierKind::Memory);
    }

    #[test]
    fn test_resolve_unknown_tier_lists_configured() {
        let registry = registry();
        let err = registry.resolve("staging").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown tier 'staging'"));
        assert!(msg.contains("public, source"));
    }

    #[test]
    fn test_open_memory_tier() {
        let registry = registry();
        let store = registry.open("source").unwrap();
        assert!(!store.table_exists("trails").unwrap());
    }

    #[test]
    fn test_names_sorted() {
        assert_eq!(registry().names(), vec!["public", "source"]);
    }
}
