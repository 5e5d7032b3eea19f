//! Configuration schema types for `atlasdef.toml`
//!
//! Every section is optional; an empty file yields the defaults.

use crate::grouping::FrameOrder;
use crate::page::Strictness;
use crate::registry::{CacheOptions, FailurePolicy, DEFAULT_ATLAS_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Atlas identity section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasSection {
    /// Store id the CLI loads pages into
    #[serde(default = "default_atlas_id")]
    pub id: String,
    /// Directory relative metadata and image paths are resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

fn default_atlas_id() -> String {
    DEFAULT_ATLAS_ID.to_string()
}

impl Default for AtlasSection {
    fn default() -> Self {
        Self {
            id: default_atlas_id(),
            root: None,
        }
    }
}

/// Page cache behavior
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Definition handling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionsSection {
    #[serde(default)]
    pub strictness: Strictness,
}

/// Frame grouping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingSection {
    #[serde(default)]
    pub order: FrameOrder,
}

/// Root configuration structure for `atlasdef.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtlasdefConfig {
    #[serde(default)]
    pub atlas: AtlasSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub definitions: DefinitionsSection,
    #[serde(default)]
    pub grouping: GroupingSection,
    /// Animation definitions applied when a page is built
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub animations: BTreeMap<String, String>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "animations.walk")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "atlasdef.toml: '{}' {}", self.field, self.message)
    }
}

impl AtlasdefConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.atlas.id.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "atlas.id".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        for (name, definition) in &self.animations {
            if name.is_empty() {
                errors.push(ConfigValidationError {
                    field: "animations".to_string(),
                    message: "animation names must be non-empty".to_string(),
                });
            }
            if definition.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("animations.{}", name),
                    message: "must be a non-empty definition".to_string(),
                });
            }
        }

        errors
    }

    /// Page cache options described by this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            failure_policy: self.cache.failure_policy,
            frame_order: self.grouping.order,
            strictness: self.definitions.strictness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AtlasdefConfig = toml::from_str("").unwrap();
        assert_eq!(config, AtlasdefConfig::default());
        assert_eq!(config.atlas.id, DEFAULT_ATLAS_ID);
        assert_eq!(config.cache_options(), CacheOptions::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[atlas]
id = "characters"
root = "assets"

[cache]
failure_policy = "evict"

[definitions]
strictness = "strict"

[grouping]
order = "numeric"

[animations]
heroWalk = "0-3(2)"
heroIdle = "0"
"#;
        let config: AtlasdefConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.atlas.id, "characters");
        assert_eq!(config.atlas.root, Some(PathBuf::from("assets")));
        assert_eq!(config.animations.len(), 2);

        let options = config.cache_options();
        assert_eq!(options.failure_policy, FailurePolicy::Evict);
        assert_eq!(options.strictness, Strictness::Strict);
        assert_eq!(options.frame_order, FrameOrder::Numeric);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result: Result<AtlasdefConfig, _> = toml::from_str("[cache]\nfailure_policy = \"retry\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_fields() {
        let mut config = AtlasdefConfig::default();
        config.atlas.id = " ".to_string();
        config.animations.insert("walk".to_string(), "".to_string());
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "atlas.id");
        assert_eq!(errors[1].field, "animations.walk");
        assert!(errors[1].to_string().starts_with("atlasdef.toml: 'animations.walk'"));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut config = AtlasdefConfig::default();
        config.grouping.order = FrameOrder::Numeric;
        config.animations.insert("run".to_string(), "0-4".to_string());
        let text = toml::to_string(&config).unwrap();
        let parsed: AtlasdefConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
