//! JSON configuration for loggers and their targets
//!
//! ```
//! use rust_log_dispatcher::config::{LoggerConfig, TargetRegistry};
//! use rust_log_dispatcher::{Level, Logger};
//!
//! let config = LoggerConfig::from_json(r#"{
//!     "max_level": "warning",
//!     "category": "billing",
//!     "targets": [{ "type": "memory", "label": "audit" }]
//! }"#).unwrap();
//!
//! let mut logger = Logger::new();
//! config.apply(&mut logger, &TargetRegistry::with_builtin()).unwrap();
//!
//! assert_eq!(logger.max_level(), Level::Warning);
//! assert_eq!(logger.category(), "billing");
//! assert_eq!(logger.target_count(), 1);
//! ```

use crate::core::{Level, Logger, LoggerError, Result, Target};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Logger settings; every key is optional and absent keys leave the logger as it is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Level name or ordinal (`0` = emergency … `7` = debug)
    pub max_level: Option<Level>,
    pub category: Option<String>,
    pub call_stack_depth: Option<usize>,
    pub buffer_size: Option<usize>,
    pub targets: Vec<TargetConfig>,
}

/// One target entry: a registered type name plus its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl LoggerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json(&json)
    }

    /// Configure a logger that has not been opened yet
    ///
    /// Targets are built before anything is changed, so an unknown type or a
    /// bad option leaves the logger untouched. Configured targets are appended
    /// after the ones the logger already has.
    pub fn apply(&self, logger: &mut Logger, registry: &TargetRegistry) -> Result<()> {
        if logger.is_open() {
            return Err(LoggerError::config(
                "Logger",
                "configuration must be applied before open",
            ));
        }

        let targets = self
            .targets
            .iter()
            .map(|target| registry.create(target))
            .collect::<Result<Vec<_>>>()?;

        if let Some(level) = self.max_level {
            logger.set_max_level(level);
        }
        if let Some(ref category) = self.category {
            logger.set_category(category.clone());
        }
        if let Some(depth) = self.call_stack_depth {
            logger.set_call_stack_depth(depth);
        }
        if let Some(size) = self.buffer_size {
            logger.set_buffer_size(size);
        }
        for target in targets {
            logger.add_boxed_target(target);
        }
        Ok(())
    }
}

type Factory = Box<dyn Fn(&Map<String, Value>) -> Result<Box<dyn Target>> + Send + Sync>;

/// Maps target type names to factories
///
/// A factory returns a default-configured target. The configured options are
/// laid over the factory's serialized value, so defaults chosen by the factory
/// survive unless the configuration names the same key.
#[derive(Default)]
pub struct TargetRegistry {
    factories: HashMap<String, Factory>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry knowing `memory` and every target compiled into the crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("memory", crate::targets::MemoryTarget::new);
        #[cfg(feature = "console")]
        registry.register("console", crate::targets::ConsoleTarget::new);
        #[cfg(feature = "file")]
        registry.register("file", crate::targets::FileTarget::default);
        #[cfg(feature = "network")]
        registry.register("network", crate::targets::NetworkTarget::default);
        registry
    }

    /// Register (or replace) the factory for `name`
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F)
    where
        T: Target + Serialize + DeserializeOwned,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name = name.into();
        let component = name.clone();
        let build = move |options: &Map<String, Value>| -> Result<Box<dyn Target>> {
            let mut value = serde_json::to_value(factory())
                .map_err(|e| LoggerError::config(component.as_str(), e.to_string()))?;
            merge(&mut value, Value::Object(options.clone()));
            let target: T = serde_json::from_value(value)
                .map_err(|e| LoggerError::config(component.as_str(), e.to_string()))?;
            Ok(Box::new(target))
        };
        self.factories.insert(name, Box::new(build));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(&self, config: &TargetConfig) -> Result<Box<dyn Target>> {
        let factory = self
            .factories
            .get(&config.kind)
            .ok_or_else(|| LoggerError::unknown_target(config.kind.as_str()))?;
        factory(&config.options)
    }
}

impl fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("TargetRegistry").field("types", &names).finish()
    }
}

/// Deep-merge `overlay` into `base`; objects merge key by key, anything else replaces
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::MemoryTarget;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_untouched_keys() {
        let mut base = json!({ "a": 1, "nested": { "x": true, "y": "keep" } });
        merge(&mut base, json!({ "b": 2, "nested": { "x": false } }));
        assert_eq!(base, json!({ "a": 1, "b": 2, "nested": { "x": false, "y": "keep" } }));
    }

    #[test]
    fn test_max_level_accepts_ordinal_or_name() {
        let config = LoggerConfig::from_json(r#"{ "max_level": 2 }"#).unwrap();
        assert_eq!(config.max_level, Some(Level::Critical));

        let config = LoggerConfig::from_json(r#"{ "max_level": "Notice" }"#).unwrap();
        assert_eq!(config.max_level, Some(Level::Notice));

        assert!(LoggerConfig::from_json(r#"{ "max_level": 12 }"#).is_err());
    }

    #[test]
    fn test_target_options_are_flattened() {
        let config = LoggerConfig::from_json(
            r#"{ "targets": [{ "type": "memory", "label": "abc", "capacity": 3 }] }"#,
        )
        .unwrap();
        assert_eq!(config.targets[0].kind, "memory");
        assert_eq!(config.targets[0].options["label"], "abc");
    }

    #[test]
    fn test_factory_defaults_survive_overlay() {
        let mut registry = TargetRegistry::new();
        registry.register("bounded", || MemoryTarget::new().with_capacity(16));

        let target = registry
            .create(&TargetConfig {
                kind: "bounded".to_string(),
                options: json!({ "label": "xyz" }).as_object().cloned().unwrap(),
            })
            .unwrap();

        let memory = target.downcast_ref::<MemoryTarget>().unwrap();
        assert_eq!(memory.label, "xyz");
        assert_eq!(memory.capacity, Some(16));
    }

    #[test]
    fn test_unknown_type_leaves_logger_untouched() {
        let config = LoggerConfig::from_json(
            r#"{ "category": "changed", "targets": [{ "type": "memory" }, { "type": "syslog" }] }"#,
        )
        .unwrap();

        let mut logger = Logger::new();
        let err = config
            .apply(&mut logger, &TargetRegistry::with_builtin())
            .unwrap_err();

        assert!(matches!(err, LoggerError::UnknownTargetType { ref name } if name == "syslog"));
        assert_eq!(logger.category(), "app");
        assert_eq!(logger.target_count(), 0);
    }

    #[test]
    fn test_bad_option_type_is_config_error() {
        let registry = TargetRegistry::with_builtin();
        let err = registry
            .create(&TargetConfig {
                kind: "memory".to_string(),
                options: json!({ "capacity": "lots" }).as_object().cloned().unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_apply_rejects_open_logger() {
        let mut logger = Logger::new();
        logger.open().unwrap();
        let err = LoggerConfig::default()
            .apply(&mut logger, &TargetRegistry::new())
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        logger.close();
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logger.json");
        std::fs::write(&path, r#"{ "buffer_size": 64, "call_stack_depth": 2 }"#).unwrap();

        let config = LoggerConfig::from_file(&path).unwrap();
        assert_eq!(config.buffer_size, Some(64));
        assert_eq!(config.call_stack_depth, Some(2));

        assert!(LoggerConfig::from_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_builtin_names() {
        let registry = TargetRegistry::with_builtin();
        assert!(registry.contains("memory"));
        #[cfg(feature = "file")]
        assert!(registry.contains("file"));
        assert!(!registry.contains("syslog"));
    }
}
