//! Factory configuration.
//!
//! [`FactoryConfig`] holds the switches the container consults at runtime.
//! Values can be set in code, loaded from layered [`ConfigSource`]s through a
//! [`ConfigProvider`], or (with the `config` feature) parsed from JSON.

use std::env;

use parking_lot::RwLock;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::internal::FastMap;

/// Environment variable prefix used by [`FactoryConfig::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_BEANS";

const KEY_ALLOW_OVERRIDING: &str = "allow_overriding";
const KEY_ALLOW_CIRCULAR: &str = "allow_circular_references";
const KEY_MAX_DEPTH: &str = "max_creation_depth";

/// Error raised when a configuration value has the wrong shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid configuration value for '{key}': {message}")]
pub struct ConfigError {
    pub key: String,
    pub message: String,
}

/// A configuration value that can be various types
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(untagged))]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl ConfigValue {
    /// Parses raw text the way environment variables are read.
    pub fn parse(raw: &str) -> Self {
        if let Ok(int_val) = raw.parse::<i64>() {
            ConfigValue::Integer(int_val)
        } else if let Ok(float_val) = raw.parse::<f64>() {
            ConfigValue::Float(float_val)
        } else if let Ok(bool_val) = raw.parse::<bool>() {
            ConfigValue::Boolean(bool_val)
        } else {
            ConfigValue::String(raw.to_string())
        }
    }

    /// Try to convert to boolean. `"yes"`/`"no"`, `"on"`/`"off"` and `1`/`0` are accepted too.
    pub fn as_bool(&self, key: &str) -> Result<bool, ConfigError> {
        match self {
            ConfigValue::Boolean(b) => Ok(*b),
            ConfigValue::Integer(1) => Ok(true),
            ConfigValue::Integer(0) => Ok(false),
            ConfigValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "on" => Ok(true),
                "no" | "off" => Ok(false),
                _ => Err(ConfigError {
                    key: key.to_string(),
                    message: format!("'{}' is not a boolean", s),
                }),
            },
            other => Err(ConfigError {
                key: key.to_string(),
                message: format!("{:?} is not a boolean", other),
            }),
        }
    }

    /// Try to convert to a non-negative size.
    pub fn as_usize(&self, key: &str) -> Result<usize, ConfigError> {
        match self {
            ConfigValue::Integer(i) if *i >= 0 => Ok(*i as usize),
            other => Err(ConfigError {
                key: key.to_string(),
                message: format!("{:?} is not a non-negative integer", other),
            }),
        }
    }
}

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Get a configuration value by key
    fn get(&self, key: &str) -> Option<ConfigValue>;
}

/// Environment variable configuration source
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        let env_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        };
        env::var(&env_key).ok().map(|value| ConfigValue::parse(&value))
    }
}

/// In-memory source, handy for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MapConfigSource {
    values: FastMap<String, ConfigValue>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }
}

/// Layered configuration lookup; earlier sources win.
#[derive(Debug, Default)]
pub struct ConfigProvider {
    sources: Vec<Box<dyn ConfigSource>>,
    cache: RwLock<FastMap<String, ConfigValue>>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source (higher priority sources should be added first)
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
    }

    /// Get a configuration value, checking sources in priority order
    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        if let Some(value) = self.cache.read().get(key) {
            return Some(value.clone());
        }
        let found = self.sources.iter().find_map(|source| source.get(key))?;
        self.cache.write().insert(key.to_string(), found.clone());
        Some(found)
    }

    /// Clear the configuration cache (forces reload from sources)
    pub fn invalidate_cache(&self) {
        self.cache.write().clear();
    }
}

/// Runtime switches for a [`BeanFactory`](crate::BeanFactory).
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanFactory, FactoryConfig};
///
/// let config = FactoryConfig::new()
///     .with_bean_definition_overriding(false)
///     .with_max_creation_depth(64);
/// let factory = BeanFactory::with_config(config);
/// assert!(!factory.config().allow_bean_definition_overriding);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct FactoryConfig {
    /// Whether registering a second definition under an existing name replaces it.
    pub allow_bean_definition_overriding: bool,
    /// Whether singletons are exposed early so property-level cycles resolve.
    pub allow_circular_references: bool,
    /// Maximum nesting of bean creations on one thread.
    pub max_creation_depth: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            allow_bean_definition_overriding: true,
            allow_circular_references: true,
            max_creation_depth: 512,
        }
    }
}

impl FactoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bean_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_bean_definition_overriding = allow;
        self
    }

    pub fn with_circular_references(mut self, allow: bool) -> Self {
        self.allow_circular_references = allow;
        self
    }

    pub fn with_max_creation_depth(mut self, depth: usize) -> Self {
        self.max_creation_depth = depth;
        self
    }

    /// Load configuration from a config provider, falling back to defaults
    /// for missing keys.
    pub fn load(provider: &ConfigProvider) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = provider.get(KEY_ALLOW_OVERRIDING) {
            config.allow_bean_definition_overriding = value.as_bool(KEY_ALLOW_OVERRIDING)?;
        }
        if let Some(value) = provider.get(KEY_ALLOW_CIRCULAR) {
            config.allow_circular_references = value.as_bool(KEY_ALLOW_CIRCULAR)?;
        }
        if let Some(value) = provider.get(KEY_MAX_DEPTH) {
            config.max_creation_depth = value.as_usize(KEY_MAX_DEPTH)?;
        }
        Ok(config)
    }

    /// Reads `FERROUS_BEANS_ALLOW_OVERRIDING`,
    /// `FERROUS_BEANS_ALLOW_CIRCULAR_REFERENCES` and
    /// `FERROUS_BEANS_MAX_CREATION_DEPTH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut provider = ConfigProvider::new();
        provider.add_source(Box::new(EnvironmentConfigSource::with_prefix(ENV_PREFIX)));
        Self::load(&provider)
    }

    /// Parses a JSON document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
