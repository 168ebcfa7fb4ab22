//! Named bean definitions, aliases and merged-definition caching.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::definition::{BeanDefinition, MergedBeanDefinition};
use crate::error::{BeansError, BeansResult};
use crate::internal::{new_map, FastMap};

#[derive(Default)]
struct RegistryState {
    definitions: FastMap<String, Arc<BeanDefinition>>,
    names: Vec<String>,
    aliases: FastMap<String, String>,
}

impl RegistryState {
    /// Follows the alias chain from `name`; unknown names map to themselves.
    /// The walk is bounded by the alias count, so it ends even on a cycle.
    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(current) {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }
}

/// Registry of bean definitions by name.
///
/// Names are unique and keep their registration order. Aliases map extra
/// names onto a registered name. Merged definitions are computed lazily,
/// cached, and the cache is cleared whenever a definition is registered.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanDefinition, BeanDefinitionRegistry, BeanScope};
///
/// let registry = BeanDefinitionRegistry::new(true);
/// registry
///     .register("parent", BeanDefinition::new("TestBean").prototype().abstract_definition())
///     .unwrap();
/// registry.register("child", BeanDefinition::child_of("parent")).unwrap();
/// registry.register_alias("child", "kid").unwrap();
///
/// let merged = registry.merged_definition("kid").unwrap();
/// assert_eq!(merged.class_name(), Some("TestBean"));
/// assert_eq!(merged.scope(), BeanScope::Prototype);
/// assert!(!merged.is_abstract());
/// ```
pub struct BeanDefinitionRegistry {
    state: RwLock<RegistryState>,
    merged: RwLock<FastMap<String, Arc<MergedBeanDefinition>>>,
    allow_overriding: bool,
}

impl std::fmt::Debug for BeanDefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("BeanDefinitionRegistry")
            .field("names", &state.names)
            .field("aliases", &state.aliases)
            .field("allow_overriding", &self.allow_overriding)
            .finish()
    }
}

impl BeanDefinitionRegistry {
    pub fn new(allow_overriding: bool) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            merged: RwLock::new(new_map()),
            allow_overriding,
        }
    }

    /// Registers `definition` under `name` after validating it.
    ///
    /// Re-registering a name replaces the old definition (keeping its
    /// position in the registration order) when overriding is allowed and
    /// fails otherwise.
    pub fn register(&self, name: &str, definition: BeanDefinition) -> BeansResult<()> {
        if name.is_empty() {
            return Err(BeansError::store(name, definition.resource(), "Bean name must not be empty"));
        }
        definition
            .validate()
            .map_err(|message| BeansError::store(name, definition.resource(), format!("Validation of bean definition failed: {}", message)))?;

        let mut state = self.state.write();
        if let Some(target) = state.aliases.get(name) {
            return Err(BeansError::store(
                name,
                definition.resource(),
                format!("Cannot register bean definition under name '{}': it is already an alias for bean '{}'", name, target),
            ));
        }
        let definition = Arc::new(definition);
        match state.definitions.get(name) {
            Some(_) if !self.allow_overriding => {
                return Err(BeansError::store(
                    name,
                    definition.resource(),
                    format!("Cannot register bean definition for bean '{}': there's already a definition bound", name),
                ));
            }
            Some(_) => {
                info!("Overriding bean definition for bean '{}'", name);
                state.definitions.insert(name.to_string(), definition);
            }
            None => {
                debug!("Registering bean definition '{}'", name);
                state.definitions.insert(name.to_string(), definition);
                state.names.push(name.to_string());
            }
        }
        drop(state);
        self.merged.write().clear();
        Ok(())
    }

    /// Adds `alias` as another name for `name`.
    pub fn register_alias(&self, name: &str, alias: &str) -> BeansResult<()> {
        if alias == name {
            return Ok(());
        }
        let mut state = self.state.write();
        if let Some(existing) = state.aliases.get(alias) {
            if existing != name {
                return Err(BeansError::store(
                    name,
                    None,
                    format!(
                        "Cannot register alias '{}' for bean name '{}': it's already registered for bean name '{}'",
                        alias, name, existing
                    ),
                ));
            }
            return Ok(());
        }
        if state.definitions.contains_key(alias) {
            return Err(BeansError::store(
                name,
                None,
                format!("Cannot register alias '{}' for bean name '{}': a bean definition with that name exists", alias, name),
            ));
        }
        if state.resolve(name) == alias {
            return Err(BeansError::store(
                name,
                None,
                format!(
                    "Cannot register alias '{}' for bean name '{}': circular reference - '{}' is a direct or indirect alias for '{}' already",
                    alias, name, name, alias
                ),
            ));
        }
        debug!("Registering alias '{}' for bean '{}'", alias, name);
        state.aliases.insert(alias.to_string(), name.to_string());
        Ok(())
    }

    /// Resolves aliases to the registered name; unknown names map to themselves.
    pub fn canonical_name(&self, name: &str) -> String {
        self.state.read().resolve(name).to_string()
    }

    /// Other names for the bean `name` refers to: its aliases, plus the
    /// canonical name when `name` is itself an alias. `name` is excluded.
    pub fn aliases(&self, name: &str) -> Vec<String> {
        let canonical = self.canonical_name(name);
        let state = self.state.read();
        let mut result: Vec<String> = Vec::new();
        if canonical != name {
            result.push(canonical.clone());
        }
        let mut aliases: Vec<&String> = state
            .aliases
            .keys()
            .filter(|alias| alias.as_str() != name)
            .filter(|alias| state.resolve(alias) == canonical)
            .collect();
        aliases.sort();
        result.extend(aliases.into_iter().cloned());
        result
    }

    pub fn contains(&self, name: &str) -> bool {
        let canonical = self.canonical_name(name);
        self.state.read().definitions.contains_key(&canonical)
    }

    pub fn definition(&self, name: &str) -> BeansResult<Arc<BeanDefinition>> {
        let canonical = self.canonical_name(name);
        self.state
            .read()
            .definitions
            .get(&canonical)
            .cloned()
            .ok_or_else(|| BeansError::no_such_bean(name))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.state.read().names.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The merged definition for `name` (aliases allowed), cached.
    pub fn merged_definition(&self, name: &str) -> BeansResult<Arc<MergedBeanDefinition>> {
        let canonical = self.canonical_name(name);
        let mut chain = Vec::new();
        self.merge_registered(&canonical, &mut chain)
    }

    /// Merges a definition that is not registered (an inner bean) against
    /// the registry's parents.
    pub fn merge_standalone(&self, name: &str, definition: &BeanDefinition) -> BeansResult<MergedBeanDefinition> {
        let mut chain = vec![name.to_string()];
        self.merge_with_parent(name, definition, &mut chain)
    }

    fn merge_registered(&self, name: &str, chain: &mut Vec<String>) -> BeansResult<Arc<MergedBeanDefinition>> {
        if let Some(cached) = self.merged.read().get(name) {
            return Ok(cached.clone());
        }
        let definition = self.definition(name)?;
        chain.push(name.to_string());
        let merged = Arc::new(self.merge_with_parent(name, &definition, chain)?);
        chain.pop();
        self.merged.write().insert(name.to_string(), merged.clone());
        Ok(merged)
    }

    fn merge_with_parent(
        &self,
        name: &str,
        definition: &BeanDefinition,
        chain: &mut Vec<String>,
    ) -> BeansResult<MergedBeanDefinition> {
        let Some(parent_name) = definition.parent_name() else {
            return Ok(MergedBeanDefinition::root(definition));
        };
        let parent = self.canonical_name(parent_name);
        if chain.contains(&parent) {
            return Err(BeansError::store(
                name,
                definition.resource(),
                format!("Circular parent definition chain: {} -> {}", chain.join(" -> "), parent),
            ));
        }
        let merged_parent = self.merge_registered(&parent, chain).map_err(|err| match err {
            BeansError::NoSuchBeanDefinition { .. } => BeansError::store(
                name,
                definition.resource(),
                format!("Could not resolve parent bean definition '{}'", parent_name),
            ),
            other => other,
        })?;
        Ok(MergedBeanDefinition::overlay(&merged_parent, definition))
    }
}
