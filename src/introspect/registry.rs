//! Name-indexed class lookup.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::internal::FastMap;
use crate::introspect::Class;

/// Classes known to a factory, looked up by name when definitions are
/// resolved and when text is converted to a class object.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{ClassBuilder, ClassRegistry};
///
/// struct Widget;
///
/// let classes = ClassRegistry::new();
/// classes.register(ClassBuilder::<Widget>::new("Widget").build());
/// assert!(classes.contains("Widget"));
/// assert_eq!(classes.get("Widget").unwrap().name(), "Widget");
/// ```
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<FastMap<String, Arc<Class>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class under its own name, replacing any previous class
    /// with that name.
    pub fn register(&self, class: Arc<Class>) -> Arc<Class> {
        self.classes.write().insert(class.name().to_string(), class.clone());
        class
    }

    pub fn get(&self, name: &str) -> Option<Arc<Class>> {
        self.classes.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Registered class names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }
}
