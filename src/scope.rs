//! Bean scope definitions.

/// Bean scopes controlling instance caching behavior.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanDefinition, BeanFactory, BeanScope, ClassBuilder};
///
/// #[derive(Default)]
/// struct Counter;
///
/// let factory = BeanFactory::new();
/// factory.register_class(ClassBuilder::<Counter>::new("Counter").default_constructor().build());
/// factory.register_bean_definition("shared", BeanDefinition::new("Counter")).unwrap();
/// factory
///     .register_bean_definition("fresh", BeanDefinition::new("Counter").scope(BeanScope::Prototype))
///     .unwrap();
///
/// // Singleton: the same instance on every lookup
/// assert!(factory.get_bean("shared").unwrap().ptr_eq(&factory.get_bean("shared").unwrap()));
/// // Prototype: a new instance per lookup
/// assert!(!factory.get_bean("fresh").unwrap().ptr_eq(&factory.get_bean("fresh").unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeanScope {
    /// One shared instance per factory, created once and cached until the
    /// factory's singletons are destroyed.
    #[default]
    Singleton,
    /// A new instance per lookup. Prototypes are never cached and receive no
    /// destruction callbacks from the factory.
    Prototype,
}

impl BeanScope {
    pub fn is_singleton(self) -> bool {
        matches!(self, BeanScope::Singleton)
    }
}

impl std::fmt::Display for BeanScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeanScope::Singleton => f.write_str("singleton"),
            BeanScope::Prototype => f.write_str("prototype"),
        }
    }
}
