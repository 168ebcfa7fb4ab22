use crate::definition::{AutowireMode, BeanDefinition, ConstructorArgumentValues, DependencyCheck, PropertyValues};
use crate::introspect::Class;
use crate::scope::BeanScope;

/// A definition with its parent chain folded in and defaults applied.
///
/// Produced by the registry; this is what the factory actually builds from.
#[derive(Debug, Clone)]
pub struct MergedBeanDefinition {
    class_name: Option<String>,
    factory_bean_name: Option<String>,
    factory_method_name: Option<String>,
    property_values: PropertyValues,
    constructor_args: ConstructorArgumentValues,
    scope: BeanScope,
    lazy_init: bool,
    is_abstract: bool,
    depends_on: Vec<String>,
    autowire: AutowireMode,
    dependency_check: DependencyCheck,
    init_method: Option<String>,
    destroy_method: Option<String>,
    resource_description: Option<String>,
}

impl MergedBeanDefinition {
    /// A definition without a parent, with defaults filled in.
    pub(crate) fn root(definition: &BeanDefinition) -> Self {
        Self {
            class_name: definition.class_name().map(str::to_string),
            factory_bean_name: definition.factory_bean_name().map(str::to_string),
            factory_method_name: definition.factory_method_name().map(str::to_string),
            property_values: definition.property_values().clone(),
            constructor_args: definition.constructor_argument_values().clone(),
            scope: definition.declared_scope().unwrap_or_default(),
            lazy_init: definition.declared_lazy_init().unwrap_or(false),
            is_abstract: definition.is_abstract(),
            depends_on: definition.declared_depends_on().map(<[String]>::to_vec).unwrap_or_default(),
            autowire: definition.declared_autowire().unwrap_or_default(),
            dependency_check: definition.declared_dependency_check().unwrap_or_default(),
            init_method: definition.init_method_name().map(str::to_string),
            destroy_method: definition.destroy_method_name().map(str::to_string),
            resource_description: definition.resource().map(str::to_string),
        }
    }

    /// `child` overlaid on an already merged parent. The child's property
    /// values and constructor arguments win on conflicts, settings it leaves
    /// unset are inherited, and the abstract flag is never inherited.
    pub(crate) fn overlay(parent: &MergedBeanDefinition, child: &BeanDefinition) -> Self {
        let mut property_values = parent.property_values.clone();
        property_values.merge(child.property_values());
        let mut constructor_args = parent.constructor_args.clone();
        constructor_args.merge(child.constructor_argument_values());

        Self {
            class_name: child.class_name().map(str::to_string).or_else(|| parent.class_name.clone()),
            factory_bean_name: child
                .factory_bean_name()
                .map(str::to_string)
                .or_else(|| parent.factory_bean_name.clone()),
            factory_method_name: child
                .factory_method_name()
                .map(str::to_string)
                .or_else(|| parent.factory_method_name.clone()),
            property_values,
            constructor_args,
            scope: child.declared_scope().unwrap_or(parent.scope),
            lazy_init: child.declared_lazy_init().unwrap_or(parent.lazy_init),
            is_abstract: child.is_abstract(),
            depends_on: child
                .declared_depends_on()
                .map(<[String]>::to_vec)
                .unwrap_or_else(|| parent.depends_on.clone()),
            autowire: child.declared_autowire().unwrap_or(parent.autowire),
            dependency_check: child.declared_dependency_check().unwrap_or(parent.dependency_check),
            init_method: child.init_method_name().map(str::to_string).or_else(|| parent.init_method.clone()),
            destroy_method: child
                .destroy_method_name()
                .map(str::to_string)
                .or_else(|| parent.destroy_method.clone()),
            resource_description: child.resource().map(str::to_string),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn factory_bean_name(&self) -> Option<&str> {
        self.factory_bean_name.as_deref()
    }

    pub fn factory_method_name(&self) -> Option<&str> {
        self.factory_method_name.as_deref()
    }

    pub fn property_values(&self) -> &PropertyValues {
        &self.property_values
    }

    pub fn constructor_argument_values(&self) -> &ConstructorArgumentValues {
        &self.constructor_args
    }

    pub fn has_constructor_argument_values(&self) -> bool {
        !self.constructor_args.is_empty()
    }

    pub fn scope(&self) -> BeanScope {
        self.scope
    }

    pub fn is_singleton(&self) -> bool {
        self.scope.is_singleton()
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn autowire_mode(&self) -> AutowireMode {
        self.autowire
    }

    /// The autowire mode with `Autodetect` resolved against `class`.
    pub fn resolved_autowire_mode(&self, class: &Class) -> AutowireMode {
        match self.autowire {
            AutowireMode::Autodetect if class.has_default_constructor() => AutowireMode::ByType,
            AutowireMode::Autodetect => AutowireMode::Constructor,
            mode => mode,
        }
    }

    pub fn dependency_check(&self) -> DependencyCheck {
        self.dependency_check
    }

    pub fn init_method_name(&self) -> Option<&str> {
        self.init_method.as_deref()
    }

    pub fn destroy_method_name(&self) -> Option<&str> {
        self.destroy_method.as_deref()
    }

    pub fn resource_description(&self) -> Option<&str> {
        self.resource_description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::BeanValue;
    use crate::value::Value;

    #[test]
    fn root_applies_defaults() {
        let merged = MergedBeanDefinition::root(&BeanDefinition::new("A"));
        assert!(merged.is_singleton());
        assert!(!merged.is_lazy_init());
        assert_eq!(merged.autowire_mode(), AutowireMode::No);
        assert_eq!(merged.dependency_check(), DependencyCheck::None);
    }

    #[test]
    fn child_overrides_and_inherits() {
        let parent = MergedBeanDefinition::root(
            &BeanDefinition::new("A")
                .property("name", "parent")
                .property("age", 1)
                .prototype()
                .init_method("init")
                .abstract_definition(),
        );
        let child = BeanDefinition::child_of("parent").property("age", 2);
        let merged = MergedBeanDefinition::overlay(&parent, &child);

        assert_eq!(merged.class_name(), Some("A"));
        assert_eq!(merged.scope(), BeanScope::Prototype);
        assert_eq!(merged.init_method_name(), Some("init"));
        assert!(!merged.is_abstract());
        assert!(matches!(merged.property_values().get("age"), Some(BeanValue::Literal(Value::Int(2)))));
        assert!(merged.property_values().contains("name"));
    }
}
