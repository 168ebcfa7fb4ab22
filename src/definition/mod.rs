//! Bean definitions: the recipes the factory builds beans from.

mod merged;
mod values;

pub use merged::MergedBeanDefinition;
pub use values::{
    BeanValue, ConstructorArgumentValues, PropertyValue, PropertyValues, RuntimeBeanReference, ValueHolder,
};

use crate::introspect::TypeDesc;
use crate::scope::BeanScope;

/// How a bean's unset dependencies are filled in automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutowireMode {
    #[default]
    No,
    /// Unset object properties are filled with the bean of the same name.
    ByName,
    /// Unset object properties are filled with the single bean of the property's type.
    ByType,
    /// Constructor parameters are filled with the single bean of each parameter's type.
    Constructor,
    /// `Constructor` when the class has no zero-argument constructor, else `ByType`.
    Autodetect,
}

/// Which writable properties must have a value after population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyCheck {
    #[default]
    None,
    /// Properties of non-simple types.
    Objects,
    /// Properties of simple types (primitives, strings, classes and arrays of those).
    Simple,
    All,
}

/// Declarative description of a bean.
///
/// A definition names a class (or a parent definition, or a factory bean and
/// method) and carries property values, constructor arguments and lifecycle
/// settings. Settings left unset are inherited from the parent definition
/// when one is named, and otherwise take their defaults when the factory
/// merges the definition.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{AutowireMode, BeanDefinition, BeanScope, BeanValue};
///
/// let parent = BeanDefinition::new("TestBean")
///     .property("name", "parent")
///     .property("age", 1)
///     .abstract_definition();
///
/// let child = BeanDefinition::child_of("parent")
///     .property("age", 2)
///     .property_ref("spouse", "other")
///     .scope(BeanScope::Prototype)
///     .autowire(AutowireMode::ByType);
///
/// assert!(parent.is_abstract());
/// assert_eq!(child.parent_name(), Some("parent"));
/// assert!(matches!(child.property_values().get("spouse"), Some(BeanValue::Ref(_))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BeanDefinition {
    class_name: Option<String>,
    parent_name: Option<String>,
    factory_bean_name: Option<String>,
    factory_method_name: Option<String>,
    property_values: PropertyValues,
    constructor_args: ConstructorArgumentValues,
    scope: Option<BeanScope>,
    lazy_init: Option<bool>,
    is_abstract: bool,
    depends_on: Option<Vec<String>>,
    autowire: Option<AutowireMode>,
    dependency_check: Option<DependencyCheck>,
    init_method: Option<String>,
    destroy_method: Option<String>,
    resource_description: Option<String>,
}

impl BeanDefinition {
    /// Definition of a bean of the named class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    /// Definition inheriting from the named parent definition.
    pub fn child_of(parent_name: impl Into<String>) -> Self {
        Self {
            parent_name: Some(parent_name.into()),
            ..Self::default()
        }
    }

    /// Definition of a bean produced by `factory_method` on the bean named
    /// `factory_bean`.
    pub fn from_factory_bean(factory_bean: impl Into<String>, factory_method: impl Into<String>) -> Self {
        Self {
            factory_bean_name: Some(factory_bean.into()),
            factory_method_name: Some(factory_method.into()),
            ..Self::default()
        }
    }

    // ---- builder ----

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn parent(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_name = Some(parent_name.into());
        self
    }

    pub fn factory_bean(mut self, factory_bean: impl Into<String>) -> Self {
        self.factory_bean_name = Some(factory_bean.into());
        self
    }

    /// Static factory method on the definition's class, or instance method
    /// on the factory bean when one is set.
    pub fn factory_method(mut self, method: impl Into<String>) -> Self {
        self.factory_method_name = Some(method.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<BeanValue>) -> Self {
        self.property_values.add(name, value);
        self
    }

    pub fn property_ref(self, name: impl Into<String>, bean_name: impl Into<String>) -> Self {
        self.property(name, BeanValue::reference(bean_name))
    }

    pub fn property_values_from(mut self, values: PropertyValues) -> Self {
        self.property_values.merge(&values);
        self
    }

    /// Adds a generic constructor argument, matched to parameters by type.
    pub fn constructor_arg(mut self, value: impl Into<BeanValue>) -> Self {
        self.constructor_args.add_generic(ValueHolder::new(value));
        self
    }

    /// Adds a generic constructor argument that only matches parameters of
    /// the given declared type.
    pub fn constructor_arg_typed(mut self, value: impl Into<BeanValue>, type_desc: TypeDesc) -> Self {
        self.constructor_args.add_generic(ValueHolder::typed(value, type_desc));
        self
    }

    pub fn indexed_constructor_arg(mut self, index: usize, value: impl Into<BeanValue>) -> Self {
        self.constructor_args.add_indexed(index, ValueHolder::new(value));
        self
    }

    pub fn scope(mut self, scope: BeanScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn prototype(self) -> Self {
        self.scope(BeanScope::Prototype)
    }

    pub fn lazy_init(mut self, lazy: bool) -> Self {
        self.lazy_init = Some(lazy);
        self
    }

    /// Marks the definition as a template that cannot be instantiated.
    pub fn abstract_definition(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn autowire(mut self, mode: AutowireMode) -> Self {
        self.autowire = Some(mode);
        self
    }

    pub fn dependency_check(mut self, check: DependencyCheck) -> Self {
        self.dependency_check = Some(check);
        self
    }

    pub fn init_method(mut self, method: impl Into<String>) -> Self {
        self.init_method = Some(method.into());
        self
    }

    pub fn destroy_method(mut self, method: impl Into<String>) -> Self {
        self.destroy_method = Some(method.into());
        self
    }

    /// Human-readable origin of the definition, quoted in error messages.
    pub fn resource_description(mut self, description: impl Into<String>) -> Self {
        self.resource_description = Some(description.into());
        self
    }

    // ---- accessors ----

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
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

    pub fn property_values_mut(&mut self) -> &mut PropertyValues {
        &mut self.property_values
    }

    pub fn constructor_argument_values(&self) -> &ConstructorArgumentValues {
        &self.constructor_args
    }

    pub fn constructor_argument_values_mut(&mut self) -> &mut ConstructorArgumentValues {
        &mut self.constructor_args
    }

    /// Explicit scope, if set on this definition.
    pub fn declared_scope(&self) -> Option<BeanScope> {
        self.scope
    }

    pub fn declared_lazy_init(&self) -> Option<bool> {
        self.lazy_init
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn declared_depends_on(&self) -> Option<&[String]> {
        self.depends_on.as_deref()
    }

    pub fn declared_autowire(&self) -> Option<AutowireMode> {
        self.autowire
    }

    pub fn declared_dependency_check(&self) -> Option<DependencyCheck> {
        self.dependency_check
    }

    pub fn init_method_name(&self) -> Option<&str> {
        self.init_method.as_deref()
    }

    pub fn destroy_method_name(&self) -> Option<&str> {
        self.destroy_method.as_deref()
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource_description.as_deref()
    }

    /// Structural checks applied at registration.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.lazy_init == Some(true) && self.scope == Some(BeanScope::Prototype) {
            return Err("Lazy initialization is only applicable to singleton beans".to_string());
        }
        if self.class_name.is_none() && self.parent_name.is_none() && self.factory_bean_name.is_none() {
            return Err("Either 'class' or 'parent' or 'factory-bean' is required".to_string());
        }
        if self.factory_bean_name.is_some() && self.factory_method_name.is_none() {
            return Err("'factory-bean' requires 'factory-method'".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rules() {
        assert!(BeanDefinition::new("A").validate().is_ok());
        assert!(BeanDefinition::default().validate().is_err());
        assert!(BeanDefinition::new("A").prototype().lazy_init(true).validate().is_err());
        assert!(BeanDefinition::default().factory_bean("f").validate().is_err());
        assert!(BeanDefinition::from_factory_bean("f", "create").validate().is_ok());
        assert!(BeanDefinition::child_of("p").validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let def = BeanDefinition::new("A")
            .indexed_constructor_arg(1, "x")
            .constructor_arg(5)
            .depends_on(["b", "c"])
            .init_method("init")
            .destroy_method("close")
            .resource_description("test");
        assert_eq!(def.constructor_argument_values().argument_count(), 2);
        assert_eq!(def.declared_depends_on(), Some(&["b".to_string(), "c".to_string()][..]));
        assert_eq!(def.init_method_name(), Some("init"));
        assert_eq!(def.destroy_method_name(), Some("close"));
        assert_eq!(def.resource(), Some("test"));
    }
}
