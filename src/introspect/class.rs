//! Runtime class metadata.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::factory::BeanFactory;
use crate::introspect::type_desc::{TypeDesc, OBJECT};
use crate::value::Value;

pub(crate) type AnyBox = Box<dyn Any + Send + Sync>;
pub(crate) type Getter = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), SetterError> + Send + Sync>;
pub(crate) type ConstructorFn = Arc<dyn Fn(Vec<Value>) -> Result<AnyBox, BoxError> + Send + Sync>;
pub(crate) type MethodFn = Arc<dyn Fn(&mut dyn Any, Vec<Value>) -> Result<Value, BoxError> + Send + Sync>;
pub(crate) type StaticMethodFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, BoxError> + Send + Sync>;
pub(crate) type Callback = Arc<dyn Fn(&mut dyn Any) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type NameCallback = Arc<dyn Fn(&mut dyn Any, &str) + Send + Sync>;
pub(crate) type FactoryCallback = Arc<dyn Fn(&mut dyn Any, &BeanFactory) + Send + Sync>;
pub(crate) type ProductFn = Arc<dyn Fn(&dyn Any) -> Result<Value, BoxError> + Send + Sync>;

/// Why a property setter rejected a value.
#[derive(Debug)]
pub(crate) enum SetterError {
    /// The value could not be turned into the setter's parameter type.
    Type(String),
    /// The setter itself failed.
    Invocation(BoxError),
}

/// A named property with an optional getter and setter.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub(crate) name: String,
    pub(crate) ty: TypeDesc,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub(crate) fn read(&self, target: &dyn Any) -> Option<Value> {
        self.getter.as_ref().and_then(|get| get(target))
    }

    pub(crate) fn write(&self, target: &mut dyn Any, value: Value) -> Result<(), SetterError> {
        match &self.setter {
            Some(set) => set(target, value),
            None => Err(SetterError::Type(format!("property '{}' has no setter", self.name))),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("type", &self.ty)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// A constructor signature.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub(crate) params: Vec<TypeDesc>,
    pub(crate) invoke: ConstructorFn,
}

impl ConstructorDescriptor {
    pub fn parameter_types(&self) -> &[TypeDesc] {
        &self.params
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstructorDescriptor").field(&self.params).finish()
    }
}

/// An instance method; used for init/destroy methods and instance factory methods.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub(crate) name: String,
    pub(crate) params: Vec<TypeDesc>,
    pub(crate) returns: TypeDesc,
    pub(crate) invoke: MethodFn,
}

impl MethodDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[TypeDesc] {
        &self.params
    }

    pub fn return_type(&self) -> &TypeDesc {
        &self.returns
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}) -> {}", self.name, self.params, self.returns)
    }
}

/// A static (class-level) method; used for static factory methods.
#[derive(Clone)]
pub struct StaticMethodDescriptor {
    pub(crate) name: String,
    pub(crate) params: Vec<TypeDesc>,
    pub(crate) returns: TypeDesc,
    pub(crate) invoke: StaticMethodFn,
}

impl StaticMethodDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[TypeDesc] {
        &self.params
    }

    pub fn return_type(&self) -> &TypeDesc {
        &self.returns
    }
}

impl fmt::Debug for StaticMethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "static {}({:?}) -> {}", self.name, self.params, self.returns)
    }
}

/// Factory-bean capability: the instance produces another object.
#[derive(Clone)]
pub(crate) struct FactoryBeanHooks {
    pub(crate) get_object: ProductFn,
    pub(crate) object_type: TypeDesc,
    pub(crate) singleton: bool,
}

/// Optional lifecycle capabilities of a class.
#[derive(Clone, Default)]
pub(crate) struct Capabilities {
    pub(crate) bean_name_aware: Option<NameCallback>,
    pub(crate) factory_aware: Option<FactoryCallback>,
    pub(crate) initializing: Option<Callback>,
    pub(crate) disposable: Option<Callback>,
    pub(crate) factory_bean: Option<FactoryBeanHooks>,
}

/// Runtime description of a bean class: its hierarchy, properties,
/// constructors, methods and lifecycle capabilities.
///
/// Classes are built with [`ClassBuilder`](crate::ClassBuilder) and
/// registered in a [`ClassRegistry`](crate::ClassRegistry) so that
/// definitions can refer to them by name.
pub struct Class {
    pub(crate) name: String,
    pub(crate) type_id: TypeId,
    pub(crate) superclass: Option<Arc<Class>>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) properties: Vec<PropertyDescriptor>,
    pub(crate) constructors: Vec<ConstructorDescriptor>,
    pub(crate) methods: Vec<MethodDescriptor>,
    pub(crate) static_methods: Vec<StaticMethodDescriptor>,
    pub(crate) capabilities: Capabilities,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `TypeId` of the Rust type backing instances of this class.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn superclass(&self) -> Option<&Arc<Class>> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn default_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructors.iter().find(|c| c.params.is_empty())
    }

    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor().is_some()
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDescriptor> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn static_methods_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a StaticMethodDescriptor> + 'a {
        self.static_methods.iter().filter(move |m| m.name == name)
    }

    pub fn is_factory_bean(&self) -> bool {
        self.capabilities.factory_bean.is_some()
    }

    /// Declared product type of a factory bean class.
    pub fn factory_object_type(&self) -> Option<&TypeDesc> {
        self.capabilities.factory_bean.as_ref().map(|hooks| &hooks.object_type)
    }

    pub fn is_disposable(&self) -> bool {
        self.capabilities.disposable.is_some()
    }

    /// True if `name` is this class, a superclass, an interface implemented
    /// anywhere in the chain, or the implicit root.
    pub fn is_assignable_to_name(&self, name: &str) -> bool {
        if name == OBJECT || self.name == name || self.interfaces.iter().any(|i| i == name) {
            return true;
        }
        match &self.superclass {
            Some(parent) => parent.is_assignable_to_name(name),
            None => false,
        }
    }

    /// Whether instances of this class fit a slot of the declared type.
    pub fn is_assignable_to(&self, declared: &TypeDesc) -> bool {
        match declared {
            TypeDesc::Any => true,
            TypeDesc::Bean(name) => self.is_assignable_to_name(name),
            _ => false,
        }
    }

    /// Declared type describing instances of this class.
    pub fn as_type(&self) -> TypeDesc {
        TypeDesc::Bean(self.name.clone())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name.as_str()))
            .field("interfaces", &self.interfaces)
            .field("properties", &self.properties.iter().map(|p| p.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
