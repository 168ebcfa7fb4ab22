//! Typed construction of [`Class`] metadata.

use std::any::{type_name, Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::BoxError;
use crate::factory::BeanFactory;
use crate::introspect::class::{
    AnyBox, Callback, Capabilities, Class, ConstructorDescriptor, FactoryBeanHooks, Getter, MethodDescriptor,
    PropertyDescriptor, Setter, SetterError, StaticMethodDescriptor,
};
use crate::introspect::type_desc::TypeDesc;
use crate::value::{FromValue, IntoValue, Value};

/// Return types accepted from setters and lifecycle callbacks: `()` or
/// `Result<(), E>`.
pub trait CallbackResult {
    fn into_result(self) -> Result<(), BoxError>;
}

impl CallbackResult for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> CallbackResult for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// Positional arguments handed to constructors and methods, already
/// converted to the declared parameter types.
#[derive(Debug, Clone)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Argument `index` as a typed value.
    pub fn get<V: FromValue>(&self, index: usize) -> Result<V, BoxError> {
        let value = self
            .values
            .get(index)
            .cloned()
            .ok_or_else(|| format!("missing argument at index {}", index))?;
        V::from_value(value).map_err(|msg| format!("argument {}: {}", index, msg).into())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

fn wrong_target<T>() -> String {
    format!("target is not an instance of {}", type_name::<T>())
}

/// Builder describing how the container sees a Rust type `T`.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{ClassBuilder, TypeDesc, Instance, BeanWrapper, Value};
///
/// #[derive(Default)]
/// struct Person { name: String, age: i64 }
///
/// let class = ClassBuilder::<Person>::new("Person")
///     .default_constructor()
///     .property("name", |p: &Person| p.name.clone(), |p: &mut Person, v: String| p.name = v)
///     .property("age", |p: &Person| p.age, |p: &mut Person, v: i64| p.age = v)
///     .build();
///
/// let wrapper = BeanWrapper::new(Instance::new(&class, Person::default()));
/// wrapper.set_property_value("age", Value::from("42")).unwrap();
/// assert_eq!(wrapper.get_property_value("age").unwrap(), Value::Int(42));
/// ```
pub struct ClassBuilder<T> {
    name: String,
    superclass: Option<Arc<Class>>,
    interfaces: Vec<String>,
    properties: Vec<PropertyDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    methods: Vec<MethodDescriptor>,
    static_methods: Vec<StaticMethodDescriptor>,
    capabilities: Capabilities,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            static_methods: Vec::new(),
            capabilities: Capabilities::default(),
            _marker: PhantomData,
        }
    }

    /// Declares the superclass. Only the hierarchy is recorded; properties
    /// are not inherited.
    pub fn extends(mut self, parent: &Arc<Class>) -> Self {
        self.superclass = Some(parent.clone());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    // ---- properties ----

    /// Read-write property typed after `V`.
    pub fn property<V, G, S, R>(self, name: &str, get: G, set: S) -> Self
    where
        V: FromValue + IntoValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) -> R + Send + Sync + 'static,
        R: CallbackResult,
    {
        self.property_as(name, V::type_desc(), get, set)
    }

    /// Read-write property with an explicit declared type, e.g. a bean type
    /// for an `Option<Instance>` field.
    pub fn property_as<V, G, S, R>(self, name: &str, ty: TypeDesc, get: G, set: S) -> Self
    where
        V: FromValue + IntoValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) -> R + Send + Sync + 'static,
        R: CallbackResult,
    {
        self.push_property(name, ty, Some(getter(get)), Some(setter(set)))
    }

    pub fn read_only<V, G>(self, name: &str, get: G) -> Self
    where
        V: IntoValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.push_property(name, V::type_desc(), Some(getter(get)), None)
    }

    pub fn write_only<V, S, R>(self, name: &str, set: S) -> Self
    where
        V: FromValue + 'static,
        S: Fn(&mut T, V) -> R + Send + Sync + 'static,
        R: CallbackResult,
    {
        self.write_only_as(name, V::type_desc(), set)
    }

    pub fn write_only_as<V, S, R>(self, name: &str, ty: TypeDesc, set: S) -> Self
    where
        V: FromValue + 'static,
        S: Fn(&mut T, V) -> R + Send + Sync + 'static,
        R: CallbackResult,
    {
        self.push_property(name, ty, None, Some(setter(set)))
    }

    fn push_property(mut self, name: &str, ty: TypeDesc, getter: Option<Getter>, setter: Option<Setter>) -> Self {
        self.properties.retain(|p| p.name != name);
        self.properties.push(PropertyDescriptor {
            name: name.to_string(),
            ty,
            getter,
            setter,
        });
        self
    }

    // ---- constructors ----

    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(Vec::new(), |_| Ok(T::default()))
    }

    /// Adds a constructor taking arguments of the given declared types.
    pub fn constructor<F>(mut self, params: Vec<TypeDesc>, f: F) -> Self
    where
        F: Fn(Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorDescriptor {
            params,
            invoke: Arc::new(move |values| f(Args::new(values)).map(|t| Box::new(t) as AnyBox)),
        });
        self
    }

    // ---- methods ----

    /// Instance method returning an arbitrary value.
    pub fn method<F>(self, name: &str, params: Vec<TypeDesc>, f: F) -> Self
    where
        F: Fn(&mut T, Args) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.factory_method(name, params, TypeDesc::Any, f)
    }

    /// Zero-argument instance method, typically an init or destroy method.
    pub fn method0<F, R>(self, name: &str, f: F) -> Self
    where
        F: Fn(&mut T) -> R + Send + Sync + 'static,
        R: CallbackResult,
    {
        self.method(name, Vec::new(), move |t, _| f(t).into_result().map(|_| Value::Null))
    }

    /// Instance method with a declared return type, usable as an instance
    /// factory method.
    pub fn factory_method<F>(mut self, name: &str, params: Vec<TypeDesc>, returns: TypeDesc, f: F) -> Self
    where
        F: Fn(&mut T, Args) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.methods.push(MethodDescriptor {
            name: name.to_string(),
            params,
            returns,
            invoke: Arc::new(move |target: &mut dyn Any, values: Vec<Value>| {
                let t = target.downcast_mut::<T>().ok_or_else(wrong_target::<T>)?;
                f(t, Args::new(values))
            }),
        });
        self
    }

    /// Class-level method, usable as a static factory method.
    pub fn static_method<F>(mut self, name: &str, params: Vec<TypeDesc>, returns: TypeDesc, f: F) -> Self
    where
        F: Fn(Args) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.static_methods.push(StaticMethodDescriptor {
            name: name.to_string(),
            params,
            returns,
            invoke: Arc::new(move |values| f(Args::new(values))),
        });
        self
    }

    // ---- lifecycle capabilities ----

    /// Receives the bean's registered name after population.
    pub fn bean_name_aware<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &str) + Send + Sync + 'static,
    {
        self.capabilities.bean_name_aware = Some(Arc::new(move |target: &mut dyn Any, name: &str| {
            if let Some(t) = target.downcast_mut::<T>() {
                f(t, name);
            }
        }));
        self
    }

    /// Receives a handle to the owning factory after population.
    pub fn factory_aware<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &BeanFactory) + Send + Sync + 'static,
    {
        self.capabilities.factory_aware = Some(Arc::new(move |target: &mut dyn Any, factory: &BeanFactory| {
            if let Some(t) = target.downcast_mut::<T>() {
                f(t, factory);
            }
        }));
        self
    }

    /// Called once all properties are set, before any custom init method.
    pub fn initializing<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) -> R + Send + Sync + 'static,
        R: CallbackResult,
    {
        self.capabilities.initializing = Some(callback(f));
        self
    }

    /// Called when the factory destroys the bean, before any custom destroy method.
    pub fn disposable<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) -> R + Send + Sync + 'static,
        R: CallbackResult,
    {
        self.capabilities.disposable = Some(callback(f));
        self
    }

    /// Marks instances as factory beans producing objects of `object_type`.
    /// A product of `Value::Null` means the factory is not ready yet.
    pub fn factory_bean<F>(mut self, object_type: TypeDesc, singleton: bool, f: F) -> Self
    where
        F: Fn(&T) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.capabilities.factory_bean = Some(FactoryBeanHooks {
            get_object: Arc::new(move |target: &dyn Any| {
                let t = target.downcast_ref::<T>().ok_or_else(wrong_target::<T>)?;
                f(t)
            }),
            object_type,
            singleton,
        });
        self
    }

    pub fn build(self) -> Arc<Class> {
        Arc::new(Class {
            name: self.name,
            type_id: TypeId::of::<T>(),
            superclass: self.superclass,
            interfaces: self.interfaces,
            properties: self.properties,
            constructors: self.constructors,
            methods: self.methods,
            static_methods: self.static_methods,
            capabilities: self.capabilities,
        })
    }
}

fn getter<T, V, G>(get: G) -> Getter
where
    T: Any,
    V: IntoValue,
    G: Fn(&T) -> V + Send + Sync + 'static,
{
    Arc::new(move |target: &dyn Any| target.downcast_ref::<T>().map(|t| get(t).into_value()))
}

fn setter<T, V, S, R>(set: S) -> Setter
where
    T: Any,
    V: FromValue,
    S: Fn(&mut T, V) -> R + Send + Sync + 'static,
    R: CallbackResult,
{
    Arc::new(move |target: &mut dyn Any, value: Value| {
        let t = target
            .downcast_mut::<T>()
            .ok_or_else(|| SetterError::Type(wrong_target::<T>()))?;
        let v = V::from_value(value).map_err(SetterError::Type)?;
        set(t, v).into_result().map_err(SetterError::Invocation)
    })
}

fn callback<T, F, R>(f: F) -> Callback
where
    T: Any,
    F: Fn(&mut T) -> R + Send + Sync + 'static,
    R: CallbackResult,
{
    Arc::new(move |target: &mut dyn Any| {
        let t = target.downcast_mut::<T>().ok_or_else(wrong_target::<T>)?;
        f(t).into_result()
    })
}
