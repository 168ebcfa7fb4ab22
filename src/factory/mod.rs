//! The bean factory: definition lookup, bean retrieval and type queries.
//!
//! Creation itself lives in the submodules: `create` builds and wires a
//! single bean, `constructor` picks constructors and factory methods,
//! `resolve` turns declared values into live ones, and `lifecycle` handles
//! eager instantiation and destruction.

mod constructor;
mod create;
mod lifecycle;
mod resolve;
mod singleton;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::FactoryConfig;
use crate::definition::{AutowireMode, BeanDefinition, DependencyCheck, MergedBeanDefinition};
use crate::error::{BeansError, BeansResult};
use crate::internal::{new_set, CreationTracker, FastSet};
use crate::introspect::{Class, ClassRegistry, TypeDesc};
use crate::registry::BeanDefinitionRegistry;
use crate::traits::BeanPostProcessor;
use crate::value::{Instance, Value};
use crate::wrapper::{BeanWrapper, ConverterRegistry, TypeConverter};

use singleton::SingletonStore;

/// Prefix that asks for a factory bean itself rather than its product.
pub const FACTORY_BEAN_PREFIX: &str = "&";

/// A bean container built from named [`BeanDefinition`]s.
///
/// Singletons are created once and shared, prototypes are created on every
/// request. Dependencies are wired from explicit references, inner
/// definitions and autowiring. Property cycles between singletons are
/// resolved by exposing a bean before it is populated; constructor cycles
/// fail with [`BeansError::BeanCurrentlyInCreation`].
///
/// The factory is a cheap handle around shared state: clones see the same
/// definitions and singletons, and all operations may be called from any
/// thread. Each singleton is built at most once even under concurrent first
/// access.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanDefinition, BeanFactory, ClassBuilder, Instance, TypeDesc};
///
/// #[derive(Default)]
/// struct Person { name: String, spouse: Option<Instance> }
///
/// let factory = BeanFactory::new();
/// factory.register_class(
///     ClassBuilder::<Person>::new("Person")
///         .default_constructor()
///         .property("name", |p: &Person| p.name.clone(), |p: &mut Person, v: String| p.name = v)
///         .property_as("spouse", TypeDesc::bean("Person"), |p: &Person| p.spouse.clone(), |p: &mut Person, v: Option<Instance>| p.spouse = v)
///         .build(),
/// );
///
/// factory
///     .register_bean_definition("tony", BeanDefinition::new("Person").property("name", "Tony").property_ref("spouse", "pepper"))
///     .unwrap();
/// factory
///     .register_bean_definition("pepper", BeanDefinition::new("Person").property("name", "Pepper").property_ref("spouse", "tony"))
///     .unwrap();
///
/// let tony = factory.get_bean("tony").unwrap();
/// let pepper = tony.with(|p: &Person| p.spouse.clone()).flatten().unwrap();
/// assert_eq!(pepper.with(|p: &Person| p.name.clone()).unwrap(), "Pepper");
/// assert!(factory.get_bean("pepper").unwrap().ptr_eq(&pepper));
/// ```
#[derive(Clone)]
pub struct BeanFactory {
    inner: Arc<FactoryInner>,
}

pub(crate) struct FactoryInner {
    config: FactoryConfig,
    classes: Arc<ClassRegistry>,
    registry: BeanDefinitionRegistry,
    singletons: SingletonStore,
    converters: Arc<ConverterRegistry>,
    post_processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
    ignored_types: RwLock<FastSet<TypeDesc>>,
    creation: CreationTracker,
}

/// What a bean name will produce, known without creating it.
#[derive(Debug, Clone)]
pub(crate) enum BeanType {
    Class(Arc<Class>),
    Declared(TypeDesc),
}

impl BeanType {
    fn into_type_desc(self) -> TypeDesc {
        match self {
            BeanType::Class(class) => class.as_type(),
            BeanType::Declared(ty) => ty,
        }
    }
}

impl std::fmt::Debug for BeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanFactory")
            .field("definitions", &self.inner.registry.names())
            .field("singletons", &self.inner.singletons.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Default for BeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits off any number of leading `&`.
fn strip_factory_prefix(name: &str) -> (&str, bool) {
    let stripped = name.trim_start_matches(FACTORY_BEAN_PREFIX);
    (stripped, stripped.len() != name.len())
}

impl BeanFactory {
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        Self::with_class_registry(config, Arc::new(ClassRegistry::new()))
    }

    /// A factory resolving class names against an existing registry.
    pub fn with_class_registry(config: FactoryConfig, classes: Arc<ClassRegistry>) -> Self {
        debug!("Creating bean factory with {:?}", config);
        Self {
            inner: Arc::new(FactoryInner {
                registry: BeanDefinitionRegistry::new(config.allow_bean_definition_overriding),
                creation: CreationTracker::new(config.max_creation_depth),
                converters: Arc::new(ConverterRegistry::with_classes(classes.clone())),
                singletons: SingletonStore::default(),
                post_processors: RwLock::new(Vec::new()),
                ignored_types: RwLock::new(new_set()),
                classes,
                config,
            }),
        }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.inner.classes
    }

    /// Makes a class available to definitions by its name.
    pub fn register_class(&self, class: Arc<Class>) -> Arc<Class> {
        self.inner.classes.register(class)
    }

    /// The definition registry backing this factory.
    pub fn registry(&self) -> &BeanDefinitionRegistry {
        &self.inner.registry
    }

    // ---- definitions ----

    pub fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> BeansResult<()> {
        self.inner.registry.register(name, definition)
    }

    pub fn register_alias(&self, name: &str, alias: &str) -> BeansResult<()> {
        self.inner.registry.register_alias(name, alias)
    }

    /// The definition as registered, before merging.
    pub fn get_bean_definition(&self, name: &str) -> BeansResult<Arc<BeanDefinition>> {
        let (name, _) = strip_factory_prefix(name);
        self.inner.registry.definition(name)
    }

    pub fn get_merged_bean_definition(&self, name: &str) -> BeansResult<Arc<MergedBeanDefinition>> {
        let (name, _) = strip_factory_prefix(name);
        self.inner.registry.merged_definition(name)
    }

    pub fn contains_bean_definition(&self, name: &str) -> bool {
        self.inner.registry.contains(name)
    }

    pub fn get_bean_definition_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Registered names in registration order; aliases are not listed.
    pub fn get_bean_definition_names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Registered names whose definition class is assignable to `required`.
    /// Factory-bean products are not considered.
    pub fn get_bean_definition_names_for_type(&self, required: &TypeDesc) -> Vec<String> {
        self.inner
            .registry
            .names()
            .into_iter()
            .filter(|name| {
                self.inner
                    .registry
                    .merged_definition(name)
                    .ok()
                    .and_then(|merged| merged.class_name().and_then(|c| self.inner.classes.get(c)))
                    .map_or(false, |class| class.is_assignable_to(required))
            })
            .collect()
    }

    // ---- retrieval ----

    /// Returns the bean registered under `name` (or an alias of it).
    ///
    /// For factory beans this is the product; prefix the name with `&` to
    /// get the factory itself.
    pub fn get_bean(&self, name: &str) -> BeansResult<Instance> {
        let (stripped, dereference) = strip_factory_prefix(name);
        let canonical = self.inner.registry.canonical_name(stripped);

        if let Some(shared) = self.inner.singletons.get(&canonical) {
            trace!("Returning cached instance of singleton bean '{}'", canonical);
            return self.object_for_shared_instance(name, &canonical, shared, dereference, true);
        }

        let merged = match self.inner.registry.merged_definition(&canonical) {
            Ok(merged) => merged,
            Err(BeansError::NoSuchBeanDefinition { .. }) => return Err(BeansError::no_such_bean(name)),
            Err(err) => return Err(err),
        };
        if merged.is_abstract() {
            return Err(BeansError::BeanIsAbstract { bean_name: canonical });
        }

        let instance = if merged.is_singleton() {
            self.inner
                .singletons
                .get_or_create(&canonical, || self.create_bean(&canonical, &merged, true))?
        } else {
            self.create_bean(&canonical, &merged, false)?
        };
        self.object_for_shared_instance(name, &canonical, instance, dereference, merged.is_singleton())
    }

    /// Like [`get_bean`](Self::get_bean), failing unless the bean's class
    /// is assignable to `required`.
    pub fn get_bean_of_type(&self, name: &str, required: &TypeDesc) -> BeansResult<Instance> {
        let bean = self.get_bean(name)?;
        if bean.class().is_assignable_to(required) {
            Ok(bean)
        } else {
            Err(BeansError::BeanNotOfRequiredType {
                bean_name: name.to_string(),
                required: required.to_string(),
                actual: bean.class().name().to_string(),
            })
        }
    }

    /// Looks the bean up and reads a clone of its Rust value.
    pub fn get_bean_value<T: Clone + 'static>(&self, name: &str) -> BeansResult<T> {
        let bean = self.get_bean(name)?;
        bean.with(|value: &T| value.clone())
            .ok_or_else(|| BeansError::BeanNotOfRequiredType {
                bean_name: name.to_string(),
                required: std::any::type_name::<T>().to_string(),
                actual: bean.class().name().to_string(),
            })
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        let (stripped, _) = strip_factory_prefix(name);
        let canonical = self.inner.registry.canonical_name(stripped);
        self.inner.singletons.contains(&canonical) || self.inner.registry.contains(&canonical)
    }

    /// Whether `get_bean(name)` always returns the same instance.
    pub fn is_singleton(&self, name: &str) -> BeansResult<bool> {
        let (stripped, dereference) = strip_factory_prefix(name);
        let canonical = self.inner.registry.canonical_name(stripped);

        let class = match self.inner.singletons.get(&canonical) {
            Some(instance) => Some(instance.class().clone()),
            None => {
                let merged = self.get_merged_or_missing(name, &canonical)?;
                if !merged.is_singleton() {
                    return Ok(false);
                }
                if merged.factory_method_name().is_some() {
                    None
                } else {
                    merged.class_name().and_then(|c| self.inner.classes.get(c))
                }
            }
        };
        let product_singleton = class
            .as_ref()
            .and_then(|class| class.capabilities.factory_bean.as_ref())
            .map(|hooks| hooks.singleton);
        Ok(match product_singleton {
            Some(singleton) if !dereference => singleton,
            _ => true,
        })
    }

    /// Other names of the bean; includes the canonical name when `name` is an alias.
    pub fn get_aliases(&self, name: &str) -> Vec<String> {
        let (stripped, _) = strip_factory_prefix(name);
        self.inner.registry.aliases(stripped)
    }

    // ---- type queries ----

    /// Type of the object `get_bean(name)` would return, without creating it.
    /// `None` when the type cannot be determined up front.
    pub fn get_type(&self, name: &str) -> BeansResult<Option<TypeDesc>> {
        Ok(self.predict_type(name)?.map(BeanType::into_type_desc))
    }

    pub fn is_type_match(&self, name: &str, required: &TypeDesc) -> BeansResult<bool> {
        Ok(self
            .predict_type(name)?
            .map_or(false, |bean_type| self.type_matches(&bean_type, required)))
    }

    /// Names of non-abstract beans (and manually registered singletons)
    /// whose objects are assignable to `required`, in registration order.
    pub fn get_bean_names_for_type(&self, required: &TypeDesc) -> Vec<String> {
        let mut names = Vec::new();
        for name in self.inner.registry.names() {
            let abstract_definition = self
                .inner
                .registry
                .merged_definition(&name)
                .map_or(true, |merged| merged.is_abstract());
            if abstract_definition {
                continue;
            }
            if self.is_type_match(&name, required).unwrap_or(false) {
                names.push(name);
            }
        }
        for name in self.inner.singletons.manual_names() {
            if !self.inner.registry.contains(&name) && self.is_type_match(&name, required).unwrap_or(false) {
                names.push(name);
            }
        }
        names
    }

    /// Instantiates every bean matching `required`.
    pub fn get_beans_of_type(&self, required: &TypeDesc) -> BeansResult<Vec<(String, Instance)>> {
        self.get_bean_names_for_type(required)
            .into_iter()
            .map(|name| self.get_bean(&name).map(|bean| (name, bean)))
            .collect()
    }

    /// Names of all live singletons, in creation order.
    pub fn get_singleton_names(&self) -> Vec<String> {
        self.inner.singletons.creation_order()
    }

    pub fn get_singleton_count(&self) -> usize {
        self.inner.singletons.len()
    }

    /// Whether the singleton is being built right now (on any thread).
    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        let (stripped, _) = strip_factory_prefix(name);
        let canonical = self.inner.registry.canonical_name(stripped);
        self.inner.singletons.is_in_creation(&canonical)
    }

    /// Depth of nested bean creation on the calling thread.
    pub fn creation_depth(&self) -> usize {
        self.inner.creation.depth()
    }

    // ---- configuration ----

    /// Adds an externally created object as a singleton.
    pub fn register_singleton(&self, name: &str, instance: Instance) -> BeansResult<()> {
        self.inner.singletons.register(name, instance)
    }

    /// Post-processors apply to beans created after they are added.
    pub fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        self.inner.post_processors.write().push(processor);
    }

    pub fn bean_post_processor_count(&self) -> usize {
        self.inner.post_processors.read().len()
    }

    /// Registers a converter used for property values and constructor
    /// arguments of the required type.
    pub fn register_converter(&self, required: TypeDesc, converter: Arc<dyn TypeConverter>) {
        self.inner.converters.register(required, converter);
    }

    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.inner.converters
    }

    /// Properties of this type are never autowired or dependency-checked.
    pub fn ignore_dependency_type(&self, ty: TypeDesc) {
        self.inner.ignored_types.write().insert(ty);
    }

    // ---- external objects ----

    /// Creates a new instance of `class_name` with autowiring. The result is
    /// not registered anywhere.
    pub fn autowire(&self, class_name: &str, mode: AutowireMode, check: DependencyCheck) -> BeansResult<Instance> {
        let definition = BeanDefinition::new(class_name)
            .prototype()
            .autowire(mode)
            .dependency_check(check);
        let merged = MergedBeanDefinition::root(&definition);
        self.create_bean(class_name, &merged, false)
    }

    /// Autowires the properties of an existing object by name or by type.
    /// No init callbacks run.
    pub fn autowire_bean_properties(
        &self,
        instance: &Instance,
        mode: AutowireMode,
        check: DependencyCheck,
    ) -> BeansResult<()> {
        if !matches!(mode, AutowireMode::ByName | AutowireMode::ByType) {
            return Err(BeansError::creation(
                instance.class().name(),
                None,
                format!("Just constants ByName and ByType allowed, not {:?}", mode),
                None,
            ));
        }
        let definition = BeanDefinition::new(instance.class().name())
            .prototype()
            .autowire(mode)
            .dependency_check(check);
        let merged = MergedBeanDefinition::root(&definition);
        let wrapper = self.wrapper_for(instance.clone());
        self.populate_bean(instance.class().name(), &merged, &wrapper)
    }

    // ---- internals shared by the submodules ----

    pub(crate) fn wrapper_for(&self, instance: Instance) -> BeanWrapper {
        BeanWrapper::with_converters(instance, self.inner.converters.clone())
    }

    pub(crate) fn post_processors(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.inner.post_processors.read().clone()
    }

    pub(crate) fn is_ignored_type(&self, ty: &TypeDesc) -> bool {
        self.inner.ignored_types.read().contains(ty)
    }

    fn get_merged_or_missing(&self, requested: &str, canonical: &str) -> BeansResult<Arc<MergedBeanDefinition>> {
        match self.inner.registry.merged_definition(canonical) {
            Err(BeansError::NoSuchBeanDefinition { .. }) => Err(BeansError::no_such_bean(requested)),
            other => other,
        }
    }

    /// Turns a raw bean into what was asked for: the factory-bean product
    /// unless `&` was used, the instance itself otherwise.
    fn object_for_shared_instance(
        &self,
        requested: &str,
        canonical: &str,
        instance: Instance,
        dereference: bool,
        cache_product: bool,
    ) -> BeansResult<Instance> {
        let class = instance.class().clone();
        if dereference {
            if !class.is_factory_bean() {
                return Err(BeansError::BeanIsNotAFactory {
                    bean_name: canonical.to_string(),
                    actual: class.name().to_string(),
                });
            }
            return Ok(instance);
        }
        let Some(hooks) = class.capabilities.factory_bean.as_ref() else {
            return Ok(instance);
        };

        let shared = cache_product && hooks.singleton;
        if shared {
            if let Some(product) = self.inner.singletons.product(canonical) {
                return Ok(product);
            }
        }
        let _lock = shared.then(|| self.inner.singletons.lock());
        if shared {
            if let Some(product) = self.inner.singletons.product(canonical) {
                return Ok(product);
            }
        }

        trace!("Obtaining product of factory bean '{}'", canonical);
        let produced = {
            let state = instance.read_any();
            (hooks.get_object)(&**state)
        }
        .map_err(|err| BeansError::creation(requested, None, "FactoryBean threw exception on object creation", Some(err)))?;

        match produced {
            Value::Object(product) => {
                if shared {
                    self.inner.singletons.cache_product(canonical, product.clone());
                }
                Ok(product)
            }
            Value::Null => Err(BeansError::FactoryBeanCircularReference {
                bean_name: canonical.to_string(),
            }),
            other => Err(BeansError::creation(
                requested,
                None,
                format!(
                    "FactoryBean produced a value of type [{}] instead of a bean object",
                    other.type_name()
                ),
                None,
            )),
        }
    }

    /// Type of what `name` resolves to, from the live singleton when there
    /// is one and from the definition otherwise.
    pub(crate) fn predict_type(&self, name: &str) -> BeansResult<Option<BeanType>> {
        let (stripped, dereference) = strip_factory_prefix(name);
        let canonical = self.inner.registry.canonical_name(stripped);

        if let Some(instance) = self.inner.singletons.get(&canonical) {
            let class = instance.class().clone();
            return Ok(Some(match &class.capabilities.factory_bean {
                Some(_) if dereference => BeanType::Class(class),
                Some(hooks) => match self.inner.singletons.product(&canonical) {
                    Some(product) => BeanType::Class(product.class().clone()),
                    None => BeanType::Declared(hooks.object_type.clone()),
                },
                None => BeanType::Class(class),
            }));
        }

        let merged = self.get_merged_or_missing(name, &canonical)?;
        if let Some(method) = merged.factory_method_name() {
            let returns = match merged.factory_bean_name() {
                Some(factory_bean) => self.predict_type(&format!("{}{}", FACTORY_BEAN_PREFIX, factory_bean))?.and_then(
                    |factory_type| match factory_type {
                        BeanType::Class(class) => class.methods_named(method).next().map(|m| m.return_type().clone()),
                        BeanType::Declared(_) => None,
                    },
                ),
                None => merged
                    .class_name()
                    .and_then(|c| self.inner.classes.get(c))
                    .and_then(|class| class.static_methods_named(method).next().map(|m| m.return_type().clone())),
            };
            return Ok(returns.map(BeanType::Declared));
        }

        let Some(class) = merged.class_name().and_then(|c| self.inner.classes.get(c)) else {
            return Ok(None);
        };
        Ok(Some(match &class.capabilities.factory_bean {
            Some(hooks) if !dereference => BeanType::Declared(hooks.object_type.clone()),
            _ => BeanType::Class(class),
        }))
    }

    pub(crate) fn type_matches(&self, bean_type: &BeanType, required: &TypeDesc) -> bool {
        match bean_type {
            BeanType::Class(class) => class.is_assignable_to(required),
            BeanType::Declared(TypeDesc::Bean(class_name)) => match self.inner.classes.get(class_name) {
                Some(class) => class.is_assignable_to(required),
                None => {
                    matches!(required, TypeDesc::Any) || required.accepts_root() || required == &TypeDesc::Bean(class_name.clone())
                }
            },
            BeanType::Declared(declared) => declared == required || matches!(required, TypeDesc::Any),
        }
    }
}
