//! # ferrous-beans
//!
//! Bean-definition driven dependency injection for Rust.
//!
//! ## Features
//!
//! - **Declarative definitions**: beans are described by [`BeanDefinition`]s with
//!   property values, constructor arguments, parent definitions and lifecycle settings
//! - **Autowiring**: by name, by type, by constructor, or autodetected
//! - **Circular references**: property cycles between singletons resolve through
//!   early exposure; constructor cycles are reported
//! - **Lifecycle**: name/factory callbacks, post-processors, init and destroy methods,
//!   destruction in dependency order
//! - **Property paths**: [`BeanWrapper`] reads and writes `a.b[2].c` and `map['key']`
//!   paths with pluggable type conversion
//! - **Thread-safe**: singletons are built at most once under concurrent access
//!
//! ## Quick Start
//!
//! Rust has no runtime reflection, so each bean type is described once with a
//! [`ClassBuilder`] and registered with the factory. Definitions then refer to
//! classes by name.
//!
//! ```rust
//! use ferrous_beans::{BeanDefinition, BeanFactory, ClassBuilder, Instance, TypeDesc};
//!
//! #[derive(Default)]
//! struct Database { url: String }
//!
//! #[derive(Default)]
//! struct UserService { db: Option<Instance>, page_size: i64 }
//!
//! let factory = BeanFactory::new();
//! factory.register_class(
//!     ClassBuilder::<Database>::new("Database")
//!         .default_constructor()
//!         .property("url", |d: &Database| d.url.clone(), |d: &mut Database, v: String| d.url = v)
//!         .build(),
//! );
//! factory.register_class(
//!     ClassBuilder::<UserService>::new("UserService")
//!         .default_constructor()
//!         .property_as("db", TypeDesc::bean("Database"), |s: &UserService| s.db.clone(), |s: &mut UserService, v: Option<Instance>| s.db = v)
//!         .property("pageSize", |s: &UserService| s.page_size, |s: &mut UserService, v: i64| s.page_size = v)
//!         .build(),
//! );
//!
//! factory
//!     .register_bean_definition("database", BeanDefinition::new("Database").property("url", "postgres://localhost"))
//!     .unwrap();
//! factory
//!     .register_bean_definition(
//!         "users",
//!         BeanDefinition::new("UserService").property_ref("db", "database").property("pageSize", "25"),
//!     )
//!     .unwrap();
//!
//! let users = factory.get_bean("users").unwrap();
//! assert_eq!(users.with(|s: &UserService| s.page_size), Some(25));
//! let db = users.with(|s: &UserService| s.db.clone()).flatten().unwrap();
//! assert!(db.ptr_eq(&factory.get_bean("database").unwrap()));
//! ```
//!
//! ## Scopes
//!
//! - **Singleton** (default): one shared instance per name
//! - **Prototype**: a fresh instance on every [`BeanFactory::get_bean`]
//!
//! ## Definition Inheritance
//!
//! ```rust
//! use ferrous_beans::{BeanDefinition, BeanFactory, ClassBuilder};
//!
//! #[derive(Default)]
//! struct Pool { size: i64, name: String }
//!
//! let factory = BeanFactory::new();
//! factory.register_class(
//!     ClassBuilder::<Pool>::new("Pool")
//!         .default_constructor()
//!         .property("size", |p: &Pool| p.size, |p: &mut Pool, v: i64| p.size = v)
//!         .property("name", |p: &Pool| p.name.clone(), |p: &mut Pool, v: String| p.name = v)
//!         .build(),
//! );
//! factory
//!     .register_bean_definition("template", BeanDefinition::new("Pool").property("size", 8).abstract_definition())
//!     .unwrap();
//! factory
//!     .register_bean_definition("readPool", BeanDefinition::child_of("template").property("name", "read"))
//!     .unwrap();
//!
//! let pool = factory.get_bean("readPool").unwrap();
//! assert_eq!(pool.with(|p: &Pool| (p.size, p.name.clone())), Some((8, "read".to_string())));
//! assert!(factory.get_bean("template").is_err());
//! ```

// Module declarations
pub mod config;
pub mod definition;
pub mod error;
pub mod factory;
pub mod introspect;
pub mod registry;
pub mod scope;
pub mod traits;
pub mod value;
pub mod wrapper;

// Internal modules
mod internal;

// Re-export core types
pub use config::{
    ConfigError, ConfigProvider, ConfigSource, ConfigValue, EnvironmentConfigSource, FactoryConfig, MapConfigSource,
};
pub use definition::{
    AutowireMode, BeanDefinition, BeanValue, ConstructorArgumentValues, DependencyCheck, MergedBeanDefinition,
    PropertyValue, PropertyValues, RuntimeBeanReference, ValueHolder,
};
pub use error::{BeansError, BeansResult, BoxError, InjectionPoint};
pub use factory::{BeanFactory, FACTORY_BEAN_PREFIX};
pub use introspect::{
    type_difference_weight, type_distance, Args, CallbackResult, Class, ClassBuilder, ClassRegistry,
    ConstructorDescriptor, MethodDescriptor, PropertyDescriptor, StaticMethodDescriptor, TypeDesc, OBJECT,
};
pub use registry::BeanDefinitionRegistry;
pub use scope::BeanScope;
pub use traits::BeanPostProcessor;
pub use value::{FromValue, Instance, IntoValue, Value, ValueMap, ValueType};
pub use wrapper::{
    canonical_property_path, BeanWrapper, ConversionError, ConverterRegistry, PropertyAccessError,
    PropertyAccessErrors, PropertyAccessResult, TypeConverter,
};
