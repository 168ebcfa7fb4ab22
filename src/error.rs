//! Error types for the bean container.
//!
//! [`BeansError`] is the taxonomy surfaced by every [`BeanFactory`](crate::BeanFactory)
//! operation. Failures raised by the object graph accessor live in
//! [`PropertyAccessError`] and are carried inside `BeansError` either directly
//! or as the source of a [`BeansError::BeanCreation`].

use std::error::Error;
use std::fmt;

pub use crate::wrapper::{PropertyAccessError, PropertyAccessErrors};

/// Boxed error used for failures raised by user callbacks (constructors,
/// setters, init/destroy methods, post-processors).
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Where an unsatisfied dependency was expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionPoint {
    /// A bean property, by name.
    Property(String),
    /// A constructor or factory-method argument, by index.
    ConstructorArgument(usize),
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionPoint::Property(name) => write!(f, "bean property '{}'", name),
            InjectionPoint::ConstructorArgument(index) => {
                write!(f, "constructor argument with index {}", index)
            }
        }
    }
}

fn in_resource(resource: &Option<String>) -> String {
    match resource {
        Some(desc) => format!(" defined in {}", desc),
        None => String::new(),
    }
}

/// Errors raised by the bean container.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanFactory, BeansError};
///
/// let factory = BeanFactory::new();
/// match factory.get_bean("missing") {
///     Err(BeansError::NoSuchBeanDefinition { name, .. }) => {
///         assert_eq!(name.as_deref(), Some("missing"));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BeansError {
    /// Malformed definition, registry name conflict or unresolvable parent.
    #[error("Error registering bean with name '{bean_name}'{}: {message}", in_resource(.resource))]
    BeanDefinitionStore {
        resource: Option<String>,
        bean_name: String,
        message: String,
    },

    /// Unknown bean name, or no unique bean for a required type.
    #[error("{message}")]
    NoSuchBeanDefinition {
        name: Option<String>,
        message: String,
    },

    /// The bean exists but is not assignable to the requested type.
    #[error("Bean named '{bean_name}' must be of type [{required}], but was actually of type [{actual}]")]
    BeanNotOfRequiredType {
        bean_name: String,
        required: String,
        actual: String,
    },

    /// Instantiation, population or initialization failed.
    #[error("Error creating bean with name '{bean_name}'{}: {message}", in_resource(.resource))]
    BeanCreation {
        bean_name: String,
        resource: Option<String>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Autowiring or dependency checking could not satisfy an injection point.
    #[error("Error creating bean with name '{bean_name}'{}: Unsatisfied dependency expressed through {injection_point}: {message}", in_resource(.resource))]
    UnsatisfiedDependency {
        bean_name: String,
        resource: Option<String>,
        injection_point: InjectionPoint,
        message: String,
    },

    /// A `&`-prefixed lookup hit a bean that is not a factory bean.
    #[error("Bean named '{bean_name}' must be a factory bean, but was actually of type [{actual}]")]
    BeanIsNotAFactory { bean_name: String, actual: String },

    /// A factory bean produced no object, usually because it was requested
    /// through a circular reference before it finished initializing.
    #[error("Error creating bean with name '{bean_name}': FactoryBean returned null object: probably not fully initialized (maybe due to circular bean reference)")]
    FactoryBeanCircularReference { bean_name: String },

    /// The bean was requested again while still being constructed and no
    /// early reference was available.
    #[error("Error creating bean with name '{bean_name}': Requested bean is currently in creation: Is there an unresolvable circular reference?")]
    BeanCurrentlyInCreation { bean_name: String },

    /// Abstract definitions are templates only.
    #[error("Error creating bean with name '{bean_name}': Bean definition is abstract")]
    BeanIsAbstract { bean_name: String },

    /// The class named by a definition is not registered.
    #[error("Cannot find class [{class_name}] for bean with name '{bean_name}'{}", in_resource(.resource))]
    CannotLoadBeanClass {
        bean_name: String,
        class_name: String,
        resource: Option<String>,
    },

    /// A property access failure raised outside bean creation.
    #[error(transparent)]
    PropertyAccess(#[from] PropertyAccessError),
}

impl BeansError {
    pub(crate) fn no_such_bean(name: &str) -> Self {
        BeansError::NoSuchBeanDefinition {
            name: Some(name.to_string()),
            message: format!("No bean named '{}' is defined", name),
        }
    }

    pub(crate) fn creation(
        bean_name: &str,
        resource: Option<&str>,
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        BeansError::BeanCreation {
            bean_name: bean_name.to_string(),
            resource: resource.map(str::to_string),
            message: message.into(),
            source,
        }
    }

    pub(crate) fn store(bean_name: &str, resource: Option<&str>, message: impl Into<String>) -> Self {
        BeansError::BeanDefinitionStore {
            resource: resource.map(str::to_string),
            bean_name: bean_name.to_string(),
            message: message.into(),
        }
    }

    /// Name of the bean the error refers to, when there is one.
    pub fn bean_name(&self) -> Option<&str> {
        match self {
            BeansError::BeanDefinitionStore { bean_name, .. }
            | BeansError::BeanNotOfRequiredType { bean_name, .. }
            | BeansError::BeanCreation { bean_name, .. }
            | BeansError::UnsatisfiedDependency { bean_name, .. }
            | BeansError::BeanIsNotAFactory { bean_name, .. }
            | BeansError::FactoryBeanCircularReference { bean_name }
            | BeansError::BeanCurrentlyInCreation { bean_name }
            | BeansError::BeanIsAbstract { bean_name }
            | BeansError::CannotLoadBeanClass { bean_name, .. } => Some(bean_name),
            BeansError::NoSuchBeanDefinition { name, .. } => name.as_deref(),
            BeansError::PropertyAccess(_) => None,
        }
    }

    /// Whether this error belongs to the creation family, which is passed
    /// through unchanged by enclosing bean creations.
    pub(crate) fn is_creation_failure(&self) -> bool {
        matches!(
            self,
            BeansError::BeanCreation { .. }
                | BeansError::UnsatisfiedDependency { .. }
                | BeansError::BeanCurrentlyInCreation { .. }
                | BeansError::FactoryBeanCircularReference { .. }
        )
    }

    /// Walks the source chain below `self` for an error of type `E`.
    ///
    /// ```rust
    /// use ferrous_beans::{BeansError, PropertyAccessError};
    ///
    /// let err = BeansError::BeanCreation {
    ///     bean_name: "a".into(),
    ///     resource: None,
    ///     message: "boom".into(),
    ///     source: Some(Box::new(BeansError::BeanIsAbstract { bean_name: "b".into() })),
    /// };
    /// assert!(err.find_cause::<BeansError>().is_some());
    /// assert!(err.find_cause::<PropertyAccessError>().is_none());
    /// ```
    pub fn find_cause<E: Error + 'static>(&self) -> Option<&E> {
        let mut current: Option<&(dyn Error + 'static)> = self.source();
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<E>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }

    /// Innermost `BeansError` in the source chain, or `self`.
    pub fn root_bean_error(&self) -> &BeansError {
        let mut deepest = self;
        let mut current: Option<&(dyn Error + 'static)> = self.source();
        while let Some(err) = current {
            if let Some(beans) = err.downcast_ref::<BeansError>() {
                deepest = beans;
            }
            current = err.source();
        }
        deepest
    }
}

/// Result type for container operations.
pub type BeansResult<T> = Result<T, BeansError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_error_mentions_resource() {
        let err = BeansError::creation("userDao", Some("class path resource [beans.xml]"), "boom", None);
        assert_eq!(
            err.to_string(),
            "Error creating bean with name 'userDao' defined in class path resource [beans.xml]: boom"
        );
        assert_eq!(err.bean_name(), Some("userDao"));
    }

    #[test]
    fn unsatisfied_dependency_names_injection_point() {
        let err = BeansError::UnsatisfiedDependency {
            bean_name: "a".into(),
            resource: None,
            injection_point: InjectionPoint::ConstructorArgument(1),
            message: "no match".into(),
        };
        assert!(err.to_string().contains("constructor argument with index 1"));
    }

    #[test]
    fn root_bean_error_unwraps_nested_creation_failures() {
        let inner = BeansError::BeanCurrentlyInCreation { bean_name: "b".into() };
        let outer = BeansError::creation("a", None, "wrapped", Some(Box::new(inner)));
        assert!(matches!(
            outer.root_bean_error(),
            BeansError::BeanCurrentlyInCreation { bean_name } if bean_name == "b"
        ));
    }
}
