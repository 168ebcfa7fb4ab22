use std::fmt;

use crate::error::BoxError;
use crate::introspect::TypeDesc;
use crate::value::Value;

/// Failures raised while reading or writing bean properties.
#[derive(Debug, thiserror::Error)]
pub enum PropertyAccessError {
    #[error("Invalid property '{property}' of bean class [{bean_class}]: Bean property '{property}' is not readable or has an invalid getter method")]
    NotReadable { bean_class: String, property: String },

    #[error("Invalid property '{property}' of bean class [{bean_class}]: Bean property '{property}' is not writable or has an invalid setter method")]
    NotWritable { bean_class: String, property: String },

    #[error("Failed to convert property value of type [{}] to required type [{required}] for property '{property}': {message}", .value.type_name())]
    TypeMismatch {
        property: String,
        old_value: Option<Value>,
        value: Value,
        required: TypeDesc,
        message: String,
    },

    #[error("Property '{property}' threw exception: {source}")]
    MethodInvocation {
        property: String,
        value: Value,
        #[source]
        source: BoxError,
    },

    #[error("Invalid property '{property}' of bean class [{bean_class}]: Value of nested property '{property}' is null")]
    NullValueInNestedPath { bean_class: String, property: String },

    #[error("Invalid property '{property}' of bean class [{bean_class}]: {reason}")]
    InvalidPropertyPath {
        bean_class: String,
        property: String,
        reason: String,
    },

    #[error(transparent)]
    Aggregate(#[from] PropertyAccessErrors),
}

impl PropertyAccessError {
    /// Full property path the error refers to.
    pub fn property_name(&self) -> Option<&str> {
        match self {
            PropertyAccessError::NotReadable { property, .. }
            | PropertyAccessError::NotWritable { property, .. }
            | PropertyAccessError::TypeMismatch { property, .. }
            | PropertyAccessError::MethodInvocation { property, .. }
            | PropertyAccessError::NullValueInNestedPath { property, .. }
            | PropertyAccessError::InvalidPropertyPath { property, .. } => Some(property),
            PropertyAccessError::Aggregate(_) => None,
        }
    }

    /// Type mismatches and setter failures are collected during batch
    /// updates instead of aborting them.
    pub(crate) fn is_collectable(&self) -> bool {
        matches!(
            self,
            PropertyAccessError::TypeMismatch { .. } | PropertyAccessError::MethodInvocation { .. }
        )
    }
}

/// The individual failures of a batch property update.
#[derive(Debug)]
pub struct PropertyAccessErrors {
    errors: Vec<PropertyAccessError>,
}

impl PropertyAccessErrors {
    pub(crate) fn new(errors: Vec<PropertyAccessError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[PropertyAccessError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The failure recorded for `property`, if any.
    pub fn error_for(&self, property: &str) -> Option<&PropertyAccessError> {
        self.errors.iter().find(|e| e.property_name() == Some(property))
    }

    pub fn into_errors(self) -> Vec<PropertyAccessError> {
        self.errors
    }
}

impl fmt::Display for PropertyAccessErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} property access error(s) occurred:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PropertyAccessErrors {}

/// Result type for property access.
pub type PropertyAccessResult<T> = Result<T, PropertyAccessError>;
