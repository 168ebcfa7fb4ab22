//! Declared types of properties, constructor parameters and method returns.

use std::fmt;

use crate::introspect::Class;
use crate::value::Value;

/// Name of the implicit root of every class hierarchy.
pub const OBJECT: &str = "Object";

/// Declared type of a property, parameter or return value.
///
/// Bean types are referenced by class or interface name; assignability is
/// decided against the runtime [`Class`] hierarchy of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// Accepts any value, including null.
    Any,
    Bool,
    Int,
    Float,
    Str,
    Path,
    Url,
    /// A class object (the value of a `Class`-typed property).
    Class,
    Array(Box<TypeDesc>),
    /// String-keyed map with the given value type.
    Map(Box<TypeDesc>),
    /// A bean of the named class or interface.
    Bean(String),
}

impl TypeDesc {
    pub fn bean(name: impl Into<String>) -> Self {
        TypeDesc::Bean(name.into())
    }

    pub fn array_of(element: TypeDesc) -> Self {
        TypeDesc::Array(Box::new(element))
    }

    pub fn map_of(value: TypeDesc) -> Self {
        TypeDesc::Map(Box::new(value))
    }

    /// Primitive types reject null.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDesc::Bool | TypeDesc::Int | TypeDesc::Float)
    }

    /// Simple types are excluded from object autowiring and count as
    /// "simple" for dependency checking: primitives, strings, class objects
    /// and arrays of those.
    pub fn is_simple(&self) -> bool {
        match self {
            TypeDesc::Bool | TypeDesc::Int | TypeDesc::Float | TypeDesc::Str | TypeDesc::Class => true,
            TypeDesc::Array(element) => element.is_simple(),
            _ => false,
        }
    }

    /// Type of the elements reached by one key step into a value of this type.
    pub fn element_type(&self) -> TypeDesc {
        match self {
            TypeDesc::Array(element) | TypeDesc::Map(element) => (**element).clone(),
            _ => TypeDesc::Any,
        }
    }

    /// Whether `value` can be stored in a slot of this type without conversion.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeDesc::Any, _) => true,
            (ty, Value::Null) => !ty.is_primitive(),
            (TypeDesc::Bool, Value::Bool(_)) => true,
            (TypeDesc::Int, Value::Int(_)) => true,
            (TypeDesc::Float, Value::Float(_) | Value::Int(_)) => true,
            (TypeDesc::Str, Value::Str(_)) => true,
            (TypeDesc::Path, Value::Path(_)) => true,
            (TypeDesc::Url, Value::Url(_)) => true,
            (TypeDesc::Class, Value::Class(_)) => true,
            (TypeDesc::Array(element), Value::List(items)) => items.iter().all(|item| element.accepts(item)),
            (TypeDesc::Map(element), Value::Map(map)) => map.values().all(|item| element.accepts(item)),
            (TypeDesc::Bean(name), Value::Object(instance)) => instance.class().is_assignable_to_name(name),
            _ => false,
        }
    }

    /// Whether the implicit root class is assignable to this type.
    pub(crate) fn accepts_root(&self) -> bool {
        match self {
            TypeDesc::Any => true,
            TypeDesc::Bean(name) => name == OBJECT,
            _ => false,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Any => f.write_str(OBJECT),
            TypeDesc::Bool => f.write_str("bool"),
            TypeDesc::Int => f.write_str("int"),
            TypeDesc::Float => f.write_str("float"),
            TypeDesc::Str => f.write_str("String"),
            TypeDesc::Path => f.write_str("Path"),
            TypeDesc::Url => f.write_str("Url"),
            TypeDesc::Class => f.write_str("Class"),
            TypeDesc::Array(element) => write!(f, "{}[]", element),
            TypeDesc::Map(element) => write!(f, "Map<String, {}>", element),
            TypeDesc::Bean(name) => f.write_str(name),
        }
    }
}

/// Distance between a declared parameter type and an argument value.
///
/// Scalars that match exactly (or widen, like int to float) and null score 0,
/// a scalar bound to `Any` scores 1. For objects the superclass chain is
/// walked from the direct superclass up to the implicit root, adding one per
/// ancestor that is still assignable to the declared type. Smaller is closer.
pub fn type_distance(declared: &TypeDesc, value: &Value) -> u32 {
    match value {
        Value::Object(instance) => class_distance(instance.class(), declared),
        Value::Null => 0,
        _ if matches!(declared, TypeDesc::Any) => 1,
        _ => 0,
    }
}

fn class_distance(class: &Class, declared: &TypeDesc) -> u32 {
    let mut weight = 0;
    let mut ancestor = class.superclass();
    loop {
        match ancestor {
            Some(parent) => {
                if !parent.is_assignable_to(declared) {
                    return weight;
                }
                weight += 1;
                ancestor = parent.superclass();
            }
            None => {
                if declared.accepts_root() {
                    weight += 1;
                }
                return weight;
            }
        }
    }
}

/// Sum of [`type_distance`] over an argument list.
pub fn type_difference_weight(params: &[TypeDesc], args: &[Value]) -> u32 {
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| type_distance(param, arg))
        .sum()
}
