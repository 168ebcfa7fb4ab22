use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::introspect::{Class, TypeDesc};
use crate::value::{Instance, Value, ValueMap};

/// Rust types with a declared [`TypeDesc`].
pub trait ValueType {
    fn type_desc() -> TypeDesc;
}

/// Extraction of a Rust value from a [`Value`] that already has the
/// declared type. Returns a message on mismatch.
pub trait FromValue: ValueType + Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

/// Conversion of a Rust value into a [`Value`].
pub trait IntoValue: ValueType {
    fn into_value(self) -> Value;
}

fn mismatch(expected: &TypeDesc, value: &Value) -> String {
    format!("expected {} but got {}", expected, value.type_name())
}

impl ValueType for Value {
    fn type_desc() -> TypeDesc {
        TypeDesc::Any
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl ValueType for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::Bool
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(&TypeDesc::Bool, &other)),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

macro_rules! impl_int {
    ($($t:ty),*) => {$(
        impl ValueType for $t {
            fn type_desc() -> TypeDesc {
                TypeDesc::Int
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, String> {
                match value {
                    Value::Int(i) => <$t>::try_from(i)
                        .map_err(|_| format!("{} is out of range for {}", i, stringify!($t))),
                    other => Err(mismatch(&TypeDesc::Int, &other)),
                }
            }
        }

        impl IntoValue for $t {
            #[allow(clippy::unnecessary_cast)]
            fn into_value(self) -> Value {
                Value::Int(self as i64)
            }
        }
    )*};
}

// Only types that widen losslessly into i64.
impl_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl ValueType for $t {
            fn type_desc() -> TypeDesc {
                TypeDesc::Float
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, String> {
                match value {
                    Value::Float(x) => Ok(x as $t),
                    Value::Int(i) => Ok(i as $t),
                    other => Err(mismatch(&TypeDesc::Float, &other)),
                }
            }
        }

        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::Float(f64::from(self))
            }
        }
    )*};
}

impl_float!(f32, f64);

macro_rules! impl_simple {
    ($t:ty, $desc:expr, $variant:ident) => {
        impl ValueType for $t {
            fn type_desc() -> TypeDesc {
                $desc
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, String> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch(&$desc, &other)),
                }
            }
        }

        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

impl_simple!(String, TypeDesc::Str, Str);
impl_simple!(PathBuf, TypeDesc::Path, Path);
impl_simple!(Url, TypeDesc::Url, Url);
impl_simple!(Arc<Class>, TypeDesc::Class, Class);
impl_simple!(Instance, TypeDesc::bean(crate::introspect::OBJECT), Object);
impl_simple!(ValueMap, TypeDesc::map_of(TypeDesc::Any), Map);

impl<T: ValueType> ValueType for Option<T> {
    fn type_desc() -> TypeDesc {
        T::type_desc()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::array_of(T::type_desc())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch(&Self::type_desc(), &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: ValueType> ValueType for HashMap<String, T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::map_of(T::type_desc())
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Map(map) => map.into_iter().map(|(k, v)| T::from_value(v).map(|v| (k, v))).collect(),
            other => Err(mismatch(&Self::type_desc(), &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for HashMap<String, T> {
    fn into_value(self) -> Value {
        Value::Map(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }
}
