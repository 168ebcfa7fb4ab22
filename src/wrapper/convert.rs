//! Value conversion for property writes and constructor arguments.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use crate::internal::FastMap;
use crate::introspect::{ClassRegistry, TypeDesc};
use crate::value::{Value, ValueMap};
use crate::wrapper::path;

/// A conversion failure, reported as a type mismatch by the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ConversionError {
    pub message: String,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// User-supplied conversion for a type or a specific property path.
///
/// Text values go through [`convert_text`](TypeConverter::convert_text);
/// anything else goes through [`convert_value`](TypeConverter::convert_value),
/// which passes the value through unchanged by default.
///
/// Closures taking `&str` implement this trait:
///
/// ```rust
/// use ferrous_beans::{ConversionError, TypeConverter, Value};
///
/// let upper = |text: &str| -> Result<Value, ConversionError> { Ok(Value::from(text.to_uppercase())) };
/// assert_eq!(upper.convert_text("abc").unwrap(), Value::from("ABC"));
/// ```
pub trait TypeConverter: Send + Sync {
    fn convert_text(&self, text: &str) -> Result<Value, ConversionError>;

    fn convert_value(&self, value: Value) -> Result<Value, ConversionError> {
        Ok(value)
    }
}

impl<F> TypeConverter for F
where
    F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync,
{
    fn convert_text(&self, text: &str) -> Result<Value, ConversionError> {
        self(text)
    }
}

struct PathConverter {
    required: Option<TypeDesc>,
    converter: Arc<dyn TypeConverter>,
}

#[derive(Default)]
struct Converters {
    by_type: FastMap<TypeDesc, Arc<dyn TypeConverter>>,
    by_path: FastMap<String, Vec<PathConverter>>,
}

/// Custom converters plus the built-in conversions.
///
/// Lookup order for a property path and required type: a converter
/// registered for the exact path (canonical form), then for the path with
/// all keys stripped, then one registered for the type. Path converters
/// registered with a type only apply when that type is required.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: RwLock<Converters>,
    classes: Option<Arc<ClassRegistry>>,
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let converters = self.converters.read();
        f.debug_struct("ConverterRegistry")
            .field("types", &converters.by_type.keys().collect::<Vec<_>>())
            .field("paths", &converters.by_path.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that can turn class names into class objects.
    pub fn with_classes(classes: Arc<ClassRegistry>) -> Self {
        Self {
            converters: RwLock::new(Converters::default()),
            classes: Some(classes),
        }
    }

    pub fn register(&self, required: TypeDesc, converter: Arc<dyn TypeConverter>) {
        self.converters.write().by_type.insert(required, converter);
    }

    /// Registers a converter for one property path, optionally restricted to
    /// a required type.
    pub fn register_for_path(&self, required: Option<TypeDesc>, property_path: &str, converter: Arc<dyn TypeConverter>) {
        let key = path::canonical_property_path(property_path);
        let mut converters = self.converters.write();
        let entries = converters.by_path.entry(key).or_default();
        entries.retain(|entry| entry.required != required);
        entries.push(PathConverter { required, converter });
    }

    /// The custom converter that applies to `property_path` and `required`.
    pub fn find(&self, property_path: Option<&str>, required: &TypeDesc) -> Option<Arc<dyn TypeConverter>> {
        let converters = self.converters.read();
        if let Some(property_path) = property_path {
            let canonical = path::canonical_property_path(property_path);
            let stripped = path::strip_keys(&canonical);
            for candidate in [canonical.as_str(), stripped.as_str()] {
                if let Some(entries) = converters.by_path.get(candidate) {
                    let found = entries
                        .iter()
                        .find(|e| e.required.as_ref().map_or(true, |t| t == required));
                    if let Some(entry) = found {
                        return Some(entry.converter.clone());
                    }
                }
            }
        }
        converters.by_type.get(required).cloned()
    }

    /// Converts `value` so that it fits `required`, applying a matching
    /// custom converter first and the built-in conversions after.
    pub fn convert_if_necessary(
        &self,
        property_path: Option<&str>,
        value: Value,
        required: &TypeDesc,
    ) -> Result<Value, ConversionError> {
        let value = match self.find(property_path, required) {
            Some(converter) => match value {
                Value::Str(text) => converter.convert_text(&text)?,
                other => converter.convert_value(other)?,
            },
            None => value,
        };
        if required.accepts(&value) {
            return Ok(value);
        }

        match (required, value) {
            (TypeDesc::Array(element), Value::List(items)) => self.convert_elements(property_path, items, element),
            (TypeDesc::Array(element), Value::Str(text)) => {
                let items = split_comma_delimited(&text).into_iter().map(Value::Str).collect();
                self.convert_elements(property_path, items, element)
            }
            (TypeDesc::Map(element), Value::Map(map)) => self.convert_entries(property_path, map, element),
            (TypeDesc::Map(element), Value::Str(text)) => {
                self.convert_entries(property_path, parse_properties(&text), element)
            }
            (TypeDesc::Array(element), single) if !matches!(single, Value::Null) => {
                self.convert_elements(property_path, vec![single], element)
            }
            (_, Value::Str(text)) => self.convert_text(&text, required),
            (_, other) => Err(ConversionError::new(format!(
                "Cannot convert value of type [{}] to required type [{}]: no matching editors or conversion strategy found",
                other.type_name(),
                required
            ))),
        }
    }

    fn convert_elements(
        &self,
        property_path: Option<&str>,
        items: Vec<Value>,
        element: &TypeDesc,
    ) -> Result<Value, ConversionError> {
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let element_path = property_path.map(|p| format!("{}[{}]", p, i));
                self.convert_if_necessary(element_path.as_deref(), item, element)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn convert_entries(
        &self,
        property_path: Option<&str>,
        map: ValueMap,
        element: &TypeDesc,
    ) -> Result<Value, ConversionError> {
        map.into_iter()
            .map(|(key, item)| {
                let element_path = property_path.map(|p| format!("{}[{}]", p, key));
                self.convert_if_necessary(element_path.as_deref(), item, element)
                    .map(|converted| (key, converted))
            })
            .collect::<Result<ValueMap, _>>()
            .map(Value::Map)
    }

    fn convert_text(&self, text: &str, required: &TypeDesc) -> Result<Value, ConversionError> {
        let invalid = |what: &str| ConversionError::new(format!("'{}' is not a valid {}", text, what));
        match required {
            TypeDesc::Bool => parse_bool(text).map(Value::Bool).ok_or_else(|| invalid("boolean")),
            TypeDesc::Int => parse_int(text).map(Value::Int).ok_or_else(|| invalid("integer")),
            TypeDesc::Float => text.trim().parse::<f64>().map(Value::Float).map_err(|_| invalid("number")),
            TypeDesc::Path => Ok(Value::Path(PathBuf::from(text.trim()))),
            TypeDesc::Url => Url::parse(text.trim())
                .map(Value::Url)
                .map_err(|e| ConversionError::new(format!("'{}' is not a valid URL: {}", text, e))),
            TypeDesc::Class => {
                let name = text.trim();
                self.classes
                    .as_ref()
                    .and_then(|classes| classes.get(name))
                    .map(Value::Class)
                    .ok_or_else(|| ConversionError::new(format!("Class not found: {}", name)))
            }
            other => Err(ConversionError::new(format!(
                "Cannot convert value of type [String] to required type [{}]: no matching editors or conversion strategy found",
                other
            ))),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

// Decimal, or hex with a `0x`/`#` prefix, optionally signed.
fn parse_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(hex) = digits.strip_prefix('#') {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn split_comma_delimited(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(',').map(|part| part.trim().to_string()).collect()
}

/// Parses `key=value` lines (`:` also separates; `#` and `!` start comments).
pub(crate) fn parse_properties(text: &str) -> ValueMap {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .map(|line| match line.find(['=', ':']) {
            Some(i) => (line[..i].trim().to_string(), Value::Str(line[i + 1..].trim().to_string())),
            None => (line.to_string(), Value::Str(String::new())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_text_conversions() {
        let registry = ConverterRegistry::new();
        let convert = |text: &str, ty: TypeDesc| registry.convert_if_necessary(None, Value::from(text), &ty);

        assert_eq!(convert("yes", TypeDesc::Bool), Ok(Value::Bool(true)));
        assert_eq!(convert("off", TypeDesc::Bool), Ok(Value::Bool(false)));
        assert_eq!(convert(" 42 ", TypeDesc::Int), Ok(Value::Int(42)));
        assert_eq!(convert("0x1F", TypeDesc::Int), Ok(Value::Int(31)));
        assert_eq!(convert("-7", TypeDesc::Int), Ok(Value::Int(-7)));
        assert_eq!(convert("2.5", TypeDesc::Float), Ok(Value::Float(2.5)));
        assert_eq!(convert("/tmp/x", TypeDesc::Path), Ok(Value::Path(PathBuf::from("/tmp/x"))));
        assert!(convert("maybe", TypeDesc::Bool).is_err());
        assert!(convert("x", TypeDesc::Int).is_err());
        assert!(convert("not a url", TypeDesc::Url).is_err());
    }

    #[test]
    fn arrays_from_text_and_single_values() {
        let registry = ConverterRegistry::new();
        let ints = TypeDesc::array_of(TypeDesc::Int);
        assert_eq!(
            registry.convert_if_necessary(None, Value::from("1, 2,3"), &ints),
            Ok(Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        );
        assert_eq!(
            registry.convert_if_necessary(None, Value::Int(5), &ints),
            Ok(Value::List(vec![Value::Int(5)]))
        );
        assert_eq!(
            registry.convert_if_necessary(None, Value::List(vec![Value::from("4")]), &ints),
            Ok(Value::List(vec![Value::Int(4)]))
        );
    }

    #[test]
    fn maps_from_properties_text() {
        let registry = ConverterRegistry::new();
        let converted = registry
            .convert_if_necessary(None, Value::from("# comment\na=1\nb: two\n"), &TypeDesc::map_of(TypeDesc::Str))
            .unwrap();
        let map = converted.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&Value::from("1")));
        assert_eq!(map.get("b"), Some(&Value::from("two")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn path_converters_take_precedence_over_type_converters() {
        let registry = ConverterRegistry::new();
        registry.register(
            TypeDesc::Str,
            Arc::new(|text: &str| -> Result<Value, ConversionError> { Ok(Value::from(format!("type:{}", text))) }),
        );
        registry.register_for_path(
            None,
            "spouse.name",
            Arc::new(|text: &str| -> Result<Value, ConversionError> { Ok(Value::from(format!("path:{}", text))) }),
        );

        assert_eq!(
            registry.convert_if_necessary(Some("spouse.name"), Value::from("x"), &TypeDesc::Str),
            Ok(Value::from("path:x"))
        );
        assert_eq!(
            registry.convert_if_necessary(Some("name"), Value::from("x"), &TypeDesc::Str),
            Ok(Value::from("type:x"))
        );
    }

    #[test]
    fn stripped_path_matches_element_paths() {
        let registry = ConverterRegistry::new();
        registry.register_for_path(
            Some(TypeDesc::Str),
            "names",
            Arc::new(|text: &str| -> Result<Value, ConversionError> { Ok(Value::from(text.to_uppercase())) }),
        );
        let converted = registry
            .convert_if_necessary(Some("names"), Value::from("a,b"), &TypeDesc::array_of(TypeDesc::Str))
            .unwrap();
        assert_eq!(converted, Value::List(vec![Value::from("A"), Value::from("B")]));
    }

    #[test]
    fn class_names_resolve_through_registry() {
        struct Thing;
        let classes = Arc::new(ClassRegistry::new());
        let class = classes.register(crate::introspect::ClassBuilder::<Thing>::new("Thing").build());
        let registry = ConverterRegistry::with_classes(classes);

        assert_eq!(
            registry.convert_if_necessary(None, Value::from("Thing"), &TypeDesc::Class),
            Ok(Value::Class(class))
        );
        assert!(registry.convert_if_necessary(None, Value::from("Nope"), &TypeDesc::Class).is_err());
    }
}
