//! Property-path access to bean instances.
//!
//! [`BeanWrapper`] reads and writes properties of an [`Instance`] through the
//! getters and setters declared on its [`Class`], following nested paths
//! (`spouse.name`) and keyed paths (`friends[0]`, `settings['timeout']`).
//! Written values are converted to the declared property type by a shared
//! [`ConverterRegistry`].

mod convert;
mod error;
pub(crate) mod path;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::internal::{new_map, FastMap};
use crate::introspect::{Class, PropertyDescriptor, SetterError, TypeDesc};
use crate::value::{Instance, Value};

pub use convert::{ConversionError, ConverterRegistry, TypeConverter};
pub use error::{PropertyAccessError, PropertyAccessErrors, PropertyAccessResult};
pub use path::canonical_property_path;

use path::PropertyToken;

/// Accessor for the properties of one root instance.
///
/// Nested wrappers are created on demand for intermediate objects and
/// cached per head segment; a cached nested wrapper is replaced when the
/// property now holds a different object.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanWrapper, ClassBuilder, Instance, TypeDesc, Value};
///
/// #[derive(Default)]
/// struct Node { label: String, next: Option<Instance>, tags: Vec<String> }
///
/// let class = ClassBuilder::<Node>::new("Node")
///     .default_constructor()
///     .property("label", |n: &Node| n.label.clone(), |n: &mut Node, v: String| n.label = v)
///     .property_as("next", TypeDesc::bean("Node"), |n: &Node| n.next.clone(), |n: &mut Node, v: Option<Instance>| n.next = v)
///     .property("tags", |n: &Node| n.tags.clone(), |n: &mut Node, v: Vec<String>| n.tags = v)
///     .build();
///
/// let head = Instance::new(&class, Node::default());
/// let wrapper = BeanWrapper::new(head);
/// wrapper.set_property_value("next", Value::Object(Instance::new(&class, Node::default()))).unwrap();
/// wrapper.set_property_value("next.label", Value::from("second")).unwrap();
/// wrapper.set_property_value("tags", Value::from("a,b")).unwrap();
///
/// assert_eq!(wrapper.get_property_value("next.label").unwrap(), Value::from("second"));
/// assert_eq!(wrapper.get_property_value("tags[1]").unwrap(), Value::from("b"));
/// ```
pub struct BeanWrapper {
    object: Instance,
    nested_path: String,
    converters: Arc<ConverterRegistry>,
    nested_wrappers: Mutex<FastMap<String, Arc<BeanWrapper>>>,
}

impl std::fmt::Debug for BeanWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanWrapper")
            .field("object", &self.object)
            .field("nested_path", &self.nested_path)
            .finish()
    }
}

impl BeanWrapper {
    /// Wraps `object` with its own converter registry.
    pub fn new(object: Instance) -> Self {
        Self::with_converters(object, Arc::new(ConverterRegistry::new()))
    }

    /// Wraps `object`, sharing an existing converter registry.
    pub fn with_converters(object: Instance, converters: Arc<ConverterRegistry>) -> Self {
        Self::nested(object, String::new(), converters)
    }

    fn nested(object: Instance, nested_path: String, converters: Arc<ConverterRegistry>) -> Self {
        Self {
            object,
            nested_path,
            converters,
            nested_wrappers: Mutex::new(new_map()),
        }
    }

    pub fn wrapped_instance(&self) -> &Instance {
        &self.object
    }

    pub fn wrapped_class(&self) -> &Arc<Class> {
        self.object.class()
    }

    /// Path of this wrapper from the root, ending in `.`; empty for the root.
    pub fn nested_path(&self) -> &str {
        &self.nested_path
    }

    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.converters
    }

    /// Registers a converter for every property of the required type.
    pub fn register_converter(&self, required: TypeDesc, converter: Arc<dyn TypeConverter>) {
        self.converters.register(required, converter);
    }

    /// Registers a converter for a property path relative to this wrapper.
    pub fn register_converter_for_path(
        &self,
        required: Option<TypeDesc>,
        property_path: &str,
        converter: Arc<dyn TypeConverter>,
    ) {
        let full = format!("{}{}", self.nested_path, property_path);
        self.converters.register_for_path(required, &full, converter);
    }

    pub fn property_descriptors(&self) -> &[PropertyDescriptor] {
        self.wrapped_class().properties()
    }

    /// Descriptor of the property a (possibly nested) path ends in.
    pub fn property_descriptor(&self, property_path: &str) -> PropertyAccessResult<PropertyDescriptor> {
        self.with_nested(property_path, |wrapper, segment| {
            let token = wrapper.parse_token(segment)?;
            wrapper
                .wrapped_class()
                .property(&token.actual_name)
                .cloned()
                .ok_or_else(|| wrapper.not_readable(&token))
        })
    }

    /// Declared type of the value a path designates; keys step into element types.
    pub fn property_type(&self, property_path: &str) -> PropertyAccessResult<TypeDesc> {
        self.with_nested(property_path, |wrapper, segment| {
            let token = wrapper.parse_token(segment)?;
            let descriptor = wrapper
                .wrapped_class()
                .property(&token.actual_name)
                .ok_or_else(|| wrapper.not_readable(&token))?;
            Ok(token
                .keys
                .iter()
                .fold(descriptor.property_type().clone(), |ty, _| ty.element_type()))
        })
    }

    pub fn is_readable_property(&self, property_path: &str) -> bool {
        self.with_nested(property_path, |wrapper, segment| {
            let token = wrapper.parse_token(segment)?;
            Ok(wrapper
                .wrapped_class()
                .property(&token.actual_name)
                .map_or(false, PropertyDescriptor::is_readable))
        })
        .unwrap_or(false)
    }

    /// Keyed paths need both a getter and a setter, since elements are
    /// written back through the property.
    pub fn is_writable_property(&self, property_path: &str) -> bool {
        self.with_nested(property_path, |wrapper, segment| {
            let token = wrapper.parse_token(segment)?;
            Ok(wrapper.wrapped_class().property(&token.actual_name).map_or(false, |pd| {
                pd.is_writable() && (token.keys.is_empty() || pd.is_readable())
            }))
        })
        .unwrap_or(false)
    }

    pub fn get_property_value(&self, property_path: &str) -> PropertyAccessResult<Value> {
        self.with_nested(property_path, |wrapper, segment| {
            let token = wrapper.parse_token(segment)?;
            wrapper.read_token(&token)
        })
    }

    pub fn set_property_value(&self, property_path: &str, value: Value) -> PropertyAccessResult<()> {
        self.with_nested(property_path, |wrapper, segment| {
            let token = wrapper.parse_token(segment)?;
            wrapper.write_token(&token, value)
        })
    }

    /// Applies a batch of values in order.
    ///
    /// Type mismatches and setter failures are collected and reported
    /// together as [`PropertyAccessError::Aggregate`] once the batch is done.
    /// Unknown or read-only properties abort the batch unless
    /// `ignore_unknown` is set, in which case they are skipped. Any other
    /// failure aborts immediately.
    pub fn set_property_values<I, S>(&self, values: I, ignore_unknown: bool) -> PropertyAccessResult<()>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let mut failures = Vec::new();
        for (property_path, value) in values {
            let property_path = property_path.as_ref();
            match self.set_property_value(property_path, value) {
                Ok(()) => {}
                Err(PropertyAccessError::NotWritable { .. }) if ignore_unknown => {
                    trace!("Ignoring unknown property '{}'", property_path);
                }
                Err(err) if err.is_collectable() => failures.push(err),
                Err(err) => return Err(err),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PropertyAccessError::Aggregate(PropertyAccessErrors::new(failures)))
        }
    }

    /// Converts a value to `required` with this wrapper's converters.
    pub fn convert_if_necessary(&self, value: Value, required: &TypeDesc) -> Result<Value, ConversionError> {
        self.converters.convert_if_necessary(None, value, required)
    }

    // ---- path navigation ----

    fn with_nested<R>(
        &self,
        property_path: &str,
        f: impl FnOnce(&BeanWrapper, &str) -> PropertyAccessResult<R>,
    ) -> PropertyAccessResult<R> {
        match path::split_first(property_path) {
            (segment, None) => f(self, segment),
            (head, Some(rest)) => {
                let nested = self.nested_wrapper(head)?;
                nested.with_nested(rest, f)
            }
        }
    }

    fn nested_wrapper(&self, head: &str) -> PropertyAccessResult<Arc<BeanWrapper>> {
        let token = self.parse_token(head)?;
        match self.read_token(&token)? {
            Value::Object(instance) => {
                let mut cache = self.nested_wrappers.lock();
                if let Some(existing) = cache.get(&token.canonical_name) {
                    if existing.object.ptr_eq(&instance) {
                        return Ok(existing.clone());
                    }
                }
                trace!("Creating new nested wrapper for property '{}'", self.full_path(&token.canonical_name));
                let nested = Arc::new(BeanWrapper::nested(
                    instance,
                    format!("{}{}.", self.nested_path, token.canonical_name),
                    self.converters.clone(),
                ));
                cache.insert(token.canonical_name.clone(), nested.clone());
                Ok(nested)
            }
            Value::Null => Err(PropertyAccessError::NullValueInNestedPath {
                bean_class: self.class_name(),
                property: self.full_path(&token.canonical_name),
            }),
            other => Err(PropertyAccessError::InvalidPropertyPath {
                bean_class: self.class_name(),
                property: self.full_path(&token.canonical_name),
                reason: format!("nested property value of type [{}] is not a bean", other.type_name()),
            }),
        }
    }

    fn parse_token(&self, segment: &str) -> PropertyAccessResult<PropertyToken> {
        path::parse_token(segment).map_err(|reason| PropertyAccessError::InvalidPropertyPath {
            bean_class: self.class_name(),
            property: self.full_path(segment),
            reason,
        })
    }

    fn full_path(&self, segment: &str) -> String {
        format!("{}{}", self.nested_path, segment)
    }

    fn class_name(&self) -> String {
        self.wrapped_class().name().to_string()
    }

    fn not_readable(&self, token: &PropertyToken) -> PropertyAccessError {
        PropertyAccessError::NotReadable {
            bean_class: self.class_name(),
            property: self.full_path(&token.actual_name),
        }
    }

    fn not_writable(&self, token: &PropertyToken) -> PropertyAccessError {
        PropertyAccessError::NotWritable {
            bean_class: self.class_name(),
            property: self.full_path(&token.actual_name),
        }
    }

    // ---- reads ----

    fn read_property(&self, token: &PropertyToken) -> PropertyAccessResult<Value> {
        let descriptor = self
            .wrapped_class()
            .property(&token.actual_name)
            .filter(|pd| pd.is_readable())
            .ok_or_else(|| self.not_readable(token))?;
        let guard = self.object.read_any();
        descriptor.read(&**guard).ok_or_else(|| self.not_readable(token))
    }

    fn read_token(&self, token: &PropertyToken) -> PropertyAccessResult<Value> {
        let mut value = self.read_property(token)?;
        let mut walked = token.actual_name.clone();
        for key in &token.keys {
            value = match value {
                Value::List(items) => {
                    let index = self.parse_index(&walked, key)?;
                    let len = items.len();
                    items.into_iter().nth(index).ok_or_else(|| PropertyAccessError::InvalidPropertyPath {
                        bean_class: self.class_name(),
                        property: self.full_path(&format!("{}[{}]", walked, key)),
                        reason: format!("Index of out of bounds in property path: index {} for size {}", index, len),
                    })?
                }
                Value::Map(mut map) => map.remove(key).unwrap_or(Value::Null),
                Value::Null => {
                    return Err(PropertyAccessError::NullValueInNestedPath {
                        bean_class: self.class_name(),
                        property: self.full_path(&format!("{}[{}]", walked, key)),
                    })
                }
                other => return Err(self.not_indexable(&walked, key, &other)),
            };
            walked = format!("{}[{}]", walked, key);
        }
        Ok(value)
    }

    fn parse_index(&self, walked: &str, key: &str) -> PropertyAccessResult<usize> {
        key.trim().parse::<usize>().map_err(|_| PropertyAccessError::InvalidPropertyPath {
            bean_class: self.class_name(),
            property: self.full_path(&format!("{}[{}]", walked, key)),
            reason: format!("'{}' is not a valid list index", key),
        })
    }

    fn not_indexable(&self, walked: &str, key: &str, value: &Value) -> PropertyAccessError {
        PropertyAccessError::InvalidPropertyPath {
            bean_class: self.class_name(),
            property: self.full_path(&format!("{}[{}]", walked, key)),
            reason: format!(
                "Property referenced in indexed property path '{}' is neither a list nor a map; returned value was [{:?}]",
                walked, value
            ),
        }
    }

    // ---- writes ----

    fn write_token(&self, token: &PropertyToken, value: Value) -> PropertyAccessResult<()> {
        let descriptor = self
            .wrapped_class()
            .property(&token.actual_name)
            .filter(|pd| pd.is_writable())
            .ok_or_else(|| self.not_writable(token))?;
        let property = self.full_path(&token.canonical_name);

        if token.keys.is_empty() {
            let old_value = if descriptor.is_readable() {
                self.read_property(token).ok()
            } else {
                None
            };
            let converted = self
                .converters
                .convert_if_necessary(Some(&property), value.clone(), descriptor.property_type())
                .map_err(|err| PropertyAccessError::TypeMismatch {
                    property: property.clone(),
                    old_value,
                    value: value.clone(),
                    required: descriptor.property_type().clone(),
                    message: err.message,
                })?;
            return self.invoke_setter(descriptor, &property, converted, value);
        }

        if !descriptor.is_readable() {
            return Err(self.not_readable(token));
        }
        let element_type = token
            .keys
            .iter()
            .fold(descriptor.property_type().clone(), |ty, _| ty.element_type());
        let converted = self
            .converters
            .convert_if_necessary(Some(&property), value.clone(), &element_type)
            .map_err(|err| PropertyAccessError::TypeMismatch {
                property: property.clone(),
                old_value: None,
                value: value.clone(),
                required: element_type.clone(),
                message: err.message,
            })?;

        let mut container = self.read_property(token)?;
        self.assign_keyed(&mut container, &token.actual_name, &token.keys, converted)?;
        self.invoke_setter(descriptor, &property, container, value)
    }

    fn assign_keyed(&self, container: &mut Value, walked: &str, keys: &[String], value: Value) -> PropertyAccessResult<()> {
        let Some((key, rest)) = keys.split_first() else {
            *container = value;
            return Ok(());
        };
        let here = format!("{}[{}]", walked, key);
        match container {
            Value::List(items) => {
                let index = self.parse_index(walked, key)?;
                if rest.is_empty() && index == items.len() {
                    // Growing by one slot is allowed; anything further is out of bounds.
                    items.push(Value::Null);
                }
                let len = items.len();
                let slot = items.get_mut(index).ok_or_else(|| PropertyAccessError::InvalidPropertyPath {
                    bean_class: self.class_name(),
                    property: self.full_path(&here),
                    reason: format!("Index of out of bounds in property path: index {} for size {}", index, len),
                })?;
                self.assign_keyed(slot, &here, rest, value)
            }
            Value::Map(map) => {
                if rest.is_empty() {
                    map.insert(key.clone(), value);
                    return Ok(());
                }
                match map.get_mut(key) {
                    Some(slot) => self.assign_keyed(slot, &here, rest, value),
                    None => Err(PropertyAccessError::NullValueInNestedPath {
                        bean_class: self.class_name(),
                        property: self.full_path(&here),
                    }),
                }
            }
            Value::Null => Err(PropertyAccessError::NullValueInNestedPath {
                bean_class: self.class_name(),
                property: self.full_path(walked),
            }),
            other => Err(self.not_indexable(walked, key, other)),
        }
    }

    fn invoke_setter(
        &self,
        descriptor: &PropertyDescriptor,
        property: &str,
        converted: Value,
        original: Value,
    ) -> PropertyAccessResult<()> {
        let mut guard = self.object.write_any();
        descriptor.write(&mut **guard, converted).map_err(|err| match err {
            SetterError::Type(message) => PropertyAccessError::TypeMismatch {
                property: property.to_string(),
                old_value: None,
                value: original,
                required: descriptor.property_type().clone(),
                message,
            },
            SetterError::Invocation(source) => PropertyAccessError::MethodInvocation {
                property: property.to_string(),
                value: original,
                source,
            },
        })
    }
}
