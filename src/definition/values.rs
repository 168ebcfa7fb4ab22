use std::collections::BTreeMap;

use crate::definition::BeanDefinition;
use crate::introspect::TypeDesc;
use crate::value::Value;

/// Reference to another bean by name, resolved at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeBeanReference {
    bean_name: String,
}

impl RuntimeBeanReference {
    pub fn new(bean_name: impl Into<String>) -> Self {
        Self { bean_name: bean_name.into() }
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }
}

/// A property or argument value as declared in a definition.
///
/// Everything except literals is resolved by the factory when the bean is
/// created: references become bean instances, inner definitions become
/// fresh anonymous beans, and collections are resolved element-wise.
#[derive(Debug, Clone)]
pub enum BeanValue {
    Literal(Value),
    Ref(RuntimeBeanReference),
    Inner(Box<BeanDefinition>),
    List(Vec<BeanValue>),
    /// Resolved to a list with duplicates removed, first occurrence kept.
    Set(Vec<BeanValue>),
    /// String-keyed, insertion-ordered.
    Map(Vec<(String, BeanValue)>),
}

impl BeanValue {
    pub fn null() -> Self {
        BeanValue::Literal(Value::Null)
    }

    pub fn reference(bean_name: impl Into<String>) -> Self {
        BeanValue::Ref(RuntimeBeanReference::new(bean_name))
    }

    pub fn inner(definition: BeanDefinition) -> Self {
        BeanValue::Inner(Box::new(definition))
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BeanValue>,
    {
        BeanValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BeanValue>,
    {
        BeanValue::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BeanValue>,
    {
        BeanValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Whether resolution is a no-op.
    pub fn is_literal(&self) -> bool {
        matches!(self, BeanValue::Literal(_))
    }
}

macro_rules! literal_from {
    ($($t:ty),*) => {$(
        impl From<$t> for BeanValue {
            fn from(value: $t) -> Self {
                BeanValue::Literal(Value::from(value))
            }
        }
    )*};
}

literal_from!(Value, &str, String, bool, i64, i32, f64, crate::value::Instance);

impl From<RuntimeBeanReference> for BeanValue {
    fn from(reference: RuntimeBeanReference) -> Self {
        BeanValue::Ref(reference)
    }
}

impl From<BeanDefinition> for BeanValue {
    fn from(definition: BeanDefinition) -> Self {
        BeanValue::inner(definition)
    }
}

/// A named property value.
#[derive(Debug, Clone)]
pub struct PropertyValue {
    name: String,
    value: BeanValue,
}

impl PropertyValue {
    pub fn new(name: impl Into<String>, value: impl Into<BeanValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &BeanValue {
        &self.value
    }
}

/// Ordered property values; adding an existing name replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct PropertyValues {
    values: Vec<PropertyValue>,
}

impl PropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<BeanValue>) -> &mut Self {
        self.add_property_value(PropertyValue::new(name, value))
    }

    pub fn add_property_value(&mut self, pv: PropertyValue) -> &mut Self {
        match self.values.iter_mut().find(|existing| existing.name == pv.name) {
            Some(existing) => *existing = pv,
            None => self.values.push(pv),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&BeanValue> {
        self.values.iter().find(|pv| pv.name == name).map(|pv| &pv.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let index = self.values.iter().position(|pv| pv.name == name)?;
        Some(self.values.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlays `other` on top of these values.
    pub fn merge(&mut self, other: &PropertyValues) {
        for pv in &other.values {
            self.add_property_value(pv.clone());
        }
    }
}

impl<K: Into<String>, V: Into<BeanValue>> FromIterator<(K, V)> for PropertyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = PropertyValues::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

/// A constructor argument with an optional declared type used for matching.
#[derive(Debug, Clone)]
pub struct ValueHolder {
    value: BeanValue,
    type_desc: Option<TypeDesc>,
}

impl ValueHolder {
    pub fn new(value: impl Into<BeanValue>) -> Self {
        Self {
            value: value.into(),
            type_desc: None,
        }
    }

    pub fn typed(value: impl Into<BeanValue>, type_desc: TypeDesc) -> Self {
        Self {
            value: value.into(),
            type_desc: Some(type_desc),
        }
    }

    pub fn value(&self) -> &BeanValue {
        &self.value
    }

    pub fn type_desc(&self) -> Option<&TypeDesc> {
        self.type_desc.as_ref()
    }
}

/// Constructor arguments: by index and generic (matched by type).
#[derive(Debug, Clone, Default)]
pub struct ConstructorArgumentValues {
    indexed: BTreeMap<usize, ValueHolder>,
    generic: Vec<ValueHolder>,
}

impl ConstructorArgumentValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_indexed(&mut self, index: usize, holder: ValueHolder) {
        self.indexed.insert(index, holder);
    }

    pub fn add_generic(&mut self, holder: ValueHolder) {
        self.generic.push(holder);
    }

    pub fn indexed(&self) -> &BTreeMap<usize, ValueHolder> {
        &self.indexed
    }

    pub fn generic(&self) -> &[ValueHolder] {
        &self.generic
    }

    /// Total number of declared arguments.
    pub fn argument_count(&self) -> usize {
        self.indexed.len() + self.generic.len()
    }

    /// Minimum parameter count a constructor needs to take all arguments:
    /// the highest explicit index + 1, or the total count if larger.
    pub fn minimum_parameter_count(&self) -> usize {
        let by_index = self.indexed.keys().next_back().map_or(0, |max| max + 1);
        by_index.max(self.argument_count())
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.generic.is_empty()
    }

    /// Overlays `other`: its indexed entries replace same-index entries and
    /// its generic entries replace same-position entries.
    pub fn merge(&mut self, other: &ConstructorArgumentValues) {
        for (index, holder) in &other.indexed {
            self.indexed.insert(*index, holder.clone());
        }
        for (position, holder) in other.generic.iter().enumerate() {
            match self.generic.get_mut(position) {
                Some(existing) => *existing = holder.clone(),
                None => self.generic.push(holder.clone()),
            }
        }
    }
}
