//! Resolution of declared values into live ones.

use std::hash::BuildHasher;

use tracing::trace;

use crate::definition::{BeanDefinition, BeanValue, MergedBeanDefinition};
use crate::error::{BeansError, BeansResult};
use crate::factory::singleton::InnerBean;
use crate::factory::BeanFactory;
use crate::internal::{new_map, FastMap};
use crate::value::{Value, ValueMap};

impl BeanFactory {
    /// Resolves references, inner beans and managed collections; literals
    /// pass through unchanged.
    ///
    /// `argument` names the property or argument being resolved and only
    /// shows up in error messages and inner bean names.
    pub(crate) fn resolve_value_if_necessary(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        argument: &str,
        value: &BeanValue,
    ) -> BeansResult<Value> {
        match value {
            BeanValue::Literal(literal) => Ok(literal.clone()),
            BeanValue::Ref(reference) => {
                trace!(
                    "Resolving reference from {} in bean '{}' to bean '{}'",
                    argument,
                    name,
                    reference.bean_name()
                );
                self.get_bean(reference.bean_name()).map(Value::Object).map_err(|err| {
                    BeansError::creation(
                        name,
                        merged.resource_description(),
                        format!(
                            "Can't resolve reference to bean '{}' while setting {}",
                            reference.bean_name(),
                            argument
                        ),
                        Some(Box::new(err)),
                    )
                })
            }
            BeanValue::Inner(definition) => self.resolve_inner_bean(name, merged, argument, definition),
            BeanValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let element = format!("{} with key [{}]", argument, index);
                    self.resolve_value_if_necessary(name, merged, &element, item)
                })
                .collect::<BeansResult<Vec<_>>>()
                .map(Value::List),
            BeanValue::Set(items) => {
                let mut resolved: Vec<Value> = Vec::with_capacity(items.len());
                // Positions in `resolved` by value hash; equality decides within a bucket.
                let mut buckets: FastMap<u64, Vec<usize>> = new_map();
                for (index, item) in items.iter().enumerate() {
                    let element = format!("{} with key [{}]", argument, index);
                    let value = self.resolve_value_if_necessary(name, merged, &element, item)?;
                    let hash = buckets.hasher().hash_one(&value);
                    let bucket = buckets.entry(hash).or_default();
                    if !bucket.iter().any(|&seen| resolved[seen] == value) {
                        bucket.push(resolved.len());
                        resolved.push(value);
                    }
                }
                Ok(Value::List(resolved))
            }
            BeanValue::Map(entries) => {
                let mut resolved = ValueMap::new();
                for (key, item) in entries {
                    let element = format!("{} with key [{}]", argument, key);
                    resolved.insert(key.clone(), self.resolve_value_if_necessary(name, merged, &element, item)?);
                }
                Ok(Value::Map(resolved))
            }
        }
    }

    /// Builds an anonymous bean that is never cached. Disposable inner beans
    /// are remembered so that they are destroyed with the singletons.
    fn resolve_inner_bean(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        argument: &str,
        definition: &BeanDefinition,
    ) -> BeansResult<Value> {
        let inner_name = format!("(inner bean for {} of bean '{}')", argument, name);
        let wrap = |err: BeansError| {
            BeansError::creation(
                name,
                merged.resource_description(),
                format!("Can't create inner bean '{}' while setting {}", inner_name, argument),
                Some(Box::new(err)),
            )
        };

        let inner_merged = self.inner.registry.merge_standalone(&inner_name, definition).map_err(wrap)?;
        let instance = self.create_bean(&inner_name, &inner_merged, false).map_err(wrap)?;
        let product = self
            .object_for_shared_instance(&inner_name, &inner_name, instance.clone(), false, false)
            .map_err(wrap)?;

        if instance.class().is_disposable() || inner_merged.destroy_method_name().is_some() {
            self.inner.singletons.register_inner_bean(InnerBean {
                name: inner_name.clone(),
                instance,
                definition: inner_merged,
            });
        }
        Ok(Value::Object(product))
    }
}
