//! Constructor and factory-method selection.
//!
//! Candidates are tried from the most parameters to the fewest. Each
//! parameter is bound to an indexed argument, then to an unused generic
//! argument of a matching type, then (when autowiring) to the single bean
//! of the parameter's type. Among the candidates that bind completely the
//! one with the smallest type difference weight wins; on a tie the earlier
//! candidate is kept.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::definition::{AutowireMode, MergedBeanDefinition};
use crate::error::{BeansError, BeansResult, InjectionPoint};
use crate::factory::create::creation_failure;
use crate::factory::BeanFactory;
use crate::introspect::{type_difference_weight, Class, TypeDesc};
use crate::value::{Instance, Value};

/// A declared argument with its value already resolved.
struct ResolvedHolder {
    value: Value,
    type_desc: Option<TypeDesc>,
}

#[derive(Default)]
struct ResolvedArguments {
    indexed: BTreeMap<usize, ResolvedHolder>,
    generic: Vec<ResolvedHolder>,
}

fn unsatisfied(name: &str, merged: &MergedBeanDefinition, index: usize, message: String) -> BeansError {
    BeansError::UnsatisfiedDependency {
        bean_name: name.to_string(),
        resource: merged.resource_description().map(str::to_string),
        injection_point: InjectionPoint::ConstructorArgument(index),
        message,
    }
}

impl BeanFactory {
    pub(crate) fn autowire_constructor(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        class: &Arc<Class>,
    ) -> BeansResult<Instance> {
        let autowiring = merged.resolved_autowire_mode(class) == AutowireMode::Constructor;
        let candidates = class
            .constructors()
            .iter()
            .map(|constructor| (constructor.parameter_types(), constructor))
            .collect();
        let (constructor, args) = self.select_candidate(name, merged, candidates, autowiring, "constructor")?;
        debug!(
            "Bean '{}' instantiated via constructor {:?}",
            name,
            constructor.parameter_types()
        );
        let state = (constructor.invoke)(args).map_err(|err| {
            BeansError::creation(name, merged.resource_description(), "Instantiation of bean failed", Some(err))
        })?;
        Ok(Instance::from_box(class.clone(), state))
    }

    /// Static factory method on the bean class, or instance method on the
    /// named factory bean.
    pub(crate) fn instantiate_using_factory_method(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        class: Option<&Arc<Class>>,
    ) -> BeansResult<Instance> {
        let resource = merged.resource_description();
        let method_name = merged.factory_method_name().unwrap_or_default();
        let autowiring = merged.autowire_mode() == AutowireMode::Constructor;
        let no_match = |owner: &str| {
            BeansError::creation(
                name,
                resource,
                format!("No matching factory method found: {}; factory method '{}'", owner, method_name),
                None,
            )
        };

        let produced = match merged.factory_bean_name() {
            Some(factory_bean) => {
                let factory = self
                    .get_bean(factory_bean)
                    .map_err(|err| creation_failure(name, merged, "Could not obtain factory bean", err))?;
                let factory_class = factory.class().clone();
                let candidates: Vec<_> = factory_class
                    .methods_named(method_name)
                    .map(|method| (method.parameter_types(), method))
                    .collect();
                if candidates.is_empty() {
                    return Err(no_match(&format!("factory bean '{}'", factory_bean)));
                }
                let (method, args) = self.select_candidate(name, merged, candidates, autowiring, "factory method")?;
                trace!("Invoking factory method '{}' on bean '{}'", method_name, factory_bean);
                let mut state = factory.write_any();
                (method.invoke)(&mut **state, args)
            }
            None => {
                let class = class.ok_or_else(|| no_match("no factory bean or class"))?;
                let candidates: Vec<_> = class
                    .static_methods_named(method_name)
                    .map(|method| (method.parameter_types(), method))
                    .collect();
                if candidates.is_empty() {
                    return Err(no_match(&format!("class [{}]", class)));
                }
                let (method, args) = self.select_candidate(name, merged, candidates, autowiring, "factory method")?;
                trace!("Invoking static factory method '{}' on class [{}]", method_name, class);
                (method.invoke)(args)
            }
        }
        .map_err(|err| {
            BeansError::creation(
                name,
                resource,
                format!("Factory method '{}' threw exception", method_name),
                Some(err),
            )
        })?;

        match produced {
            Value::Object(instance) => Ok(instance),
            Value::Null => Err(BeansError::creation(
                name,
                resource,
                format!("Factory method '{}' returned null", method_name),
                None,
            )),
            other => Err(BeansError::creation(
                name,
                resource,
                format!(
                    "Factory method '{}' returned a value of type [{}] instead of a bean object",
                    method_name,
                    other.type_name()
                ),
                None,
            )),
        }
    }

    /// Picks the best candidate and the converted arguments to call it with.
    fn select_candidate<'a, T>(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        mut candidates: Vec<(&'a [TypeDesc], T)>,
        autowiring: bool,
        kind: &str,
    ) -> BeansResult<(T, Vec<Value>)> {
        let resolved = self.resolve_constructor_arguments(name, merged)?;
        let minimum = merged.constructor_argument_values().minimum_parameter_count();
        candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut best: Option<(u32, T, Vec<Value>)> = None;
        let mut last_error = None;
        for (params, target) in candidates {
            if params.len() < minimum {
                trace!(
                    "Skipping {} candidate {:?} of bean '{}': fewer than {} parameters",
                    kind,
                    params,
                    name,
                    minimum
                );
                break;
            }
            match self.bind_arguments(name, merged, &resolved, params, autowiring, kind) {
                Ok(args) => {
                    let weight = type_difference_weight(params, &args);
                    trace!(
                        "{} candidate {:?} of bean '{}' has type difference weight {}",
                        kind,
                        params,
                        name,
                        weight
                    );
                    if best.as_ref().map_or(true, |(best_weight, _, _)| weight < *best_weight) {
                        best = Some((weight, target, args));
                    }
                }
                Err(err) => {
                    trace!("Ignoring {} candidate {:?} of bean '{}': {}", kind, params, name, err);
                    last_error = Some(err);
                }
            }
        }

        match best {
            Some((_, target, args)) => Ok((target, args)),
            None => Err(last_error.unwrap_or_else(|| {
                BeansError::creation(
                    name,
                    merged.resource_description(),
                    format!(
                        "Could not resolve matching {} (hint: specify index and type arguments for simple parameters to avoid type ambiguities); {} arguments given",
                        kind, minimum
                    ),
                    None,
                )
            })),
        }
    }

    fn resolve_constructor_arguments(&self, name: &str, merged: &MergedBeanDefinition) -> BeansResult<ResolvedArguments> {
        let declared = merged.constructor_argument_values();
        let mut resolved = ResolvedArguments::default();
        for (index, holder) in declared.indexed() {
            let argument = format!("constructor argument with index {}", index);
            let value = self.resolve_value_if_necessary(name, merged, &argument, holder.value())?;
            resolved.indexed.insert(
                *index,
                ResolvedHolder {
                    value,
                    type_desc: holder.type_desc().cloned(),
                },
            );
        }
        for holder in declared.generic() {
            let value = self.resolve_value_if_necessary(name, merged, "constructor argument", holder.value())?;
            resolved.generic.push(ResolvedHolder {
                value,
                type_desc: holder.type_desc().cloned(),
            });
        }
        Ok(resolved)
    }

    fn bind_arguments(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        resolved: &ResolvedArguments,
        params: &[TypeDesc],
        autowiring: bool,
        kind: &str,
    ) -> BeansResult<Vec<Value>> {
        let mut used = vec![false; resolved.generic.len()];
        let mut args = Vec::with_capacity(params.len());

        for (index, param) in params.iter().enumerate() {
            let mut holder = resolved
                .indexed
                .get(&index)
                .filter(|h| h.type_desc.as_ref().map_or(true, |t| t == param));
            if holder.is_none() {
                let typed_match = resolved.generic.iter().enumerate().position(|(i, h)| {
                    !used[i]
                        && match &h.type_desc {
                            Some(declared) => declared == param,
                            None => param.accepts(&h.value),
                        }
                });
                // Untyped arguments may still fit after conversion, e.g. text to int.
                let fallback = || {
                    resolved
                        .generic
                        .iter()
                        .enumerate()
                        .position(|(i, h)| !used[i] && h.type_desc.is_none())
                };
                let position = typed_match.or_else(|| if autowiring { None } else { fallback() });
                if let Some(position) = position {
                    used[position] = true;
                    holder = Some(&resolved.generic[position]);
                }
            }

            let value = match holder {
                Some(holder) => self
                    .inner
                    .converters
                    .convert_if_necessary(None, holder.value.clone(), param)
                    .map_err(|err| {
                        unsatisfied(
                            name,
                            merged,
                            index,
                            format!(
                                "Could not convert {} argument value [{}] to required type [{}]: {}",
                                kind, holder.value, param, err
                            ),
                        )
                    })?,
                None if autowiring => self.autowire_argument(name, merged, index, param, kind)?,
                None => {
                    return Err(unsatisfied(
                        name,
                        merged,
                        index,
                        format!(
                            "Ambiguous {} argument types - did you specify the correct bean references as generic {} arguments?",
                            kind, kind
                        ),
                    ))
                }
            };
            args.push(value);
        }
        Ok(args)
    }

    fn autowire_argument(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        index: usize,
        param: &TypeDesc,
        kind: &str,
    ) -> BeansResult<Value> {
        let mut matching = self.get_beans_of_type(param)?;
        if matching.len() != 1 {
            return Err(unsatisfied(
                name,
                merged,
                index,
                format!(
                    "There are {} beans of type [{}] for autowiring {}. There should have been exactly 1 to be able to autowire {} of bean '{}'.",
                    matching.len(),
                    param,
                    kind,
                    kind,
                    name
                ),
            ));
        }
        let (bean_name, bean) = matching.remove(0);
        debug!(
            "Autowiring by type from bean name '{}' via {} to bean named '{}'",
            name, kind, bean_name
        );
        Ok(Value::Object(bean))
    }
}
