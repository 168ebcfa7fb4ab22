//! Building one bean: instantiate, expose early, populate, initialize.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::definition::{AutowireMode, BeanValue, DependencyCheck, MergedBeanDefinition, PropertyValues};
use crate::error::{BeansError, BeansResult, InjectionPoint};
use crate::factory::BeanFactory;
use crate::introspect::{Class, PropertyDescriptor};
use crate::value::{Instance, Value};
use crate::wrapper::BeanWrapper;

/// Wraps anything that is not already a creation failure.
pub(crate) fn creation_failure(
    name: &str,
    merged: &MergedBeanDefinition,
    message: &str,
    err: BeansError,
) -> BeansError {
    if err.is_creation_failure() {
        err
    } else {
        BeansError::creation(name, merged.resource_description(), message, Some(Box::new(err)))
    }
}

impl BeanFactory {
    /// Creates, populates and initializes a bean.
    ///
    /// `shared` marks a top-level singleton, the only kind of bean that may
    /// be exposed before it is populated.
    pub(crate) fn create_bean(&self, name: &str, merged: &MergedBeanDefinition, shared: bool) -> BeansResult<Instance> {
        let _guard = self.inner.creation.enter(name, !merged.is_singleton())?;
        debug!("Creating instance of bean '{}'", name);

        for dependency in merged.depends_on() {
            trace!("Bean '{}' depends on '{}'", name, dependency);
            self.get_bean(dependency)?;
        }

        let class = self.resolve_bean_class(name, merged)?;
        let instance = self.instantiate(name, merged, class.as_ref())?;

        if shared && merged.is_singleton() && self.inner.config.allow_circular_references {
            self.inner.singletons.expose_early(name, instance.clone());
        }

        let wrapper = self.wrapper_for(instance.clone());
        self.populate_bean(name, merged, &wrapper)?;
        self.initialize_bean(name, merged, instance)
    }

    fn resolve_bean_class(&self, name: &str, merged: &MergedBeanDefinition) -> BeansResult<Option<Arc<Class>>> {
        let Some(class_name) = merged.class_name() else {
            return Ok(None);
        };
        self.inner
            .classes
            .get(class_name)
            .map(Some)
            .ok_or_else(|| BeansError::CannotLoadBeanClass {
                bean_name: name.to_string(),
                class_name: class_name.to_string(),
                resource: merged.resource_description().map(str::to_string),
            })
    }

    fn instantiate(&self, name: &str, merged: &MergedBeanDefinition, class: Option<&Arc<Class>>) -> BeansResult<Instance> {
        if merged.factory_method_name().is_some() {
            return self.instantiate_using_factory_method(name, merged, class);
        }
        let Some(class) = class else {
            return Err(BeansError::creation(
                name,
                merged.resource_description(),
                "No bean class specified on bean definition",
                None,
            ));
        };

        if merged.resolved_autowire_mode(class) == AutowireMode::Constructor || merged.has_constructor_argument_values() {
            return self.autowire_constructor(name, merged, class);
        }

        let constructor = class.default_constructor().ok_or_else(|| {
            BeansError::creation(
                name,
                merged.resource_description(),
                format!("Could not instantiate bean class [{}]: no default constructor found", class),
                None,
            )
        })?;
        let state = (constructor.invoke)(Vec::new()).map_err(|err| {
            BeansError::creation(name, merged.resource_description(), "Instantiation of bean failed", Some(err))
        })?;
        Ok(Instance::from_box(class.clone(), state))
    }

    /// Autowires, checks and applies property values.
    pub(crate) fn populate_bean(&self, name: &str, merged: &MergedBeanDefinition, wrapper: &BeanWrapper) -> BeansResult<()> {
        let mut values = merged.property_values().clone();
        let class = wrapper.wrapped_class().clone();

        match merged.resolved_autowire_mode(&class) {
            AutowireMode::ByName => self.autowire_by_name(name, &class, &mut values)?,
            AutowireMode::ByType => self.autowire_by_type(name, merged, &class, &mut values)?,
            _ => {}
        }
        self.check_dependencies(name, merged, &class, &values)?;
        self.apply_property_values(name, merged, wrapper, &values)
    }

    /// Writable object properties without a value: the autowiring candidates.
    fn unsatisfied_object_properties<'a>(
        &self,
        class: &'a Class,
        values: &PropertyValues,
    ) -> Vec<&'a PropertyDescriptor> {
        class
            .properties()
            .iter()
            .filter(|pd| {
                pd.is_writable()
                    && !values.contains(pd.name())
                    && !pd.property_type().is_simple()
                    && !self.is_ignored_type(pd.property_type())
            })
            .collect()
    }

    fn autowire_by_name(&self, name: &str, class: &Class, values: &mut PropertyValues) -> BeansResult<()> {
        for pd in self.unsatisfied_object_properties(class, values) {
            let property = pd.name();
            if self.contains_bean(property) {
                let bean = self.get_bean(property)?;
                debug!(
                    "Added autowiring by name from bean name '{}' via property '{}' to bean named '{}'",
                    property, property, name
                );
                values.add(property, Value::Object(bean));
            } else {
                trace!(
                    "Not autowiring property '{}' of bean '{}' by name: no matching bean found",
                    property,
                    name
                );
            }
        }
        Ok(())
    }

    fn autowire_by_type(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        class: &Class,
        values: &mut PropertyValues,
    ) -> BeansResult<()> {
        for pd in self.unsatisfied_object_properties(class, values) {
            let property = pd.name();
            let mut matching = self.get_beans_of_type(pd.property_type())?;
            match matching.len() {
                0 => trace!(
                    "Not autowiring property '{}' of bean '{}' by type: no matching bean found",
                    property,
                    name
                ),
                1 => {
                    let (bean_name, bean) = matching.remove(0);
                    debug!(
                        "Autowiring by type from bean name '{}' via property '{}' to bean named '{}'",
                        name, property, bean_name
                    );
                    values.add(property, Value::Object(bean));
                }
                count => {
                    return Err(BeansError::UnsatisfiedDependency {
                        bean_name: name.to_string(),
                        resource: merged.resource_description().map(str::to_string),
                        injection_point: InjectionPoint::Property(property.to_string()),
                        message: format!(
                            "There are {} beans of type [{}] for autowire by type. There should have been 1 to be able to autowire property '{}' of bean '{}'.",
                            count,
                            pd.property_type(),
                            property,
                            name
                        ),
                    })
                }
            }
        }
        Ok(())
    }

    fn check_dependencies(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        class: &Class,
        values: &PropertyValues,
    ) -> BeansResult<()> {
        let check = merged.dependency_check();
        if check == DependencyCheck::None {
            return Ok(());
        }
        for pd in class.properties() {
            if !pd.is_writable() || values.contains(pd.name()) || self.is_ignored_type(pd.property_type()) {
                continue;
            }
            let simple = pd.property_type().is_simple();
            let unsatisfied = match check {
                DependencyCheck::All => true,
                DependencyCheck::Simple => simple,
                DependencyCheck::Objects => !simple,
                DependencyCheck::None => false,
            };
            if unsatisfied {
                return Err(BeansError::UnsatisfiedDependency {
                    bean_name: name.to_string(),
                    resource: merged.resource_description().map(str::to_string),
                    injection_point: InjectionPoint::Property(pd.name().to_string()),
                    message: "Set this property value or disable dependency checking for this bean.".to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply_property_values(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        wrapper: &BeanWrapper,
        values: &PropertyValues,
    ) -> BeansResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut resolved = Vec::with_capacity(values.len());
        for pv in values.iter() {
            let value = match pv.value() {
                BeanValue::Literal(literal) => literal.clone(),
                other => {
                    let argument = format!("bean property '{}'", pv.name());
                    self.resolve_value_if_necessary(name, merged, &argument, other)?
                }
            };
            resolved.push((pv.name().to_string(), value));
        }
        wrapper.set_property_values(resolved, false).map_err(|err| {
            BeansError::creation(
                name,
                merged.resource_description(),
                "Error setting property values",
                Some(Box::new(err)),
            )
        })
    }

    fn initialize_bean(&self, name: &str, merged: &MergedBeanDefinition, instance: Instance) -> BeansResult<Instance> {
        let class = instance.class().clone();
        if let Some(aware) = &class.capabilities.bean_name_aware {
            trace!("Invoking bean name callback on bean '{}'", name);
            aware(&mut **instance.write_any(), name);
        }
        if let Some(aware) = &class.capabilities.factory_aware {
            trace!("Invoking factory callback on bean '{}'", name);
            aware(&mut **instance.write_any(), self);
        }

        let bean = self.apply_post_processors(name, merged, instance, true)?;
        self.invoke_init_methods(name, merged, &bean)?;
        self.apply_post_processors(name, merged, bean, false)
    }

    fn apply_post_processors(
        &self,
        name: &str,
        merged: &MergedBeanDefinition,
        mut bean: Instance,
        before: bool,
    ) -> BeansResult<Instance> {
        let phase = if before {
            "post_process_before_initialization"
        } else {
            "post_process_after_initialization"
        };
        for processor in self.post_processors() {
            let result = if before {
                processor.post_process_before_initialization(bean, name)
            } else {
                processor.post_process_after_initialization(bean, name)
            };
            bean = match result {
                Ok(Some(processed)) => processed,
                Ok(None) => {
                    return Err(BeansError::creation(
                        name,
                        merged.resource_description(),
                        format!("BeanPostProcessor returned null for bean '{}' in {}", name, phase),
                        None,
                    ))
                }
                Err(err) => {
                    return Err(BeansError::creation(
                        name,
                        merged.resource_description(),
                        format!("BeanPostProcessor failed in {}", phase),
                        Some(err),
                    ))
                }
            };
        }
        Ok(bean)
    }

    fn invoke_init_methods(&self, name: &str, merged: &MergedBeanDefinition, bean: &Instance) -> BeansResult<()> {
        let class = bean.class().clone();
        if let Some(initializing) = &class.capabilities.initializing {
            debug!("Invoking initializing callback on bean '{}'", name);
            initializing(&mut **bean.write_any()).map_err(|err| {
                BeansError::creation(name, merged.resource_description(), "Initialization of bean failed", Some(err))
            })?;
        }

        let Some(method_name) = merged.init_method_name() else {
            return Ok(());
        };
        let method = class
            .methods_named(method_name)
            .find(|m| m.parameter_types().is_empty())
            .ok_or_else(|| {
                BeansError::creation(
                    name,
                    merged.resource_description(),
                    format!("Could not find an init method named '{}' on bean with name '{}'", method_name, name),
                    None,
                )
            })?;
        debug!("Invoking custom init method '{}' on bean with name '{}'", method_name, name);
        (method.invoke)(&mut **bean.write_any(), Vec::new())
            .map(|_| ())
            .map_err(|err| {
                BeansError::creation(
                    name,
                    merged.resource_description(),
                    format!("Invocation of init method '{}' failed", method_name),
                    Some(err),
                )
            })
    }
}
