//! Eager instantiation and ordered destruction of singletons.

use tracing::{debug, info, warn};

use crate::definition::MergedBeanDefinition;
use crate::error::BeansResult;
use crate::factory::{BeanFactory, FACTORY_BEAN_PREFIX};
use crate::internal::{new_set, FastSet};
use crate::introspect::TypeDesc;
use crate::value::{Instance, Value};

impl BeanFactory {
    /// Creates every non-abstract, non-lazy singleton, in registration order.
    ///
    /// For factory beans the factory is created, and its product too when the
    /// product is a singleton. If any bean fails, every singleton created so
    /// far is destroyed and the error is returned.
    pub fn pre_instantiate_singletons(&self) -> BeansResult<()> {
        info!("Pre-instantiating singletons in {:?}", self);
        for name in self.inner.registry.names() {
            if let Err(err) = self.pre_instantiate(&name) {
                warn!("Pre-instantiation of bean '{}' failed, destroying singletons: {}", name, err);
                self.destroy_singletons();
                return Err(err);
            }
        }
        Ok(())
    }

    fn pre_instantiate(&self, name: &str) -> BeansResult<()> {
        let merged = self.inner.registry.merged_definition(name)?;
        if merged.is_abstract() || !merged.is_singleton() || merged.is_lazy_init() {
            return Ok(());
        }
        let factory_class = if merged.factory_method_name().is_none() {
            merged
                .class_name()
                .and_then(|class_name| self.inner.classes.get(class_name))
                .filter(|class| class.is_factory_bean())
        } else {
            None
        };

        match factory_class {
            Some(class) => {
                self.get_bean(&format!("{}{}", FACTORY_BEAN_PREFIX, name))?;
                if class.capabilities.factory_bean.as_ref().map_or(false, |hooks| hooks.singleton) {
                    self.get_bean(name)?;
                }
            }
            None => {
                self.get_bean(name)?;
            }
        }
        Ok(())
    }

    /// Destroys all singletons and tracked inner beans, then empties the cache.
    ///
    /// Singletons go in reverse creation order, except that beans declaring
    /// a `depends_on` a singleton are destroyed before it. Destroy failures
    /// are logged and do not stop the shutdown.
    pub fn destroy_singletons(&self) {
        let _lock = self.inner.singletons.lock();
        let order = self.inner.singletons.creation_order();
        info!("Destroying {} singletons", order.len());

        let mut visited = new_set();
        for name in order.iter().rev() {
            self.destroy_with_dependents(name, &mut visited);
        }
        for inner in self.inner.singletons.drain_inner_beans() {
            self.destroy_bean(&inner.name, &inner.instance, Some(&inner.definition));
        }
    }

    /// Destroys one singleton along with the singletons that depend on it.
    pub fn destroy_singleton(&self, name: &str) {
        let _lock = self.inner.singletons.lock();
        let canonical = self.inner.registry.canonical_name(name);
        self.destroy_with_dependents(&canonical, &mut new_set());
    }

    fn destroy_with_dependents(&self, name: &str, visited: &mut FastSet<String>) {
        if !visited.insert(name.to_string()) {
            return;
        }
        for dependent in self.dependents_of(name) {
            debug!("Destroying dependent bean '{}' before '{}'", dependent, name);
            self.destroy_with_dependents(&dependent, visited);
        }
        if let Some(instance) = self.inner.singletons.get(name) {
            let definition = self.inner.registry.merged_definition(name).ok();
            self.destroy_bean(name, &instance, definition.as_deref());
            self.inner.singletons.remove(name);
        }
    }

    /// Registered beans listing `name` among their `depends_on`.
    fn dependents_of(&self, name: &str) -> Vec<String> {
        self.inner
            .registry
            .names()
            .into_iter()
            .filter(|candidate| {
                self.inner.registry.merged_definition(candidate).map_or(false, |merged| {
                    merged
                        .depends_on()
                        .iter()
                        .any(|dependency| self.inner.registry.canonical_name(dependency) == name)
                })
            })
            .collect()
    }

    fn destroy_bean(&self, name: &str, instance: &Instance, definition: Option<&MergedBeanDefinition>) {
        debug!("Destroying bean '{}'", name);
        for processor in self.post_processors().iter().rev() {
            if let Err(err) = processor.post_process_before_destruction(instance, name) {
                warn!("Destruction post-processing of bean '{}' failed: {}", name, err);
            }
        }

        let class = instance.class().clone();
        if let Some(disposable) = &class.capabilities.disposable {
            debug!("Invoking destroy callback on bean '{}'", name);
            if let Err(err) = disposable(&mut **instance.write_any()) {
                warn!("Invocation of destroy callback on bean '{}' failed: {}", name, err);
            }
        }

        let Some(method_name) = definition.and_then(MergedBeanDefinition::destroy_method_name) else {
            return;
        };
        let (method, args) = match class.methods_named(method_name).find(|m| m.parameter_types().is_empty()) {
            Some(method) => (method, Vec::new()),
            None => match class
                .methods_named(method_name)
                .find(|m| m.parameter_types() == [TypeDesc::Bool])
            {
                Some(method) => (method, vec![Value::Bool(true)]),
                None => {
                    warn!(
                        "Couldn't find a destroy method named '{}' on bean with name '{}'",
                        method_name, name
                    );
                    return;
                }
            },
        };
        debug!("Invoking custom destroy method '{}' on bean with name '{}'", method_name, name);
        if let Err(err) = (method.invoke)(&mut **instance.write_any(), args) {
            warn!(
                "Invocation of destroy method '{}' failed on bean with name '{}': {}",
                method_name, name, err
            );
        }
    }
}
