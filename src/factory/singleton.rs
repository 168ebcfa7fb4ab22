//! Cache of shared bean instances.

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};
use tracing::{debug, trace};

use crate::definition::MergedBeanDefinition;
use crate::error::{BeansError, BeansResult};
use crate::internal::{new_map, new_set, DisposeBag, FastMap, FastSet};
use crate::value::Instance;

/// An anonymous inner bean kept alive for its destroy callbacks.
pub(crate) struct InnerBean {
    pub(crate) name: String,
    pub(crate) instance: Instance,
    pub(crate) definition: MergedBeanDefinition,
}

/// Singleton instances by canonical name.
///
/// Completed singletons live in a read-mostly map that any thread may hit
/// without locking out creators. Everything else (early references, the
/// in-creation set, creation itself) happens under one re-entrant lock, so
/// a name is constructed at most once and an early-exposed instance is only
/// ever seen by the thread that is still building it.
pub(crate) struct SingletonStore {
    creation_lock: ReentrantMutex<()>,
    complete: RwLock<FastMap<String, Instance>>,
    early: Mutex<FastMap<String, Instance>>,
    in_creation: Mutex<FastSet<String>>,
    order: Mutex<Vec<String>>,
    manual: Mutex<FastSet<String>>,
    products: RwLock<FastMap<String, Instance>>,
    inner_beans: Mutex<DisposeBag<InnerBean>>,
}

/// Clears the in-creation mark and any early reference for a name when
/// its creation ends, including by unwinding.
struct InCreationMark<'a> {
    store: &'a SingletonStore,
    name: &'a str,
}

impl Drop for InCreationMark<'_> {
    fn drop(&mut self) {
        self.store.in_creation.lock().remove(self.name);
        self.store.early.lock().remove(self.name);
    }
}

impl Default for SingletonStore {
    fn default() -> Self {
        Self {
            creation_lock: ReentrantMutex::new(()),
            complete: RwLock::new(new_map()),
            early: Mutex::new(new_map()),
            in_creation: Mutex::new(new_set()),
            order: Mutex::new(Vec::new()),
            manual: Mutex::new(new_set()),
            products: RwLock::new(new_map()),
            inner_beans: Mutex::new(DisposeBag::default()),
        }
    }
}

impl SingletonStore {
    /// Takes the creation lock; re-entrant on the owning thread.
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.creation_lock.lock()
    }

    /// Completed singleton, if any.
    pub(crate) fn get(&self, name: &str) -> Option<Instance> {
        self.complete.read().get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.complete.read().contains_key(name)
    }

    /// Returns the cached singleton or builds it with `create`.
    ///
    /// A singleton that is already being built on this thread resolves to
    /// its early reference when one was exposed, and fails with
    /// `BeanCurrentlyInCreation` otherwise. The early reference is dropped
    /// whether or not `create` succeeds.
    pub(crate) fn get_or_create<F>(&self, name: &str, create: F) -> BeansResult<Instance>
    where
        F: FnOnce() -> BeansResult<Instance>,
    {
        if let Some(instance) = self.get(name) {
            return Ok(instance);
        }
        let _lock = self.lock();
        if let Some(instance) = self.get(name) {
            return Ok(instance);
        }
        if let Some(instance) = self.early.lock().get(name).cloned() {
            trace!("Returning eagerly cached instance of singleton bean '{}'", name);
            return Ok(instance);
        }
        if !self.in_creation.lock().insert(name.to_string()) {
            return Err(BeansError::BeanCurrentlyInCreation {
                bean_name: name.to_string(),
            });
        }
        let _mark = InCreationMark { store: self, name };

        debug!("Creating shared instance of singleton bean '{}'", name);
        let instance = create()?;
        self.complete.write().insert(name.to_string(), instance.clone());
        self.order.lock().push(name.to_string());
        Ok(instance)
    }

    /// Publishes a not yet populated singleton to its own creating thread.
    pub(crate) fn expose_early(&self, name: &str, instance: Instance) {
        let _lock = self.lock();
        debug!(
            "Eagerly caching bean '{}' to allow for resolving potential circular references",
            name
        );
        self.early.lock().insert(name.to_string(), instance);
    }

    pub(crate) fn is_in_creation(&self, name: &str) -> bool {
        self.in_creation.lock().contains(name)
    }

    /// Adds an externally created singleton.
    pub(crate) fn register(&self, name: &str, instance: Instance) -> BeansResult<()> {
        let _lock = self.lock();
        let mut complete = self.complete.write();
        if let Some(existing) = complete.get(name) {
            return Err(BeansError::store(
                name,
                None,
                format!(
                    "Could not register object [{:?}] under bean name '{}': there's already object [{:?}] bound",
                    instance, name, existing
                ),
            ));
        }
        debug!("Registering singleton '{}'", name);
        complete.insert(name.to_string(), instance);
        drop(complete);
        self.order.lock().push(name.to_string());
        self.manual.lock().insert(name.to_string());
        Ok(())
    }

    /// Names of singletons registered through [`register`](Self::register),
    /// in registration order.
    pub(crate) fn manual_names(&self) -> Vec<String> {
        let manual = self.manual.lock();
        self.order
            .lock()
            .iter()
            .filter(|name| manual.contains(*name))
            .cloned()
            .collect()
    }

    /// Singleton names in the order they were completed.
    pub(crate) fn creation_order(&self) -> Vec<String> {
        self.order.lock().clone()
    }

    pub(crate) fn remove(&self, name: &str) -> Option<Instance> {
        self.order.lock().retain(|n| n != name);
        self.manual.lock().remove(name);
        self.products.write().remove(name);
        self.complete.write().remove(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.complete.read().len()
    }

    // ---- factory-bean products ----

    pub(crate) fn product(&self, name: &str) -> Option<Instance> {
        self.products.read().get(name).cloned()
    }

    pub(crate) fn cache_product(&self, name: &str, product: Instance) {
        self.products.write().insert(name.to_string(), product);
    }

    // ---- inner beans ----

    pub(crate) fn register_inner_bean(&self, bean: InnerBean) {
        trace!("Registering disposable inner bean '{}'", bean.name);
        self.inner_beans.lock().push(bean);
    }

    /// Takes every tracked inner bean, newest first.
    pub(crate) fn drain_inner_beans(&self) -> Vec<InnerBean> {
        self.inner_beans.lock().drain_reverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::ClassBuilder;

    struct Thing;

    fn thing() -> Instance {
        let class = ClassBuilder::<Thing>::new("Thing").build();
        Instance::new(&class, Thing)
    }

    #[test]
    fn creates_once() {
        let store = SingletonStore::default();
        let first = store.get_or_create("a", || Ok(thing())).unwrap();
        let second = store.get_or_create("a", || panic!("must not run twice")).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(store.creation_order(), ["a"]);
    }

    #[test]
    fn reentry_without_early_reference_fails() {
        let store = SingletonStore::default();
        let err = store
            .get_or_create("a", || store.get_or_create("a", || Ok(thing())))
            .unwrap_err();
        assert!(matches!(err, BeansError::BeanCurrentlyInCreation { .. }));
        assert!(!store.is_in_creation("a"));
        assert!(!store.contains("a"));
    }

    #[test]
    fn early_reference_resolves_reentry_and_is_dropped_on_failure() {
        let store = SingletonStore::default();
        let raw = thing();
        let result = store.get_or_create("a", || {
            store.expose_early("a", raw.clone());
            let seen = store.get_or_create("a", || unreachable!())?;
            assert!(seen.ptr_eq(&raw));
            Err(BeansError::creation("a", None, "boom", None))
        });
        assert!(result.is_err());
        assert!(store.early.lock().is_empty());
        assert!(store.get("a").is_none());
    }

    #[test]
    fn panicking_creation_leaves_nothing_behind() {
        let store = SingletonStore::default();
        let raw = thing();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.get_or_create("a", || {
                store.expose_early("a", raw.clone());
                panic!("init blew up");
            })
        }));
        assert!(outcome.is_err());
        assert!(!store.is_in_creation("a"));
        assert!(store.early.lock().is_empty());

        let fresh = store.get_or_create("a", || Ok(thing())).unwrap();
        assert!(!fresh.ptr_eq(&raw));
        assert_eq!(store.creation_order(), ["a"]);
    }

    #[test]
    fn manual_registration_rejects_duplicates() {
        let store = SingletonStore::default();
        store.register("x", thing()).unwrap();
        assert!(store.register("x", thing()).is_err());
        assert_eq!(store.manual_names(), ["x"]);
        assert!(store.remove("x").is_some());
        assert_eq!(store.len(), 0);
    }
}
