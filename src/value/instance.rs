use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::introspect::{AnyBox, Class};

/// A shared, type-erased bean instance together with its [`Class`].
///
/// Cloning an `Instance` clones the handle, not the object; equality is
/// identity. State is guarded by a read-write lock so that the container can
/// populate a bean through its setters while other handles exist.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{ClassBuilder, Instance};
///
/// struct Counter { hits: u32 }
///
/// let class = ClassBuilder::<Counter>::new("Counter").build();
/// let a = Instance::new(&class, Counter { hits: 0 });
/// let b = a.clone();
///
/// b.with_mut(|c: &mut Counter| c.hits += 1);
/// assert_eq!(a.with(|c: &Counter| c.hits), Some(1));
/// assert!(a.ptr_eq(&b));
/// ```
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

struct InstanceInner {
    class: Arc<Class>,
    state: RwLock<AnyBox>,
}

impl Instance {
    /// Wraps `value` as an instance of `class`.
    pub fn new<T: Any + Send + Sync>(class: &Arc<Class>, value: T) -> Self {
        Self::from_box(class.clone(), Box::new(value))
    }

    pub(crate) fn from_box(class: Arc<Class>, state: AnyBox) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                class,
                state: RwLock::new(state),
            }),
        }
    }

    pub fn class(&self) -> &Arc<Class> {
        &self.inner.class
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the underlying Rust value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.state.read().is::<T>()
    }

    /// Runs `f` against the value if it is a `T`.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.inner.state.read();
        guard.downcast_ref::<T>().map(f)
    }

    /// Runs `f` against the value mutably if it is a `T`.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.inner.state.write();
        guard.downcast_mut::<T>().map(f)
    }

    /// Read guard on the value if it is a `T`.
    pub fn read<T: Any>(&self) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.inner.state.read(), |state| state.downcast_ref::<T>()).ok()
    }

    pub(crate) fn read_any(&self) -> RwLockReadGuard<'_, AnyBox> {
        self.inner.state.read()
    }

    pub(crate) fn write_any(&self) -> RwLockWriteGuard<'_, AnyBox> {
        self.inner.state.write()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Instance {}

impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.inner.class.name(), Arc::as_ptr(&self.inner))
    }
}
