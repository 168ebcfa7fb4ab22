//! Hooks around bean initialization and destruction.

use crate::error::BoxError;
use crate::value::Instance;

/// Hook invoked for every bean the factory creates or destroys.
///
/// Post-processors run in registration order around initialization and in
/// reverse registration order before destruction. The initialization hooks
/// may return a different instance, which then replaces the bean. Returning
/// `None` is an error: a hook that wants to keep the bean must hand it back.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use ferrous_beans::{BeanPostProcessor, BoxError, Instance};
///
/// #[derive(Default)]
/// struct CountingProcessor {
///     initialized: AtomicUsize,
/// }
///
/// impl BeanPostProcessor for CountingProcessor {
///     fn post_process_after_initialization(
///         &self,
///         bean: Instance,
///         _name: &str,
///     ) -> Result<Option<Instance>, BoxError> {
///         self.initialized.fetch_add(1, Ordering::SeqCst);
///         Ok(Some(bean))
///     }
/// }
/// ```
pub trait BeanPostProcessor: Send + Sync + 'static {
    /// Called after properties are set and before any init callback.
    fn post_process_before_initialization(&self, bean: Instance, _name: &str) -> Result<Option<Instance>, BoxError> {
        Ok(Some(bean))
    }

    /// Called after all init callbacks.
    fn post_process_after_initialization(&self, bean: Instance, _name: &str) -> Result<Option<Instance>, BoxError> {
        Ok(Some(bean))
    }

    /// Called before the bean's own destroy callbacks. Failures are logged.
    fn post_process_before_destruction(&self, _bean: &Instance, _name: &str) -> Result<(), BoxError> {
        Ok(())
    }
}
