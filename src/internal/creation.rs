//! Per-thread tracking of the beans currently being created.
//!
//! Each thread keeps a stack of the bean names it is building for one
//! factory. The stack bounds creation depth and catches a prototype that
//! requires itself, which would otherwise recurse until the stack overflows.
//! Singleton cycles are handled by the singleton store instead.

use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::error::BeansError;
use crate::internal::{new_map, FastMap};

#[derive(Default)]
struct CreationStack {
    names: Vec<String>,
    prototypes: Vec<bool>,
}

/// Creation stacks of one factory, keyed by thread.
pub(crate) struct CreationTracker {
    stacks: Mutex<FastMap<ThreadId, CreationStack>>,
    max_depth: usize,
}

impl CreationTracker {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            stacks: Mutex::new(new_map()),
            max_depth,
        }
    }

    /// Pushes `name` onto the calling thread's stack.
    ///
    /// Fails when a prototype is already being created further up the same
    /// stack, or when the stack is already `max_depth` deep.
    pub(crate) fn enter(&self, name: &str, prototype: bool) -> Result<CreationGuard<'_>, BeansError> {
        let thread = thread::current().id();
        let mut stacks = self.stacks.lock();
        let stack = stacks.entry(thread).or_default();

        if prototype
            && stack
                .names
                .iter()
                .zip(&stack.prototypes)
                .any(|(n, &is_prototype)| is_prototype && n == name)
        {
            return Err(BeansError::BeanCurrentlyInCreation {
                bean_name: name.to_string(),
            });
        }
        if stack.names.len() >= self.max_depth {
            let path = stack.names.join(" -> ");
            return Err(BeansError::creation(
                name,
                None,
                format!("Maximum bean creation depth of {} exceeded: {} -> {}", self.max_depth, path, name),
                None,
            ));
        }

        stack.names.push(name.to_string());
        stack.prototypes.push(prototype);
        Ok(CreationGuard { tracker: self, thread })
    }

    /// Number of beans being created on the calling thread.
    pub(crate) fn depth(&self) -> usize {
        let thread = thread::current().id();
        self.stacks.lock().get(&thread).map_or(0, |stack| stack.names.len())
    }
}

/// Pops the entry pushed by [`CreationTracker::enter`] when dropped.
pub(crate) struct CreationGuard<'a> {
    tracker: &'a CreationTracker,
    thread: ThreadId,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut stacks = self.tracker.stacks.lock();
        if let Some(stack) = stacks.get_mut(&self.thread) {
            stack.names.pop();
            stack.prototypes.pop();
            if stack.names.is_empty() {
                stacks.remove(&self.thread);
            }
        }
    }
}
