//! Runtime type metadata.
//!
//! The container never inspects Rust types directly. Each bean type is
//! described once by a [`Class`]: its name and hierarchy, its properties with
//! getters and setters, its constructors and methods, and the lifecycle
//! capabilities it opts into.

mod builder;
mod class;
mod registry;
mod type_desc;

pub use builder::{Args, CallbackResult, ClassBuilder};
pub use class::{Class, ConstructorDescriptor, MethodDescriptor, PropertyDescriptor, StaticMethodDescriptor};
pub(crate) use class::{AnyBox, SetterError};
pub use registry::ClassRegistry;
pub use type_desc::{type_difference_weight, type_distance, TypeDesc, OBJECT};
