//! Extension points of the bean factory.

mod post_processor;

pub use post_processor::BeanPostProcessor;
