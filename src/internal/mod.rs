//! Internal implementation details.

pub(crate) mod creation;
pub(crate) mod dispose_bag;
pub(crate) mod maps;

pub(crate) use creation::CreationTracker;
pub(crate) use dispose_bag::DisposeBag;
pub(crate) use maps::{new_map, new_set, FastMap, FastSet};
