//! LIFO bag of things to tear down at shutdown.

/// Items are handed back newest first.
pub(crate) struct DisposeBag<T> {
    items: Vec<T>,
}

impl<T> Default for DisposeBag<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> DisposeBag<T> {
    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Empties the bag, returning its items in reverse insertion order.
    pub(crate) fn drain_reverse(&mut self) -> Vec<T> {
        let mut items = std::mem::take(&mut self.items);
        items.reverse();
        items
    }
}
