//! Buffer with a flush threshold

/// Accumulates items until `capacity` is reached
#[derive(Debug, Clone)]
pub struct BatchBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> BatchBuffer<T> {
    /// Create a buffer that reports full at `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity.min(1 << 20)),
            capacity,
        }
    }

    /// Add an item; returns `true` once the buffer has reached capacity
    pub fn append(&mut self, item: T) -> bool {
        self.items.push(item);
        self.is_full()
    }

    /// Take everything buffered so far, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity.min(1 << 20)))
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
