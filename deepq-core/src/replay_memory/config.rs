//! Configuration of [`ReplayMemory`](super::ReplayMemory).
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Configuration of [`ReplayMemory`](super::ReplayMemory).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayMemoryConfig {
    pub(super) capacity: usize,
}

impl Default for ReplayMemoryConfig {
    fn default() -> Self {
        Self { capacity: 500_000 }
    }
}

impl ReplayMemoryConfig {
    /// Sets the capacity of the replay memory.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Returns the capacity of the replay memory.
    pub fn get_capacity(&self) -> usize {
        self.capacity
    }
}
