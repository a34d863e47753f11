//! Bounded FIFO replay memory of transitions.
mod base;
mod config;
pub use base::ReplayMemory;
pub use config::ReplayMemoryConfig;
