//! Core interfaces.
mod replay_buffer;
mod value_function;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use value_function::ValueFunction;
