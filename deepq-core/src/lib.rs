#![warn(missing_docs)]
//! Decision-and-learning core of a deep Q-network agent acting on stacked frames.
//!
//! The crate provides the parts of DQN that decide the learning signal:
//!
//! * [`ReplayMemory`] - bounded FIFO store of [`Transition`]s.
//! * [`EpsilonGreedy`] - action selection over a legal action set.
//! * [`TargetSnapshot`] - frozen copy of the value function for bootstrap targets.
//! * [`MinibatchBuilder`] - inputs, targets and filter tensors of a minibatch.
//! * [`Dqn`] - the agent tying these together in [`Dqn::update`].
//!
//! The action-value function itself is behind the [`ValueFunction`] trait.
//!
//! ```rust
//! use deepq_core::{
//!     dummy::{DummyValueFunction, DummyValueFunctionConfig},
//!     Action, Dqn, DqnConfig, Frame, Outcome, StackedInput, Transition,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DqnConfig::default()
//!     .model_config(DummyValueFunctionConfig::default().n_outputs(3))
//!     .legal_actions(vec![Action(0), Action(1), Action(2)])
//!     .replay_memory_capacity(100)
//!     .batch_size(4);
//! let mut agent = Dqn::<DummyValueFunction>::build(config)?;
//!
//! let state = StackedInput::repeat(Frame::from_vec(2, 2, vec![0; 4])?);
//! for _ in 0..4 {
//!     let action = agent.select_action(&state, 0.1)?;
//!     let next = Frame::from_vec(2, 2, vec![1; 4])?;
//!     agent.push(Transition::new(state.clone(), action, 1.0, Outcome::Continues(next))?);
//! }
//! agent.update()?;
//! # Ok(())
//! # }
//! ```
pub mod dummy;
pub mod error;
pub mod explorer;
pub mod frame;
pub mod minibatch;
pub mod record;
pub mod replay_memory;
pub mod target;
pub mod transition;

mod base;
pub use base::{ExperienceBufferBase, ReplayBufferBase, ValueFunction};

mod dqn;
pub use dqn::{Dqn, DqnConfig};
pub use error::DqnError;
pub use explorer::EpsilonGreedy;
pub use frame::{Frame, StackedInput, FRAME_STACK};
pub use minibatch::{Minibatch, MinibatchBuilder};
pub use replay_memory::{ReplayMemory, ReplayMemoryConfig};
pub use target::TargetSnapshot;
pub use transition::{Action, ActionValue, Outcome, Transition};
