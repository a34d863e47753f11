#![warn(missing_docs)]
//! Action-value model for [`deepq_core`] built on `ndarray`.
//!
//! [`LinearQ`] maps the scaled pixels of a stacked input to one value per
//! action with a single linear layer. It is trained with the optimizers in
//! [`opt`] and persists parameters and optimizer state with `bincode`.
//!
//! ```rust
//! use deepq_core::{Action, Dqn, DqnConfig};
//! use deepq_ndarray::{opt::OptimizerConfig, LinearQ, LinearQConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let model_config = LinearQConfig::default()
//!     .frame_shape(8, 8)
//!     .n_outputs(4)
//!     .opt_config(OptimizerConfig::Sgd { lr: 0.01, momentum: 0.95 });
//! let config = DqnConfig::default()
//!     .model_config(model_config)
//!     .legal_actions(vec![Action(0), Action(1), Action(3)]);
//! let agent = Dqn::<LinearQ>::build(config)?;
//! assert_eq!(agent.memory_size(), 0);
//! # Ok(())
//! # }
//! ```
mod linear;
pub mod opt;
pub use linear::{LinearParams, LinearQ, LinearQConfig};
