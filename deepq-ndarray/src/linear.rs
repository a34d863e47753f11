//! Linear action-value model.
mod base;
mod config;
pub use base::{LinearParams, LinearQ};
pub use config::LinearQConfig;
