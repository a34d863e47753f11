//! Interface of the action-value function approximator.
use anyhow::Result;
use ndarray::{Array2, Array4};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, path::Path};

/// An action-value function trained by gradient steps on batched tensors.
///
/// The agent only sees this trait; network architecture and optimizer belong to
/// the implementation. Inputs have shape `(batch, FRAME_STACK, height, width)`
/// and action values have shape `(batch, n_outputs)`, one column per action.
pub trait ValueFunction: Sized {
    /// Configuration of the model and its optimizer.
    type Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned;

    /// A full copy of the trainable parameters.
    ///
    /// Values of this type must not share storage with the model they were taken
    /// from.
    type Params: Clone + Debug + PartialEq;

    /// Builds the model and its optimizer.
    fn build(config: Self::Config) -> Result<Self>;

    /// Returns the number of action-value outputs.
    fn n_outputs(&self) -> usize;

    /// Returns the number of optimizer steps taken so far.
    fn iteration(&self) -> usize;

    /// Evaluates action values for a batch of stacked inputs.
    fn forward(&self, inputs: &Array4<f32>) -> Result<Array2<f32>>;

    /// Takes one optimizer step on the squared error between
    /// `forward(inputs) * filter` and `targets`, and returns the loss.
    ///
    /// `targets` and `filter` have the shape of the action values. Entries where
    /// `filter` is zero must contribute no gradient.
    fn apply_gradient_step(
        &mut self,
        inputs: &Array4<f32>,
        targets: &Array2<f32>,
        filter: &Array2<f32>,
    ) -> Result<f32>;

    /// Returns a copy of the parameters.
    fn params(&self) -> Self::Params;

    /// Overwrites all parameters.
    fn set_params(&mut self, params: &Self::Params) -> Result<()>;

    /// Saves the parameters.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Loads parameters saved with [`ValueFunction::save_params`].
    fn load_params(&mut self, path: &Path) -> Result<()>;

    /// Saves the optimizer state.
    fn save_solver(&self, path: &Path) -> Result<()>;

    /// Restores an optimizer state saved with [`ValueFunction::save_solver`].
    fn restore_solver(&mut self, path: &Path) -> Result<()>;
}
