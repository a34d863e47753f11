//! Replay buffer interface.
//!
//! Writing experiences and sampling batches are separate traits, so a buffer
//! can be filled by code that never samples from it.
use anyhow::Result;
use rand::Rng;

/// Interface for buffers that store experiences.
pub trait ExperienceBufferBase {
    /// The type of experience stored in the buffer.
    type Item;

    /// Pushes an experience into the buffer.
    ///
    /// Pushing never fails. A bounded buffer evicts its oldest items instead.
    fn push(&mut self, tr: Self::Item);

    /// Returns the number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no experience.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that sample batches for training.
pub trait ReplayBufferBase: ExperienceBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// Builds a replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Samples `size` experiences using the caller's random number generator.
    ///
    /// Requesting more experiences than the buffer holds is an error.
    fn batch<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Result<Vec<&Self::Item>>;
}
