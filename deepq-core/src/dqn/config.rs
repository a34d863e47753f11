//! Configuration of DQN agent.
use crate::{replay_memory::ReplayMemoryConfig, transition::Action};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn).
///
/// `C` is the configuration of the value function and its optimizer.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<C> {
    pub(super) model_config: Option<C>,
    pub(super) legal_actions: Vec<Action>,
    pub(super) replay_memory: ReplayMemoryConfig,
    pub(super) discount_factor: f64,
    pub(super) batch_size: usize,
    pub(super) target_sync_interval: usize,
    pub(super) seed: u64,
}

impl<C> Default for DqnConfig<C> {
    fn default() -> Self {
        Self {
            model_config: None,
            legal_actions: vec![],
            replay_memory: ReplayMemoryConfig::default(),
            discount_factor: 0.99,
            batch_size: 32,
            target_sync_interval: 10_000,
            seed: 0,
        }
    }
}

impl<C> DqnConfig<C>
where
    C: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the value function.
    pub fn model_config(mut self, v: C) -> Self {
        self.model_config = Some(v);
        self
    }

    /// Sets the legal action set.
    ///
    /// Ties between equally valued actions go to the one listed first.
    pub fn legal_actions(mut self, v: Vec<Action>) -> Self {
        self.legal_actions = v;
        self
    }

    /// Sets the configuration of the replay memory.
    pub fn replay_memory(mut self, v: ReplayMemoryConfig) -> Self {
        self.replay_memory = v;
        self
    }

    /// Sets the capacity of the replay memory.
    pub fn replay_memory_capacity(mut self, v: usize) -> Self {
        self.replay_memory = self.replay_memory.capacity(v);
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the number of transitions in a minibatch.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the number of updates between target snapshot synchronizations.
    pub fn target_sync_interval(mut self, v: usize) -> Self {
        self.target_sync_interval = v;
        self
    }

    /// Sets the seed of the agent's random number generator.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DqnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {:?}", path_);
        Ok(())
    }
}
