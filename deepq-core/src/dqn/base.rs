//! DQN agent with replay memory and a periodically synchronized target snapshot.
use super::config::DqnConfig;
use crate::{
    error::DqnError,
    explorer::EpsilonGreedy,
    frame::StackedInput,
    minibatch::MinibatchBuilder,
    record::{Record, RecordValue},
    replay_memory::ReplayMemory,
    target::TargetSnapshot,
    transition::{Action, ActionValue, Transition},
    ExperienceBufferBase, ReplayBufferBase, ValueFunction,
};
use anyhow::{Context, Result};
use log::{info, trace};
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;

/// DQN agent.
///
/// The agent owns the replay memory, the live value function, its target
/// snapshot and one random number generator. Exploration draws and minibatch
/// sampling both consume that generator in call order, so a run is reproducible
/// from the configured seed.
///
/// Calls must be serialized by the caller; an update samples, computes targets
/// and takes a gradient step without interleaving.
pub struct Dqn<Q: ValueFunction> {
    qnet: Q,
    qnet_tgt: TargetSnapshot<Q>,
    memory: ReplayMemory,
    explorer: EpsilonGreedy,
    discount_factor: f64,
    batch_size: usize,
    target_sync_interval: usize,
    n_updates: usize,
    rng: StdRng,
}

impl<Q: ValueFunction> Dqn<Q> {
    /// Constructs DQN agent.
    ///
    /// Builds the value function, its optimizer and a target snapshot holding a
    /// copy of the initial parameters. Any failure is returned and no agent is
    /// constructed.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.discount_factor) {
            return Err(DqnError::InvalidConfig(format!(
                "discount factor must be in [0, 1], got {}",
                config.discount_factor
            ))
            .into());
        }
        if config.batch_size == 0 {
            return Err(DqnError::InvalidConfig("batch size must be positive".into()).into());
        }
        if config.target_sync_interval == 0 {
            return Err(
                DqnError::InvalidConfig("target sync interval must be positive".into()).into(),
            );
        }

        let model_config = config.model_config.context("model_config is not set.")?;
        let qnet = Q::build(model_config.clone()).context("Failed to build value function")?;

        let n_outputs = qnet.n_outputs();
        let explorer = EpsilonGreedy::new(config.legal_actions, n_outputs)?;

        let qnet_tgt =
            TargetSnapshot::build(model_config, &qnet).context("Failed to build target snapshot")?;
        let memory = ReplayMemory::build(&config.replay_memory)?;

        info!(
            "Built DQN agent: {} outputs, {} legal actions, replay capacity {}",
            n_outputs,
            explorer.legal_actions().len(),
            memory.capacity()
        );

        Ok(Self {
            qnet,
            qnet_tgt,
            memory,
            explorer,
            discount_factor: config.discount_factor,
            batch_size: config.batch_size,
            target_sync_interval: config.target_sync_interval,
            n_updates: 0,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Adds a transition to the replay memory, evicting the oldest one when full.
    pub fn push(&mut self, tr: Transition) {
        self.memory.push(tr);
    }

    /// Selects an action by epsilon-greedy.
    pub fn select_action(&mut self, state: &StackedInput, epsilon: f64) -> Result<Action> {
        self.explorer
            .action(&self.qnet, state, epsilon, &mut self.rng)
    }

    /// Returns the best legal action of `state` and its estimated value.
    pub fn select_action_greedily(&self, state: &StackedInput) -> Result<ActionValue> {
        let best = self
            .explorer
            .select_greedily(&self.qnet, std::slice::from_ref(state))?;
        Ok(best[0])
    }

    /// Returns the best legal action of each state with a single batched evaluation,
    /// in input order.
    pub fn select_actions_greedily(&self, states: &[StackedInput]) -> Result<Vec<ActionValue>> {
        self.explorer.select_greedily(&self.qnet, states)
    }

    /// Updates the value function with one minibatch.
    ///
    /// Fails with [`DqnError::InsufficientMemory`] when the replay memory holds
    /// fewer transitions than the batch size.
    pub fn update(&mut self) -> Result<()> {
        self.update_with_record().map(|_| ())
    }

    /// Updates the value function with one minibatch and returns the loss.
    ///
    /// If the scheduled synchronization fails, the gradient step is kept but
    /// [`Dqn::n_updates`] is not advanced.
    pub fn update_with_record(&mut self) -> Result<Record> {
        let batch = {
            let transitions = self.memory.batch(self.batch_size, &mut self.rng)?;
            MinibatchBuilder::new(&self.explorer, self.discount_factor)
                .build(&transitions, &self.qnet_tgt)?
        };
        let loss = self
            .qnet
            .apply_gradient_step(&batch.inputs, &batch.targets, &batch.filter)?;
        trace!("Update {}: loss = {}", self.n_updates + 1, loss);

        // The counter only advances once a scheduled sync succeeded, so a failed
        // sync is retried by the next update.
        if (self.n_updates + 1) % self.target_sync_interval == 0 {
            self.synchronize()?;
        }
        self.n_updates += 1;

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("n_updates", RecordValue::Scalar(self.n_updates as f32)),
        ]))
    }

    /// Copies the parameters of the value function into the target snapshot.
    pub fn synchronize(&mut self) -> Result<()> {
        self.qnet_tgt.synchronize(&self.qnet)
    }

    /// Returns the number of transitions in the replay memory.
    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    /// Returns the number of optimizer steps of the value function.
    pub fn current_iteration(&self) -> usize {
        self.qnet.iteration()
    }

    /// Returns the number of updates done by this agent.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Returns the legal actions.
    pub fn legal_actions(&self) -> &[Action] {
        self.explorer.legal_actions()
    }

    /// Returns the discount factor.
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Returns the live value function.
    pub fn value_function(&self) -> &Q {
        &self.qnet
    }

    /// Returns the target snapshot.
    pub fn target(&self) -> &TargetSnapshot<Q> {
        &self.qnet_tgt
    }

    /// Returns the replay memory.
    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    /// Loads trained parameters into the value function and synchronizes the
    /// target snapshot with them.
    pub fn load_trained_model(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.qnet
            .load_params(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;
        info!("Load trained model from {:?}", path);
        self.synchronize()
    }

    /// Saves the parameters of the value function.
    pub fn save_trained_model(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.qnet
            .save_params(path)
            .with_context(|| format!("Failed to save model to {:?}", path))?;
        info!("Save trained model to {:?}", path);
        Ok(())
    }

    /// Restores the optimizer state of the value function.
    pub fn restore_solver(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.qnet
            .restore_solver(path)
            .with_context(|| format!("Failed to restore solver from {:?}", path))?;
        info!("Restore solver from {:?}", path);
        Ok(())
    }

    /// Saves the optimizer state of the value function.
    pub fn save_solver(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.qnet
            .save_solver(path)
            .with_context(|| format!("Failed to save solver to {:?}", path))?;
        info!("Save solver to {:?}", path);
        Ok(())
    }
}
