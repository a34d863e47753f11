//! Assembly of training tensors from sampled transitions.
//!
//! A minibatch of `B` transitions becomes three tensors:
//!
//! * `inputs`, shape `(B, FRAME_STACK, height, width)`: the states `s_t`.
//! * `targets`, shape `(B, n_outputs)`: zero except `targets[[i, a_i]] = y_i`.
//! * `filter`, shape `(B, n_outputs)`: zero except `filter[[i, a_i]] = 1`.
//!
//! The regression target is `y_i = r_i` for terminal transitions and
//! `y_i = r_i + gamma * max_a Q_target(s_i+1, a)` otherwise, where the maximum
//! runs over legal actions. Since the loss compares `Q(s_i) * filter` with
//! `targets`, only the value of the taken action receives a gradient.
use crate::{
    error::DqnError,
    explorer::EpsilonGreedy,
    frame::batch_inputs,
    target::TargetSnapshot,
    transition::Transition,
    ValueFunction,
};
use anyhow::{bail, Result};
use ndarray::{Array2, Array4};

/// Training tensors of one minibatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Minibatch {
    /// Stacked input of each transition.
    pub inputs: Array4<f32>,

    /// Target value at the taken action, zero elsewhere.
    pub targets: Array2<f32>,

    /// One at the taken action, zero elsewhere.
    pub filter: Array2<f32>,
}

/// Returns `reward` for a terminal transition (`bootstrap == None`), and
/// `reward + gamma * bootstrap` otherwise.
pub fn target_value(reward: f32, bootstrap: Option<f32>, gamma: f64) -> f32 {
    match bootstrap {
        None => reward,
        Some(v) => reward + gamma as f32 * v,
    }
}

/// Builds [`Minibatch`]es.
pub struct MinibatchBuilder<'a> {
    explorer: &'a EpsilonGreedy,
    gamma: f64,
}

impl<'a> MinibatchBuilder<'a> {
    /// Constructs a builder.
    ///
    /// * `explorer` - gives the legal actions maximized over for bootstrap values,
    ///   and the number of columns of the targets and filter tensors.
    /// * `gamma` - the discount factor.
    pub fn new(explorer: &'a EpsilonGreedy, gamma: f64) -> Self {
        Self { explorer, gamma }
    }

    /// Returns `max_a Q_target(s_t+1, a)` of each transition, `None` for terminal ones.
    ///
    /// All successor states are evaluated in one forward pass; no pass is made if
    /// every transition is terminal.
    pub fn bootstrap_values<Q: ValueFunction>(
        &self,
        transitions: &[&Transition],
        target: &TargetSnapshot<Q>,
    ) -> Result<Vec<Option<f32>>> {
        let (ixs, successors): (Vec<usize>, Vec<_>) = transitions
            .iter()
            .enumerate()
            .filter_map(|(i, tr)| tr.next_state().map(|s| (i, s)))
            .unzip();

        let mut values = vec![None; transitions.len()];
        if successors.is_empty() {
            return Ok(values);
        }

        let inputs = batch_inputs(&successors)?;
        let best = self
            .explorer
            .select_greedily_batch(target.value_function(), &inputs)?;
        for (ix, av) in ixs.into_iter().zip(best) {
            values[ix] = Some(av.value);
        }
        Ok(values)
    }

    /// Builds the training tensors of `transitions`.
    pub fn build<Q: ValueFunction>(
        &self,
        transitions: &[&Transition],
        target: &TargetSnapshot<Q>,
    ) -> Result<Minibatch> {
        if transitions.is_empty() {
            bail!("Cannot build a minibatch without transitions");
        }
        let inputs = batch_inputs(transitions.iter().map(|&tr| tr.state()))?;
        let bootstrap = self.bootstrap_values(transitions, target)?;

        let n = transitions.len();
        let n_outputs = self.explorer.n_outputs();
        let mut targets = Array2::zeros((n, n_outputs));
        let mut filter = Array2::zeros((n, n_outputs));
        for (i, (tr, v)) in transitions.iter().zip(bootstrap).enumerate() {
            let a = tr.action().index();
            if a >= n_outputs {
                return Err(DqnError::IllegalAction(a).into());
            }
            targets[[i, a]] = target_value(tr.reward(), v, self.gamma);
            filter[[i, a]] = 1.0;
        }

        Ok(Minibatch {
            inputs,
            targets,
            filter,
        })
    }
}
