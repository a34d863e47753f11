//! Epsilon-greedy action selection over the legal action set.
use crate::{
    error::DqnError,
    frame::{batch_inputs, StackedInput},
    transition::{Action, ActionValue},
    ValueFunction,
};
use anyhow::Result;
use ndarray::{Array2, Array4, ArrayView1};
use rand::Rng;
use std::collections::HashSet;

/// Epsilon-greedy explorer.
///
/// Greedy selection considers legal actions only. Among actions with the same
/// maximal value, the one listed first in the legal action set wins.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    legal_actions: Vec<Action>,
    n_outputs: usize,
}

impl EpsilonGreedy {
    /// Constructs an explorer over actions of a value function with `n_outputs` outputs.
    ///
    /// The legal action set must be non-empty and free of duplicates, and every
    /// action must index an output.
    pub fn new(legal_actions: Vec<Action>, n_outputs: usize) -> Result<Self> {
        if legal_actions.is_empty() {
            return Err(DqnError::InvalidConfig("legal action set is empty".into()).into());
        }
        let mut seen = HashSet::new();
        for &a in legal_actions.iter() {
            if a.index() >= n_outputs {
                return Err(DqnError::IllegalAction(a.index()).into());
            }
            if !seen.insert(a) {
                return Err(DqnError::InvalidConfig(format!(
                    "action {} appears twice in the legal action set",
                    a.index()
                ))
                .into());
            }
        }
        Ok(Self {
            legal_actions,
            n_outputs,
        })
    }

    /// Returns the legal actions in their configured order.
    pub fn legal_actions(&self) -> &[Action] {
        &self.legal_actions
    }

    /// Returns the number of action values expected per state.
    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    /// Returns the legal action with the largest value in `q`.
    ///
    /// `q` holds one value per output column.
    pub fn best(&self, q: ArrayView1<f32>) -> Result<ActionValue> {
        if q.len() != self.n_outputs {
            return Err(DqnError::ShapeMismatch {
                expected: vec![self.n_outputs],
                actual: vec![q.len()],
            }
            .into());
        }
        let first = self.legal_actions[0];
        let init = ActionValue {
            action: first,
            value: q[first.index()],
        };
        Ok(self.legal_actions[1..].iter().fold(init, |best, &action| {
            let value = q[action.index()];
            if value > best.value {
                ActionValue { action, value }
            } else {
                best
            }
        }))
    }

    /// Returns the best legal action of every row of action values.
    pub fn best_of_rows(&self, q: &Array2<f32>) -> Result<Vec<ActionValue>> {
        q.outer_iter().map(|row| self.best(row)).collect()
    }

    /// Evaluates a prepared input tensor with a single forward pass and returns the
    /// best legal action of each sample, in input order.
    pub fn select_greedily_batch<Q: ValueFunction>(
        &self,
        q: &Q,
        inputs: &Array4<f32>,
    ) -> Result<Vec<ActionValue>> {
        let values = q.forward(inputs)?;
        let expected = (inputs.dim().0, self.n_outputs);
        if values.dim() != expected {
            return Err(DqnError::ShapeMismatch {
                expected: vec![expected.0, expected.1],
                actual: values.shape().to_vec(),
            }
            .into());
        }
        self.best_of_rows(&values)
    }

    /// Returns the best legal action of each state, in input order.
    pub fn select_greedily<Q: ValueFunction>(
        &self,
        q: &Q,
        states: &[StackedInput],
    ) -> Result<Vec<ActionValue>> {
        if states.is_empty() {
            return Ok(vec![]);
        }
        self.select_greedily_batch(q, &batch_inputs(states)?)
    }

    /// Takes a uniformly random legal action with probability `epsilon`, the greedy
    /// action otherwise.
    ///
    /// One draw from `rng` decides between the two; a random action consumes one more.
    pub fn action<Q, R>(&self, q: &Q, state: &StackedInput, epsilon: f64, rng: &mut R) -> Result<Action>
    where
        Q: ValueFunction,
        R: Rng + ?Sized,
    {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(DqnError::InvalidEpsilon(epsilon).into());
        }

        if rng.gen::<f64>() < epsilon {
            let ix = rng.gen_range(0..self.legal_actions.len());
            Ok(self.legal_actions[ix])
        } else {
            let best = self.select_greedily(q, std::slice::from_ref(state))?;
            Ok(best[0].action)
        }
    }
}
