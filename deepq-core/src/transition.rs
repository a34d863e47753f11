//! Actions and transitions.
use crate::{
    error::DqnError,
    frame::{Frame, StackedInput},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// An action, identified by its output column in the value function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Action(pub usize);

impl Action {
    /// Returns the output column of this action.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for Action {
    fn from(ix: usize) -> Self {
        Self(ix)
    }
}

/// An action together with its estimated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionValue {
    /// The selected action.
    pub action: Action,

    /// The estimated action value.
    pub value: f32,
}

/// What follows an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The episode continues with this frame.
    Continues(Frame),

    /// The episode ended; nothing is gained beyond the reward.
    Terminal,
}

/// One recorded step `(s_t, a_t, r_t, o_t+1)`.
///
/// Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    state: StackedInput,
    action: Action,
    reward: f32,
    next: Outcome,
}

impl Transition {
    /// Constructs a transition.
    ///
    /// Fails if the next frame does not have the shape of the frames in `state`.
    pub fn new(state: StackedInput, action: Action, reward: f32, next: Outcome) -> Result<Self> {
        if let Outcome::Continues(frame) = &next {
            if frame.shape() != state.frame_shape() {
                return Err(DqnError::ShapeMismatch {
                    expected: state.frame_shape().to_vec(),
                    actual: frame.shape().to_vec(),
                }
                .into());
            }
        }
        Ok(Self {
            state,
            action,
            reward,
            next,
        })
    }

    /// Returns `s_t`.
    pub fn state(&self) -> &StackedInput {
        &self.state
    }

    /// Returns `a_t`.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns `r_t`.
    pub fn reward(&self) -> f32 {
        self.reward
    }

    /// Returns the outcome of the action.
    pub fn next(&self) -> &Outcome {
        &self.next
    }

    /// Returns `true` if the episode ended with this transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self.next, Outcome::Terminal)
    }

    /// Returns `s_t+1`, or `None` for a terminal transition.
    pub fn next_state(&self) -> Option<StackedInput> {
        match &self.next {
            Outcome::Continues(frame) => Some(self.state.shifted(frame)),
            Outcome::Terminal => None,
        }
    }
}
