//! Optimizers.
use anyhow::{ensure, Result};
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training the action-value model.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Stochastic gradient descent with momentum.
    Sgd {
        /// Learning rate.
        lr: f32,
        /// Momentum coefficient.
        #[serde(default)]
        momentum: f32,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f32,
        #[serde(default = "default_beta1")]
        /// Decay rate of the first moment estimate.
        beta1: f32,
        #[serde(default = "default_beta2")]
        /// Decay rate of the second moment estimate.
        beta2: f32,
        #[serde(default = "default_eps")]
        /// Term added to the denominator.
        eps: f32,
    },
}

fn default_beta1() -> f32 {
    0.9
}

fn default_beta2() -> f32 {
    0.999
}

fn default_eps() -> f32 {
    1e-8
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam {
            lr: 1e-4,
            beta1: default_beta1(),
            beta2: default_beta2(),
            eps: default_eps(),
        }
    }
}

impl OptimizerConfig {
    /// Constructs an optimizer for parameters of the given shapes.
    pub fn build(&self, shapes: &[&[usize]]) -> Optimizer {
        let zeros = || {
            shapes
                .iter()
                .map(|s| ArrayD::zeros(s.to_vec()))
                .collect::<Vec<_>>()
        };
        Optimizer {
            config: self.clone(),
            state: OptimizerState {
                iter: 0,
                first: zeros(),
                second: zeros(),
            },
        }
    }
}

/// Iteration count and moment estimates of an [`Optimizer`].
///
/// For SGD, `first` holds the velocities and `second` is unused.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OptimizerState {
    iter: usize,
    first: Vec<ArrayD<f32>>,
    second: Vec<ArrayD<f32>>,
}

/// Optimizer updating a fixed list of parameter arrays.
#[derive(Debug, Clone)]
pub struct Optimizer {
    config: OptimizerConfig,
    state: OptimizerState,
}

impl Optimizer {
    /// Returns the number of steps taken.
    pub fn iteration(&self) -> usize {
        self.state.iter
    }

    /// Returns the optimizer state.
    pub fn state(&self) -> &OptimizerState {
        &self.state
    }

    /// Replaces the optimizer state, keeping the configuration.
    ///
    /// Fails if the state was saved for parameters of other shapes.
    pub fn set_state(&mut self, state: OptimizerState) -> Result<()> {
        let shapes = |s: &OptimizerState| {
            s.first
                .iter()
                .chain(s.second.iter())
                .map(|a| a.shape().to_vec())
                .collect::<Vec<_>>()
        };
        ensure!(
            shapes(&state) == shapes(&self.state),
            "Optimizer state does not match the parameter shapes"
        );
        self.state = state;
        Ok(())
    }

    /// Takes one step. `params[i]` is updated with `grads[i]`.
    pub fn step(&mut self, params: Vec<ArrayViewMutD<f32>>, grads: Vec<ArrayViewD<f32>>) -> Result<()> {
        ensure!(
            params.len() == grads.len() && params.len() == self.state.first.len(),
            "Expected {} parameter arrays, got {} parameters and {} gradients",
            self.state.first.len(),
            params.len(),
            grads.len()
        );
        for ((p, g), m) in params.iter().zip(grads.iter()).zip(self.state.first.iter()) {
            ensure!(
                p.shape() == g.shape() && p.shape() == m.shape(),
                "Gradient shape {:?} does not match parameter shape {:?}",
                g.shape(),
                p.shape()
            );
        }

        self.state.iter += 1;
        let state = &mut self.state;
        match self.config {
            OptimizerConfig::Sgd { lr, momentum } => {
                for ((mut p, g), v) in params.into_iter().zip(grads).zip(state.first.iter_mut()) {
                    Zip::from(&mut p).and(&g).and(v).for_each(|p, &g, v| {
                        *v = momentum * *v - lr * g;
                        *p += *v;
                    });
                }
            }
            OptimizerConfig::Adam {
                lr,
                beta1,
                beta2,
                eps,
            } => {
                let t = state.iter as i32;
                let bc1 = 1.0 - beta1.powi(t);
                let bc2 = 1.0 - beta2.powi(t);
                let moments = state.first.iter_mut().zip(state.second.iter_mut());
                for ((mut p, g), (m, v)) in params.into_iter().zip(grads).zip(moments) {
                    Zip::from(&mut p).and(&g).and(m).and(v).for_each(|p, &g, m, v| {
                        *m = beta1 * *m + (1.0 - beta1) * g;
                        *v = beta2 * *v + (1.0 - beta2) * g * g;
                        *p -= lr * (*m / bc1) / ((*v / bc2).sqrt() + eps);
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_sgd_momentum() -> Result<()> {
        let mut opt = OptimizerConfig::Sgd {
            lr: 0.1,
            momentum: 0.5,
        }
        .build(&[&[2]]);
        let mut p: Array1<f32> = array![1.0, 1.0];
        let g: Array1<f32> = array![1.0, 0.0];

        opt.step(vec![p.view_mut().into_dyn()], vec![g.view().into_dyn()])?;
        assert!((p[0] - 0.9).abs() < 1e-6);
        opt.step(vec![p.view_mut().into_dyn()], vec![g.view().into_dyn()])?;
        // v = 0.5 * -0.1 - 0.1 = -0.15
        assert!((p[0] - 0.75).abs() < 1e-6);
        assert_eq!(p[1], 1.0);
        assert_eq!(opt.iteration(), 2);
        Ok(())
    }

    #[test]
    fn test_adam_first_step_moves_by_lr() -> Result<()> {
        let mut opt = OptimizerConfig::Adam {
            lr: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
        .build(&[&[3]]);
        let mut p: Array1<f32> = array![0.0, 0.0, 0.0];
        let g: Array1<f32> = array![2.0, -0.5, 0.0];

        opt.step(vec![p.view_mut().into_dyn()], vec![g.view().into_dyn()])?;
        assert!((p[0] + 0.01).abs() < 1e-5);
        assert!((p[1] - 0.01).abs() < 1e-5);
        assert_eq!(p[2], 0.0);
        Ok(())
    }

    #[test]
    fn test_shape_checks() {
        let mut opt = OptimizerConfig::default().build(&[&[2]]);
        let mut p: Array1<f32> = array![0.0, 0.0];
        let g: Array1<f32> = array![0.0, 0.0, 0.0];
        assert!(opt
            .step(vec![p.view_mut().into_dyn()], vec![g.view().into_dyn()])
            .is_err());

        let other = OptimizerConfig::default().build(&[&[5]]);
        assert!(opt.set_state(other.state().clone()).is_err());
    }
}
