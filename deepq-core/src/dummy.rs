//! This module is used for tests.
//!
//! [`DummyValueFunction`] scores a stacked input by the mean intensity of its
//! pixels: `q[a] = bias[a] + weight[a] * mean(input)`. It is small enough to
//! check by hand and still responds to gradient steps.
use crate::{error::DqnError, ValueFunction, FRAME_STACK};
use anyhow::{Context, Result};
use ndarray::{Array1, Array2, Array4, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`DummyValueFunction`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DummyValueFunctionConfig {
    n_outputs: usize,
    learning_rate: f32,
    seed: u64,
}

impl Default for DummyValueFunctionConfig {
    fn default() -> Self {
        Self {
            n_outputs: 4,
            learning_rate: 0.01,
            seed: 42,
        }
    }
}

impl DummyValueFunctionConfig {
    /// Sets the number of outputs.
    pub fn n_outputs(mut self, v: usize) -> Self {
        self.n_outputs = v;
        self
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the seed of parameter initialization.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
}

/// Parameters of [`DummyValueFunction`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DummyParams {
    /// Per-action slope on the mean intensity.
    pub weight: Vec<f32>,

    /// Per-action offset.
    pub bias: Vec<f32>,
}

/// Dummy value function.
#[derive(Debug, Clone)]
pub struct DummyValueFunction {
    params: DummyParams,
    learning_rate: f32,
    iteration: usize,
}

impl DummyValueFunction {
    fn mean_intensity(inputs: &Array4<f32>) -> Result<Array1<f32>> {
        if inputs.dim().1 != FRAME_STACK {
            return Err(DqnError::ShapeMismatch {
                expected: vec![FRAME_STACK],
                actual: vec![inputs.dim().1],
            }
            .into());
        }
        let n = inputs.dim().0;
        let means = inputs
            .outer_iter()
            .map(|x| x.mean().unwrap_or(0.0))
            .collect::<Vec<_>>();
        Ok(Array1::from_shape_vec(n, means)?)
    }
}

impl ValueFunction for DummyValueFunction {
    type Config = DummyValueFunctionConfig;
    type Params = DummyParams;

    fn build(config: Self::Config) -> Result<Self> {
        if config.n_outputs == 0 {
            return Err(DqnError::InvalidConfig("n_outputs must be positive".into()).into());
        }
        let mut rng = StdRng::seed_from_u64(config.seed);
        let weight = (0..config.n_outputs)
            .map(|_| rng.gen_range(-0.1..0.1))
            .collect();
        let bias = (0..config.n_outputs)
            .map(|_| rng.gen_range(-0.1..0.1))
            .collect();
        Ok(Self {
            params: DummyParams { weight, bias },
            learning_rate: config.learning_rate,
            iteration: 0,
        })
    }

    fn n_outputs(&self) -> usize {
        self.params.bias.len()
    }

    fn iteration(&self) -> usize {
        self.iteration
    }

    fn forward(&self, inputs: &Array4<f32>) -> Result<Array2<f32>> {
        let x = Self::mean_intensity(inputs)?;
        let n_outputs = self.n_outputs();
        Ok(Array2::from_shape_fn((x.len(), n_outputs), |(i, a)| {
            self.params.bias[a] + self.params.weight[a] * x[i]
        }))
    }

    fn apply_gradient_step(
        &mut self,
        inputs: &Array4<f32>,
        targets: &Array2<f32>,
        filter: &Array2<f32>,
    ) -> Result<f32> {
        let x = Self::mean_intensity(inputs)?;
        let pred = self.forward(inputs)?;
        if targets.dim() != pred.dim() || filter.dim() != pred.dim() {
            return Err(DqnError::ShapeMismatch {
                expected: pred.shape().to_vec(),
                actual: targets.shape().to_vec(),
            }
            .into());
        }

        let n = x.len().max(1) as f32;
        let diff = &pred * filter - targets;
        let loss = 0.5 * diff.mapv(|d| d * d).sum() / n;

        // d(loss)/d(q) is zero wherever the filter is zero.
        let grad = &diff * filter;
        let grad_bias = grad.sum_axis(Axis(0)) / n;
        let grad_weight = grad.t().dot(&x) / n;
        for (a, (gw, gb)) in grad_weight.iter().zip(grad_bias.iter()).enumerate() {
            self.params.weight[a] -= self.learning_rate * gw;
            self.params.bias[a] -= self.learning_rate * gb;
        }
        self.iteration += 1;

        Ok(loss)
    }

    fn params(&self) -> Self::Params {
        self.params.clone()
    }

    fn set_params(&mut self, params: &Self::Params) -> Result<()> {
        if params.weight.len() != self.n_outputs() || params.bias.len() != self.n_outputs() {
            return Err(DqnError::ShapeMismatch {
                expected: vec![self.n_outputs()],
                actual: vec![params.weight.len(), params.bias.len()],
            }
            .into());
        }
        self.params = params.clone();
        Ok(())
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self.params)?.as_bytes())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let params: DummyParams = serde_yaml::from_reader(BufReader::new(file))?;
        self.set_params(&params)
    }

    fn save_solver(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self.iteration)?.as_bytes())?;
        Ok(())
    }

    fn restore_solver(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        self.iteration = serde_yaml::from_reader(BufReader::new(file))?;
        Ok(())
    }
}
