//! Linear action-value model.
use super::LinearQConfig;
use crate::opt::{Optimizer, OptimizerState};
use anyhow::{Context, Result};
use deepq_core::{DqnError, ValueFunction, FRAME_STACK};
use log::info;
use ndarray::{Array1, Array2, Array4, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Parameters of [`LinearQ`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LinearParams {
    /// Weight of shape `(FRAME_STACK * height * width, n_outputs)`.
    pub weight: Array2<f32>,

    /// Bias of shape `(n_outputs,)`.
    pub bias: Array1<f32>,
}

/// Action-value model linear in the scaled pixels of the stacked frames.
///
/// `q = flatten(input * input_scale) . weight + bias`.
#[derive(Debug, Clone)]
pub struct LinearQ {
    frame_shape: [usize; 2],
    input_scale: f32,
    params: LinearParams,
    opt: Optimizer,
}

impl LinearQ {
    fn n_features(&self) -> usize {
        FRAME_STACK * self.frame_shape[0] * self.frame_shape[1]
    }

    /// Flattens and scales a batch of stacked inputs to `(batch, n_features)`.
    fn features(&self, inputs: &Array4<f32>) -> Result<Array2<f32>> {
        let (b, k, h, w) = inputs.dim();
        if (k, h, w) != (FRAME_STACK, self.frame_shape[0], self.frame_shape[1]) {
            return Err(DqnError::ShapeMismatch {
                expected: vec![b, FRAME_STACK, self.frame_shape[0], self.frame_shape[1]],
                actual: inputs.shape().to_vec(),
            }
            .into());
        }
        let x = inputs.iter().map(|v| v * self.input_scale).collect();
        Ok(Array2::from_shape_vec((b, self.n_features()), x)?)
    }

    fn check_params(&self, params: &LinearParams) -> Result<()> {
        if params.weight.dim() != self.params.weight.dim() || params.bias.dim() != self.params.bias.dim() {
            return Err(DqnError::ShapeMismatch {
                expected: self.params.weight.shape().to_vec(),
                actual: params.weight.shape().to_vec(),
            }
            .into());
        }
        Ok(())
    }
}

impl ValueFunction for LinearQ {
    type Config = LinearQConfig;
    type Params = LinearParams;

    fn build(config: Self::Config) -> Result<Self> {
        let [h, w] = config.frame_shape;
        if h == 0 || w == 0 {
            return Err(DqnError::InvalidConfig(format!(
                "frame shape must be non-empty, got {:?}",
                config.frame_shape
            ))
            .into());
        }
        if config.n_outputs == 0 {
            return Err(DqnError::InvalidConfig("n_outputs must be positive".into()).into());
        }

        let n_in = FRAME_STACK * h * w;
        let bound = 1.0 / (n_in as f32).sqrt();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let weight = Array2::from_shape_fn((n_in, config.n_outputs), |_| rng.gen_range(-bound..bound));
        let bias = Array1::from_shape_fn(config.n_outputs, |_| rng.gen_range(-bound..bound));
        let opt = config
            .opt_config
            .build(&[weight.shape(), bias.shape()]);

        Ok(Self {
            frame_shape: config.frame_shape,
            input_scale: config.input_scale,
            params: LinearParams { weight, bias },
            opt,
        })
    }

    fn n_outputs(&self) -> usize {
        self.params.bias.len()
    }

    fn iteration(&self) -> usize {
        self.opt.iteration()
    }

    fn forward(&self, inputs: &Array4<f32>) -> Result<Array2<f32>> {
        let x = self.features(inputs)?;
        Ok(x.dot(&self.params.weight) + &self.params.bias)
    }

    fn apply_gradient_step(
        &mut self,
        inputs: &Array4<f32>,
        targets: &Array2<f32>,
        filter: &Array2<f32>,
    ) -> Result<f32> {
        let x = self.features(inputs)?;
        let pred = x.dot(&self.params.weight) + &self.params.bias;
        for t in [targets, filter] {
            if t.dim() != pred.dim() {
                return Err(DqnError::ShapeMismatch {
                    expected: pred.shape().to_vec(),
                    actual: t.shape().to_vec(),
                }
                .into());
            }
        }

        let n = x.nrows().max(1) as f32;
        let diff = &pred * filter - targets;
        let loss = 0.5 * diff.mapv(|d| d * d).sum() / n;

        // Columns of actions not taken get zero gradient through the filter.
        let grad = &diff * filter;
        let grad_weight = x.t().dot(&grad) / n;
        let grad_bias = grad.sum_axis(Axis(0)) / n;
        self.opt.step(
            vec![
                self.params.weight.view_mut().into_dyn(),
                self.params.bias.view_mut().into_dyn(),
            ],
            vec![grad_weight.view().into_dyn(), grad_bias.view().into_dyn()],
        )?;

        Ok(loss)
    }

    fn params(&self) -> Self::Params {
        self.params.clone()
    }

    fn set_params(&mut self, params: &Self::Params) -> Result<()> {
        self.check_params(params)?;
        self.params = params.clone();
        Ok(())
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), &self.params)?;
        info!("Save linear model parameters to {:?}", path);
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let params: LinearParams = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("Failed to decode parameters in {:?}", path))?;
        self.set_params(&params)?;
        info!("Load linear model parameters from {:?}", path);
        Ok(())
    }

    fn save_solver(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self.opt.state())?;
        info!("Save optimizer state to {:?}", path);
        Ok(())
    }

    fn restore_solver(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let state: OptimizerState = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("Failed to decode optimizer state in {:?}", path))?;
        self.opt.set_state(state)?;
        info!("Restore optimizer state from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opt::OptimizerConfig;
    use ndarray::s;

    fn model(opt_config: OptimizerConfig) -> Result<LinearQ> {
        LinearQ::build(
            LinearQConfig::default()
                .frame_shape(2, 3)
                .n_outputs(4)
                .opt_config(opt_config),
        )
    }

    fn inputs(b: usize) -> Array4<f32> {
        Array4::from_shape_fn((b, FRAME_STACK, 2, 3), |(i, k, y, x)| {
            ((i * 31 + k * 7 + y * 3 + x) % 256) as f32
        })
    }

    #[test]
    fn test_forward_shape() -> Result<()> {
        let q = model(OptimizerConfig::default())?;
        assert_eq!(q.forward(&inputs(5))?.dim(), (5, 4));
        assert_eq!(q.forward(&Array4::zeros((0, FRAME_STACK, 2, 3)))?.dim(), (0, 4));

        let err = q.forward(&Array4::zeros((1, FRAME_STACK, 3, 2))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DqnError>(),
            Some(DqnError::ShapeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unselected_actions_get_no_update() -> Result<()> {
        for opt_config in [
            OptimizerConfig::Sgd {
                lr: 0.1,
                momentum: 0.0,
            },
            OptimizerConfig::default(),
        ] {
            let mut q = model(opt_config)?;
            let before = q.params();

            // Only action 1 is taken in every row.
            let mut filter = Array2::zeros((3, 4));
            filter.column_mut(1).fill(1.0);
            let mut targets = Array2::zeros((3, 4));
            targets.column_mut(1).fill(5.0);
            let loss = q.apply_gradient_step(&inputs(3), &targets, &filter)?;
            assert!(loss > 0.0);
            assert_eq!(q.iteration(), 1);

            let after = q.params();
            for a in [0, 2, 3] {
                assert_eq!(after.weight.slice(s![.., a]), before.weight.slice(s![.., a]));
                assert_eq!(after.bias[a], before.bias[a]);
            }
            assert_ne!(after.weight.slice(s![.., 1]), before.weight.slice(s![.., 1]));
        }
        Ok(())
    }

    #[test]
    fn test_gradient_step_reduces_loss() -> Result<()> {
        let mut q = model(OptimizerConfig::Sgd {
            lr: 0.05,
            momentum: 0.0,
        })?;
        let x = inputs(4);
        let filter = Array2::ones((4, 4));
        let targets = Array2::from_elem((4, 4), 1.0);

        let first = q.apply_gradient_step(&x, &targets, &filter)?;
        let mut last = first;
        for _ in 0..20 {
            last = q.apply_gradient_step(&x, &targets, &filter)?;
        }
        assert!(last < first);
        Ok(())
    }

    #[test]
    fn test_set_params_rejects_other_shapes() -> Result<()> {
        let mut q = model(OptimizerConfig::default())?;
        let other = LinearQ::build(LinearQConfig::default().frame_shape(2, 3).n_outputs(5))?;
        assert!(q.set_params(&other.params()).is_err());
        Ok(())
    }

    #[test]
    fn test_build_rejects_empty_shapes() {
        assert!(LinearQ::build(LinearQConfig::default().frame_shape(0, 3)).is_err());
        assert!(LinearQ::build(LinearQConfig::default().n_outputs(0)).is_err());
    }
}
