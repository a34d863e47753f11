//! Frozen copy of the value function used for bootstrap targets.
use crate::ValueFunction;
use anyhow::Result;
use log::info;
use ndarray::{Array2, Array4};

/// An independently owned copy of a value function.
///
/// The snapshot changes only through [`TargetSnapshot::synchronize`]; gradient
/// steps on the live value function are not visible here until the next call.
pub struct TargetSnapshot<Q: ValueFunction> {
    q: Q,
    n_syncs: usize,
}

impl<Q: ValueFunction> TargetSnapshot<Q> {
    /// Builds a value function from `config` and copies the parameters of `live` into it.
    pub fn build(config: Q::Config, live: &Q) -> Result<Self> {
        let mut q = Q::build(config)?;
        q.set_params(&live.params())?;
        Ok(Self { q, n_syncs: 0 })
    }

    /// Overwrites every parameter with those of `live`.
    pub fn synchronize(&mut self, live: &Q) -> Result<()> {
        self.q.set_params(&live.params())?;
        self.n_syncs += 1;
        info!("Synchronized target snapshot ({} times)", self.n_syncs);
        Ok(())
    }

    /// Evaluates action values with the snapshot parameters.
    pub fn forward(&self, inputs: &Array4<f32>) -> Result<Array2<f32>> {
        self.q.forward(inputs)
    }

    /// Returns the snapshot as a read-only value function.
    pub fn value_function(&self) -> &Q {
        &self.q
    }

    /// Returns a copy of the snapshot parameters.
    pub fn params(&self) -> Q::Params {
        self.q.params()
    }

    /// Returns the number of synchronizations since construction.
    pub fn n_syncs(&self) -> usize {
        self.n_syncs
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dummy::{DummyValueFunction, DummyValueFunctionConfig};
    use ndarray::Array;

    #[test]
    fn test_snapshot_is_independent_of_live() -> Result<()> {
        let config = DummyValueFunctionConfig::default().n_outputs(3).seed(1);
        let mut live = DummyValueFunction::build(config.clone())?;
        let mut target = TargetSnapshot::build(config, &live)?;
        assert_eq!(target.params(), live.params());

        let inputs = Array4::from_elem((1, crate::FRAME_STACK, 1, 1), 1.0);
        let targets = Array::from_shape_vec((1, 3), vec![0.0, 5.0, 0.0])?;
        let filter = Array::from_shape_vec((1, 3), vec![0.0, 1.0, 0.0])?;
        live.apply_gradient_step(&inputs, &targets, &filter)?;
        assert_ne!(target.params(), live.params());

        let frozen = target.params();
        live.apply_gradient_step(&inputs, &targets, &filter)?;
        assert_eq!(target.params(), frozen);

        target.synchronize(&live)?;
        assert_eq!(target.params(), live.params());
        assert_eq!(target.n_syncs(), 1);
        Ok(())
    }
}
