//! Configuration of the linear action-value model.
use crate::opt::OptimizerConfig;
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`LinearQ`](super::LinearQ).
pub struct LinearQConfig {
    pub(super) frame_shape: [usize; 2],
    pub(super) n_outputs: usize,
    pub(super) input_scale: f32,
    pub(super) seed: u64,
    pub(super) opt_config: OptimizerConfig,
}

impl Default for LinearQConfig {
    fn default() -> Self {
        Self {
            frame_shape: [84, 84],
            n_outputs: 18,
            input_scale: 1.0 / 255.0,
            seed: 42,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl LinearQConfig {
    /// Sets the height and width of a frame.
    pub fn frame_shape(mut self, height: usize, width: usize) -> Self {
        self.frame_shape = [height, width];
        self
    }

    /// Sets the number of outputs, one per action.
    pub fn n_outputs(mut self, v: usize) -> Self {
        self.n_outputs = v;
        self
    }

    /// Sets the factor applied to pixel intensities before the linear layer.
    pub fn input_scale(mut self, v: f32) -> Self {
        self.input_scale = v;
        self
    }

    /// Sets the seed of parameter initialization.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`LinearQConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of linear model from {:?}", path_);
        Ok(b)
    }

    /// Saves [`LinearQConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of linear model into {:?}", path_);
        Ok(())
    }
}
