use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the partitioner searches inside the window picked by the prefix index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Linear,
    #[default]
    Binary,
}

/// What to do with repeated keys picked as boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep them. The shards between equal boundaries stay empty.
    #[default]
    Preserve,
    /// Drop repeats, leaving fewer shards than asked for.
    Collapse,
}

/// What to do when the sample is too small for the requested shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    #[default]
    Fail,
    ReduceShards,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub number_of_shards: usize,
    #[serde(default = "default_samples_per_shard")]
    pub samples_per_shard: usize,
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    #[serde(default = "default_max_splits_sampled")]
    pub max_splits_sampled: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub search: SearchStrategy,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub shortfall: ShortfallPolicy,
    #[serde(default = "default_boundary_file_name")]
    pub boundary_file_name: String,
}

fn default_samples_per_shard() -> usize {
    10
}

fn default_sampling_rate() -> f64 {
    0.1
}

fn default_max_splits_sampled() -> usize {
    10
}

fn default_boundary_file_name() -> String {
    "splitters.txt".to_string()
}

impl Config {
    pub fn new(number_of_shards: usize) -> Self {
        Self {
            number_of_shards,
            samples_per_shard: default_samples_per_shard(),
            sampling_rate: default_sampling_rate(),
            max_splits_sampled: default_max_splits_sampled(),
            seed: None,
            search: SearchStrategy::default(),
            duplicates: DuplicatePolicy::default(),
            shortfall: ShortfallPolicy::default(),
            boundary_file_name: default_boundary_file_name(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Number of keys the sampler tries to collect. Saturates for configs
    /// `validate` rejects.
    pub fn sample_size(&self) -> usize {
        self.number_of_shards.saturating_mul(self.samples_per_shard)
    }

    pub fn validate(&self) -> Result<()> {
        if self.number_of_shards == 0 {
            return Err(Error::InvalidConfig(
                "number_of_shards must be at least 1".into(),
            ));
        }
        if self.samples_per_shard == 0 {
            return Err(Error::InvalidConfig(
                "samples_per_shard must be at least 1".into(),
            ));
        }
        if self
            .number_of_shards
            .checked_mul(self.samples_per_shard)
            .is_none()
        {
            return Err(Error::InvalidConfig(format!(
                "number_of_shards * samples_per_shard overflows: {} * {}",
                self.number_of_shards, self.samples_per_shard
            )));
        }
        if !(self.sampling_rate > 0.0 && self.sampling_rate <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "sampling_rate must be in (0, 1], got {}",
                self.sampling_rate
            )));
        }
        if self.max_splits_sampled == 0 {
            return Err(Error::InvalidConfig(
                "max_splits_sampled must be at least 1".into(),
            ));
        }
        if self.boundary_file_name.is_empty() || self.boundary_file_name.contains('/') {
            return Err(Error::InvalidConfig(format!(
                "boundary_file_name must be a plain file name, got {:?}",
                self.boundary_file_name
            )));
        }
        Ok(())
    }
}
