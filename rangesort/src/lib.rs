//! Balanced range partitioning for a distributed total-order sort.
//!
//! A coordinator samples the input ([`core::sampler`]), picks shard
//! boundaries from the sorted sample ([`core::splitter`]) and ships them
//! as a boundary file ([`core::boundary`], [`core::distribute`]). Every
//! worker loads that file into a [`core::partitioner::RangePartitioner`]
//! and asks it which shard each record belongs to. Sorting every shard
//! locally then yields a globally sorted output.

use std::path::PathBuf;

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::{Config, DuplicatePolicy, SearchStrategy, ShortfallPolicy};
pub use crate::core::{
    boundary::BoundaryList,
    job::{JobSummary, SortJob},
    partitioner::{ConfigurablePartitioner, Partitioner, RangePartitioner},
};
pub use crate::error::{Error, Result};

use clap::Parser;

// This way we can allow user to have their own custom cli.
/// User can parse this directly from cli args or construct it themselves.
#[derive(Parser, Debug, Clone)]
#[clap(about = "Default arguments for a rangesort job")]
pub struct Args {
    /// TOML job config
    #[clap(long, takes_value = true, default_value = "rangesort.toml")]
    pub config: PathBuf,

    /// Directory of numbered input splits
    #[clap(long, takes_value = true)]
    pub input: PathBuf,

    #[clap(long, takes_value = true)]
    pub output: PathBuf,

    /// Overrides `number_of_shards` from the config
    #[clap(long, takes_value = true)]
    pub shards: Option<usize>,

    /// Where the boundary file and worker caches live
    #[clap(long, takes_value = true, default_value = "rangesort-work")]
    pub work_dir: PathBuf,
}

impl Args {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::from_file(&self.config)?;
        if let Some(shards) = self.shards {
            config.number_of_shards = shards;
            config.validate()?;
        }
        Ok(config)
    }
}
