use log::{info, warn};

use crate::config::{Config, DuplicatePolicy, ShortfallPolicy};
use crate::core::{boundary::BoundaryList, key::Key};
use crate::error::{Error, Result};

/// Turns a sample into shard boundaries.
///
/// The sample is sorted here, then the key at every `samples_per_shard`-th
/// rank becomes a boundary: `b[i] = sorted[(i + 1) * samples_per_shard - 1]`.
#[derive(Debug, Clone)]
pub struct SplitterBuilder {
    shards: usize,
    samples_per_shard: usize,
    duplicates: DuplicatePolicy,
    shortfall: ShortfallPolicy,
}

impl SplitterBuilder {
    pub fn new(shards: usize, samples_per_shard: usize) -> Self {
        Self {
            shards,
            samples_per_shard,
            duplicates: DuplicatePolicy::default(),
            shortfall: ShortfallPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            shards: config.number_of_shards,
            samples_per_shard: config.samples_per_shard,
            duplicates: config.duplicates,
            shortfall: config.shortfall,
        }
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn shortfall(mut self, policy: ShortfallPolicy) -> Self {
        self.shortfall = policy;
        self
    }

    pub fn build(&self, mut sample: Vec<Key>) -> Result<BoundaryList> {
        if self.shards == 0 || self.samples_per_shard == 0 {
            return Err(Error::InvalidConfig(
                "shards and samples_per_shard must be at least 1".into(),
            ));
        }
        let need = self
            .shards
            .checked_mul(self.samples_per_shard)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "{} shards of {} samples overflow",
                    self.shards, self.samples_per_shard
                ))
            })?;
        sample.sort_unstable();

        let shards = if sample.len() >= need {
            self.shards
        } else {
            match self.shortfall {
                ShortfallPolicy::Fail => {
                    return Err(Error::InsufficientSample {
                        have: sample.len(),
                        need,
                        shards: self.shards,
                        samples_per_shard: self.samples_per_shard,
                    })
                }
                ShortfallPolicy::ReduceShards => {
                    let shards = (sample.len() / self.samples_per_shard).max(1);
                    warn!(
                        "sample of {} keys is short of {}, reducing shards from {} to {}",
                        sample.len(),
                        need,
                        self.shards,
                        shards
                    );
                    shards
                }
            }
        };

        let mut dividers: Vec<Key> = (1..shards)
            .map(|i| std::mem::take(&mut sample[i * self.samples_per_shard - 1]))
            .collect();

        let repeats = dividers.windows(2).filter(|w| w[0] == w[1]).count();
        if repeats > 0 {
            match self.duplicates {
                DuplicatePolicy::Preserve => warn!(
                    "{repeats} repeated boundaries, the shards between them will be empty"
                ),
                DuplicatePolicy::Collapse => {
                    dividers.dedup();
                    warn!(
                        "collapsed {repeats} repeated boundaries, {} shards remain",
                        dividers.len() + 1
                    );
                }
            }
        }

        info!(
            "built {} boundaries for {} shards from {} sampled keys",
            dividers.len(),
            dividers.len() + 1,
            sample.len()
        );
        BoundaryList::try_from_keys(dividers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(ks: &[&str]) -> Vec<Key> {
        ks.iter().map(|k| k.as_bytes().to_vec()).collect()
    }

    #[test]
    fn picks_every_kth_rank() {
        let sample = keys(&["h", "c", "a", "f", "b", "e", "g", "d"]);
        let boundaries = SplitterBuilder::new(4, 2).build(sample).unwrap();
        assert_eq!(&*boundaries, keys(&["b", "d", "f"]).as_slice());
    }

    #[test]
    fn deterministic_for_same_sample() {
        let sample: Vec<Key> = (0..100u32).rev().map(|i| i.to_be_bytes().to_vec()).collect();
        let builder = SplitterBuilder::new(10, 10);
        assert_eq!(
            builder.build(sample.clone()).unwrap(),
            builder.build(sample).unwrap()
        );
    }

    #[test]
    fn extra_samples_are_ignored() {
        let sample = keys(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let boundaries = SplitterBuilder::new(2, 3).build(sample).unwrap();
        assert_eq!(&*boundaries, keys(&["c"]).as_slice());
    }

    #[test]
    fn single_shard_has_no_boundaries() {
        let boundaries = SplitterBuilder::new(1, 3).build(keys(&["x", "y", "z"])).unwrap();
        assert!(boundaries.is_empty());
    }

    #[test]
    fn short_sample_fails_by_default() {
        let err = SplitterBuilder::new(4, 2)
            .build(keys(&["a", "b", "c"]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientSample {
                have: 3,
                need: 8,
                ..
            }
        ));
    }

    #[test]
    fn short_sample_can_reduce_shards() {
        let boundaries = SplitterBuilder::new(4, 2)
            .shortfall(ShortfallPolicy::ReduceShards)
            .build(keys(&["e", "a", "c", "b", "d"]))
            .unwrap();
        assert_eq!(&*boundaries, keys(&["b"]).as_slice());

        let boundaries = SplitterBuilder::new(4, 2)
            .shortfall(ShortfallPolicy::ReduceShards)
            .build(Vec::new())
            .unwrap();
        assert_eq!(boundaries.shards(), 1);
    }

    #[test]
    fn overflowing_sample_size_is_invalid_config() {
        for shortfall in [ShortfallPolicy::Fail, ShortfallPolicy::ReduceShards] {
            let result = SplitterBuilder::new(usize::MAX / 2 + 1, 2)
                .shortfall(shortfall)
                .build(Vec::new());
            assert!(matches!(result, Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn repeated_boundaries_kept_or_collapsed() {
        let sample = keys(&["a", "a", "a", "a", "a", "a", "b", "b"]);
        let kept = SplitterBuilder::new(4, 2).build(sample.clone()).unwrap();
        assert_eq!(&*kept, keys(&["a", "a", "a"]).as_slice());
        assert_eq!(kept.shards(), 4);

        let collapsed = SplitterBuilder::new(4, 2)
            .duplicates(DuplicatePolicy::Collapse)
            .build(sample)
            .unwrap();
        assert_eq!(&*collapsed, keys(&["a"]).as_slice());
        assert_eq!(collapsed.shards(), 2);
    }
}
