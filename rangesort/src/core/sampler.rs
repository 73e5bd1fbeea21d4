use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::config::Config;
use crate::core::{key::Key, source::InputSource};
use crate::error::Result;

const MAX_PREALLOCATED: usize = 1 << 16;

/// Draws a bounded random sample of keys from an [`InputSource`].
///
/// Every key is taken with probability `rate`. Until `amount` keys are held
/// they are appended; after that a taken key overwrites a random slot and
/// the rate shrinks by `(amount - 1) / amount`, so the sample keeps tracking
/// the key distribution of the whole input instead of its head.
///
/// Splits are visited in shuffled order. At least `max_splits` of them are
/// read, and reading continues past that while the sample is short.
/// The returned keys are in no particular order.
#[derive(Debug, Clone)]
pub struct Sampler {
    amount: usize,
    rate: f64,
    max_splits: usize,
    seed: Option<u64>,
}

impl Sampler {
    pub fn new(amount: usize, rate: f64, max_splits: usize) -> Self {
        Self {
            amount,
            rate,
            max_splits,
            seed: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            amount: config.sample_size(),
            rate: config.sampling_rate,
            max_splits: config.max_splits_sampled,
            seed: config.seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn sample<S: InputSource + ?Sized>(&self, source: &S) -> Result<Vec<Key>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut splits: Vec<usize> = (0..source.splits_num()).collect();
        splits.shuffle(&mut rng);

        let mut sample = Vec::with_capacity(self.amount.min(MAX_PREALLOCATED));
        if self.amount == 0 {
            return Ok(sample);
        }
        let mut rate = self.rate;
        let mut visited = 0;

        for (i, split) in splits.into_iter().enumerate() {
            if i >= self.max_splits && sample.len() >= self.amount {
                break;
            }
            visited += 1;
            for key in source.keys(split)? {
                let key = key?;
                if rng.gen::<f64>() > rate {
                    continue;
                }
                if sample.len() < self.amount {
                    sample.push(key);
                } else {
                    let slot = rng.gen_range(0..self.amount);
                    sample[slot] = key;
                    rate *= (self.amount - 1) as f64 / self.amount as f64;
                }
            }
        }

        debug!(
            "sampled {} keys (target {}) from {} splits",
            sample.len(),
            self.amount,
            visited
        );
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::MemorySource;

    fn numbered(splits: usize, per_split: usize) -> MemorySource {
        MemorySource::from_keys(
            (0..splits)
                .map(|s| {
                    (0..per_split)
                        .map(|i| format!("{:06}", s * per_split + i).into_bytes())
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn never_exceeds_amount() {
        let source = numbered(4, 1000);
        let sample = Sampler::new(50, 0.5, 10).with_seed(1).sample(&source).unwrap();
        assert_eq!(sample.len(), 50);
    }

    #[test]
    fn small_input_gives_everything_at_full_rate() {
        let source = numbered(2, 5);
        let mut sample = Sampler::new(100, 1.0, 10).with_seed(3).sample(&source).unwrap();
        sample.sort();
        let mut all: Vec<Key> = (0..10).map(|i| format!("{:06}", i).into_bytes()).collect();
        all.sort();
        assert_eq!(sample, all);
    }

    #[test]
    fn same_seed_same_sample() {
        let source = numbered(8, 200);
        let sampler = Sampler::new(40, 0.2, 3).with_seed(42);
        assert_eq!(sampler.sample(&source).unwrap(), sampler.sample(&source).unwrap());
    }

    #[test]
    fn reads_past_split_limit_while_short() {
        // one key per split, so a limit of 1 split can't fill the sample
        let source = numbered(6, 1);
        let sample = Sampler::new(6, 1.0, 1).with_seed(9).sample(&source).unwrap();
        assert_eq!(sample.len(), 6);
    }

    #[test]
    fn stops_at_split_limit_once_full() {
        let source = numbered(5, 10);
        let sample = Sampler::new(10, 1.0, 1).with_seed(5).sample(&source).unwrap();
        // the first shuffled split alone fills the sample
        let split = &sample[0][..5];
        assert!(sample.iter().all(|k| &k[..5] == split));
    }

    #[test]
    fn empty_source() {
        let source = MemorySource::default();
        assert!(Sampler::new(10, 0.1, 10).sample(&source).unwrap().is_empty());
    }
}
