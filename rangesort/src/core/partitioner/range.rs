use std::path::Path;

use crate::config::SearchStrategy;
use crate::core::boundary::BoundaryList;
use crate::error::Result;

use super::{
    prefix_index::{PrefixIndex, PrefixSpan},
    Partitioner,
};

/// Routes a key to the range of a [`BoundaryList`] that contains it.
///
/// `classify` returns `i` with `b[i - 1] <= key < b[i]`, treating `b[-1]`
/// as `-inf` and `b[len]` as `+inf`. A key equal to a boundary goes to the
/// range that starts at it. With repeated boundaries that is the range after
/// the last repeat.
///
/// Immutable once built, so one instance can serve many threads.
#[derive(Debug, Clone)]
pub struct RangePartitioner {
    boundaries: BoundaryList,
    index: PrefixIndex,
    search: SearchStrategy,
}

impl RangePartitioner {
    pub fn new(boundaries: BoundaryList, search: SearchStrategy) -> Self {
        let index = PrefixIndex::build(&boundaries);
        Self {
            boundaries,
            index,
            search,
        }
    }

    pub fn from_file(path: impl AsRef<Path>, search: SearchStrategy) -> Result<Self> {
        Ok(Self::new(BoundaryList::read_file(path)?, search))
    }

    pub fn boundaries(&self) -> &BoundaryList {
        &self.boundaries
    }

    pub fn prefix_index(&self) -> &PrefixIndex {
        &self.index
    }

    pub fn search(&self) -> SearchStrategy {
        self.search
    }

    pub fn shards(&self) -> usize {
        self.boundaries.shards()
    }

    pub fn classify(&self, key: &[u8]) -> usize {
        let Some(PrefixSpan { start, end }) = self.index.window(key) else {
            return 0;
        };
        let b = &self.boundaries;

        match self.search {
            SearchStrategy::Binary => {
                start + b[start..=end].partition_point(|x| x.as_slice() <= key)
            }
            SearchStrategy::Linear => {
                if key < b[start].as_slice() {
                    return start;
                }
                if key >= b[end].as_slice() {
                    return end + 1;
                }
                (start + 1..=end)
                    .find(|&i| key < b[i].as_slice())
                    .unwrap_or(end)
            }
        }
    }
}

impl Partitioner for RangePartitioner {
    type Key = [u8];

    fn partitions_num(&self) -> usize {
        self.shards()
    }

    fn partition_by(&self, key: &[u8]) -> usize {
        self.classify(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::Key;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const STRATEGIES: [SearchStrategy; 2] = [SearchStrategy::Linear, SearchStrategy::Binary];

    fn partitioner(ks: &[&str], search: SearchStrategy) -> RangePartitioner {
        let keys = ks.iter().map(|k| k.as_bytes().to_vec()).collect();
        RangePartitioner::new(BoundaryList::try_from_keys(keys).unwrap(), search)
    }

    #[test]
    fn four_shards_from_eight_samples() {
        for search in STRATEGIES {
            let p = partitioner(&["b", "d", "f"], search);
            assert_eq!(p.partitions_num(), 4);
            for (key, shard) in [("a", 0), ("b", 1), ("c", 1), ("d", 2), ("e", 2), ("h", 3)] {
                assert_eq!(p.classify(key.as_bytes()), shard, "{key} with {search:?}");
            }
        }
    }

    #[test]
    fn key_missing_from_prefix_index() {
        for search in STRATEGIES {
            let p = partitioner(&["banana", "dates", "figs"], search);
            assert_eq!(p.classify(b"apricot"), 0);
            assert_eq!(p.classify(b"cherry"), 1);
            assert_eq!(p.classify(b"elder"), 2);
            assert_eq!(p.classify(b"grape"), 3);
            assert_eq!(p.classify(b""), 0);
        }
    }

    #[test]
    fn shared_first_byte_needs_in_window_scan() {
        for search in STRATEGIES {
            let p = partitioner(&["aa", "ab", "ac"], search);
            assert_eq!(p.prefix_index().entries(), 1);
            assert_eq!(p.classify(b"a"), 0);
            assert_eq!(p.classify(b"aa"), 1);
            assert_eq!(p.classify(b"aab"), 1);
            assert_eq!(p.classify(b"ab"), 2);
            assert_eq!(p.classify(b"abz"), 2);
            assert_eq!(p.classify(b"ac"), 3);
            assert_eq!(p.classify(b"az"), 3);
            assert_eq!(p.classify(b"b"), 3);
            assert_eq!(p.classify(b"0"), 0);
        }
    }

    #[test]
    fn key_equal_to_boundary_goes_up() {
        for search in STRATEGIES {
            let p = partitioner(&["apple", "b", "banana", "kiwi", "kiwis", "zz"], search);
            for (i, boundary) in p.boundaries().iter().enumerate() {
                assert_eq!(p.classify(boundary), i + 1);
            }
        }
    }

    #[test]
    fn repeated_boundaries_skip_empty_ranges() {
        for search in STRATEGIES {
            let p = partitioner(&["a", "m", "m", "m", "t"], search);
            assert_eq!(p.classify(b"l"), 1);
            assert_eq!(p.classify(b"m"), 4);
            assert_eq!(p.classify(b"n"), 4);
            assert_eq!(p.classify(b"t"), 5);
        }
    }

    #[test]
    fn empty_boundaries_mean_one_shard() {
        for search in STRATEGIES {
            let p = RangePartitioner::new(BoundaryList::default(), search);
            assert_eq!(p.partitions_num(), 1);
            assert_eq!(p.classify(b"anything"), 0);
        }
    }

    #[test]
    fn empty_key_boundary() {
        for search in STRATEGIES {
            let p = partitioner(&["", "a"], search);
            assert_eq!(p.classify(b""), 1);
            assert_eq!(p.classify(b"0"), 1);
            assert_eq!(p.classify(b"a"), 2);
        }
    }

    fn random_key(rng: &mut StdRng) -> Key {
        let len = rng.gen_range(0..4);
        (0..len).map(|_| rng.gen_range(b'a'..=b'e')).collect()
    }

    #[test]
    fn matches_reference_on_random_input() {
        let mut rng = StdRng::seed_from_u64(0xb0b);
        for _ in 0..200 {
            let mut keys: Vec<Key> = (0..rng.gen_range(1..12)).map(|_| random_key(&mut rng)).collect();
            keys.sort();
            let boundaries = BoundaryList::try_from_keys(keys).unwrap();
            let linear = RangePartitioner::new(boundaries.clone(), SearchStrategy::Linear);
            let binary = RangePartitioner::new(boundaries.clone(), SearchStrategy::Binary);

            let mut queries: Vec<Key> = (0..30).map(|_| random_key(&mut rng)).collect();
            queries.extend(boundaries.iter().cloned());
            queries.sort();

            let mut last = 0;
            for query in &queries {
                let expected = boundaries.iter().filter(|b| b.as_slice() <= query.as_slice()).count();
                let shard = linear.classify(query);
                assert_eq!(shard, expected, "{query:?} in {boundaries:?}");
                assert_eq!(binary.classify(query), expected);
                assert!(shard < linear.partitions_num());
                assert!(shard >= last, "not monotonic at {query:?}");
                assert_eq!(linear.classify(query), shard);
                last = shard;
            }
        }
    }

    #[test]
    fn shared_across_threads() {
        let p = std::sync::Arc::new(partitioner(&["b", "d", "f"], SearchStrategy::Binary));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let p = p.clone();
                std::thread::spawn(move || {
                    (0..1000)
                        .map(|i| p.classify(&[b'a' + ((i + t) % 8) as u8]))
                        .sum::<usize>()
                })
            })
            .collect();
        let sums: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(sums.iter().all(|&s| s == sums[0]));
    }
}
