use std::iter::{repeat, Repeat, Take};

use crate::core::key::{Key, Record};
use crate::core::partitioner::Partitioner;

/// Map-side record callback.
pub trait Mapper: Send + Sync {
    type In;
    type Out;

    fn map(&self, v: Self::In) -> Self::Out;
}

/// Reduce-side callback, called once per distinct key in sorted order.
pub trait Reducer: Send + Sync {
    type Key;
    type Value;
    type OutIterable: IntoIterator;

    fn reduce(&self, key: Self::Key, values: Vec<Self::Value>) -> Self::OutIterable;
}

/// Emits the key and drops the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl Mapper for IdentityMapper {
    type In = Record;
    type Out = (Key, ());

    fn map(&self, v: Record) -> (Key, ()) {
        (v.key, ())
    }
}

/// Emits the key once per occurrence, so repeated input keys stay repeated.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReducer;

impl Reducer for IdentityReducer {
    type Key = Key;
    type Value = ();
    type OutIterable = Take<Repeat<Key>>;

    fn reduce(&self, key: Key, values: Vec<()>) -> Self::OutIterable {
        repeat(key).take(values.len())
    }
}

/// Runs a mapper and tags its output with the shard of the output key.
#[derive(Debug, Clone)]
pub struct MapUsingPartitioner<M, P> {
    mapper: M,
    partitioner: P,
}

impl<M, P> MapUsingPartitioner<M, P> {
    pub fn new(mapper: M, partitioner: P) -> Self {
        Self {
            mapper,
            partitioner,
        }
    }
}

impl<M, P, V> Mapper for MapUsingPartitioner<M, P>
where
    M: Mapper<Out = (Key, V)>,
    P: Partitioner<Key = [u8]>,
{
    type In = M::In;
    type Out = (usize, (Key, V));

    fn map(&self, v: Self::In) -> Self::Out {
        let (key, value) = self.mapper.map(v);
        (self.partitioner.partition_by(&key), (key, value))
    }
}

/// Groups shard-tagged records into one bucket per shard.
pub fn partition_data<V>(
    shards: usize,
    tagged: impl IntoIterator<Item = (usize, (Key, V))>,
) -> Vec<Vec<(Key, V)>> {
    let mut result: Vec<Vec<(Key, V)>> = (0..shards).map(|_| Vec::new()).collect();
    for (partition_idx, elem) in tagged {
        result[partition_idx].push(elem);
    }
    result
}

/// Feeds key-sorted records to a reducer, one call per run of equal keys.
pub fn reduce_sorted<R, V>(reducer: &R, sorted: Vec<(Key, V)>) -> Vec<<R::OutIterable as IntoIterator>::Item>
where
    R: Reducer<Key = Key, Value = V>,
{
    let mut out = Vec::new();
    let mut records = sorted.into_iter().peekable();
    while let Some((key, value)) = records.next() {
        let mut values = vec![value];
        while let Some((_, v)) = records.next_if(|(k, _)| *k == key) {
            values.push(v);
        }
        out.extend(reducer.reduce(key, values));
    }
    out
}
