pub mod configurable;
pub mod prefix_index;
pub mod range;

pub use configurable::ConfigurablePartitioner;
pub use prefix_index::{PrefixIndex, PrefixSpan};
pub use range::RangePartitioner;

/// Query callback a hosting engine calls for every record it routes.
pub trait Partitioner: Send + Sync {
    type Key: ?Sized;
    fn partitions_num(&self) -> usize;
    fn partition_by(&self, key: &Self::Key) -> usize;
}

impl<P: Partitioner + ?Sized> Partitioner for &P {
    type Key = P::Key;

    fn partitions_num(&self) -> usize {
        (**self).partitions_num()
    }

    fn partition_by(&self, key: &Self::Key) -> usize {
        (**self).partition_by(key)
    }
}
