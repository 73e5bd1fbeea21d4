use std::{path::Path, sync::OnceLock};

use log::info;

use crate::config::SearchStrategy;
use crate::core::boundary::BoundaryList;
use crate::error::{Error, Result};

use super::RangePartitioner;

/// A partitioner a hosting engine creates first and configures later.
///
/// Starts unconfigured. Boundaries can be loaded exactly once; after that
/// queries are answered by the inner [`RangePartitioner`].
#[derive(Debug, Default)]
pub struct ConfigurablePartitioner {
    search: SearchStrategy,
    ready: OnceLock<RangePartitioner>,
}

impl ConfigurablePartitioner {
    pub fn new(search: SearchStrategy) -> Self {
        Self {
            search,
            ready: OnceLock::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    pub fn configure(&self, boundaries: BoundaryList) -> Result<&RangePartitioner> {
        let mut fresh = false;
        let partitioner = self.ready.get_or_init(|| {
            fresh = true;
            RangePartitioner::new(boundaries, self.search)
        });
        if !fresh {
            return Err(Error::AlreadyConfigured);
        }
        info!(
            "partitioner ready with {} shards, {} indexed prefixes",
            partitioner.shards(),
            partitioner.prefix_index().entries()
        );
        Ok(partitioner)
    }

    pub fn configure_from_file(&self, path: impl AsRef<Path>) -> Result<&RangePartitioner> {
        if self.is_ready() {
            return Err(Error::AlreadyConfigured);
        }
        self.configure(BoundaryList::read_file(path)?)
    }

    pub fn ready(&self) -> Result<&RangePartitioner> {
        self.ready.get().ok_or(Error::NotReady)
    }

    pub fn classify(&self, key: &[u8]) -> Result<usize> {
        Ok(self.ready()?.classify(key))
    }

    pub fn shards(&self) -> Result<usize> {
        Ok(self.ready()?.shards())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundaries(ks: &[&str]) -> BoundaryList {
        BoundaryList::try_from_keys(ks.iter().map(|k| k.as_bytes().to_vec()).collect()).unwrap()
    }

    #[test]
    fn rejects_queries_before_configure() {
        let p = ConfigurablePartitioner::default();
        assert!(!p.is_ready());
        assert!(matches!(p.classify(b"a"), Err(Error::NotReady)));
        assert!(matches!(p.shards(), Err(Error::NotReady)));
    }

    #[test]
    fn answers_after_configure() {
        let p = ConfigurablePartitioner::new(SearchStrategy::Linear);
        p.configure(boundaries(&["b", "d", "f"])).unwrap();
        assert_eq!(p.classify(b"c").unwrap(), 1);
        assert_eq!(p.shards().unwrap(), 4);
    }

    #[test]
    fn configures_once() {
        let p = ConfigurablePartitioner::default();
        p.configure(boundaries(&["m"])).unwrap();
        assert!(matches!(
            p.configure(boundaries(&["a", "z"])),
            Err(Error::AlreadyConfigured)
        ));
        assert_eq!(p.shards().unwrap(), 2);
    }

    #[test]
    fn loads_boundary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitters.txt");
        std::fs::write(&path, "b\nd\nf\n").unwrap();

        let p = ConfigurablePartitioner::default();
        p.configure_from_file(&path).unwrap();
        assert_eq!(p.classify(b"h").unwrap(), 3);
        assert!(matches!(
            p.configure_from_file(&path),
            Err(Error::AlreadyConfigured)
        ));
    }

    #[test]
    fn malformed_file_leaves_it_unconfigured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitters.txt");
        std::fs::write(&path, "d\nb\n").unwrap();

        let p = ConfigurablePartitioner::default();
        assert!(matches!(
            p.configure_from_file(&path),
            Err(Error::MalformedBoundaryFile { line: 2, .. })
        ));
        assert!(!p.is_ready());
    }
}
