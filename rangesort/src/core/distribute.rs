use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Ships a read-only file from the coordinator to every worker.
pub trait ArtifactDistributor: Send + Sync {
    /// Makes `path` available to all workers under its file name.
    fn publish(&self, path: &Path) -> Result<()>;

    /// Local path of a published artifact as seen by `worker_id`.
    fn fetch(&self, worker_id: usize, name: &str) -> Result<PathBuf>;
}

/// Copies artifacts into a cache directory per worker: `<root>/worker-<id>/<name>`.
#[derive(Debug, Clone)]
pub struct LocalCacheDistributor {
    root: PathBuf,
    workers: usize,
}

impl LocalCacheDistributor {
    pub fn new(root: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            root: root.into(),
            workers,
        }
    }

    fn worker_dir(&self, worker_id: usize) -> PathBuf {
        self.root.join(format!("worker-{worker_id}"))
    }
}

impl ArtifactDistributor for LocalCacheDistributor {
    fn publish(&self, path: &Path) -> Result<()> {
        let name = path.file_name().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no file name", path.display()),
            ))
        })?;
        for worker_id in 0..self.workers {
            let dir = self.worker_dir(worker_id);
            std::fs::create_dir_all(&dir)?;
            std::fs::copy(path, dir.join(name))?;
        }
        debug!(
            "published {} to {} worker caches",
            path.display(),
            self.workers
        );
        Ok(())
    }

    fn fetch(&self, worker_id: usize, name: &str) -> Result<PathBuf> {
        let path = self.worker_dir(worker_id).join(name);
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{name} was not published to worker #{worker_id}"),
            )));
        }
        Ok(path)
    }
}
