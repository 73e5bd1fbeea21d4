use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, info};
use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinHandle};

use crate::config::Config;
use crate::core::{
    boundary::BoundaryList,
    distribute::{ArtifactDistributor, LocalCacheDistributor},
    key::Key,
    partitioner::{ConfigurablePartitioner, RangePartitioner},
    router::{
        partition_data, reduce_sorted, IdentityMapper, IdentityReducer, MapUsingPartitioner,
        Mapper,
    },
    sampler::Sampler,
    source::InputSource,
    splitter::SplitterBuilder,
};
use crate::error::{Error, Result};

pub const SUMMARY_FILE_NAME: &str = "_summary.json";

type Bucket = Vec<(Key, ())>;

/// Output of the coordinator's setup phase.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub boundaries: BoundaryList,
    pub sampled_keys: usize,
    pub boundary_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub shards: usize,
    pub boundaries: usize,
    pub sampled_keys: usize,
    pub records_per_shard: Vec<usize>,
    pub output_files: Vec<PathBuf>,
}

impl JobSummary {
    pub fn records(&self) -> usize {
        self.records_per_shard.iter().sum()
    }
}

/// Writes one shard's keys to `<path>/part-NNNNN`, one per line.
#[derive(Debug, Clone)]
pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn shard_path(&self, shard: usize) -> PathBuf {
        self.path.join(format!("part-{shard:05}"))
    }

    pub fn write(&self, shard: usize, keys: &[Key]) -> Result<PathBuf> {
        let path = self.shard_path(shard);
        let mut out = BufWriter::new(std::fs::File::create(&path)?);
        for key in keys {
            out.write_all(key)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(path)
    }
}

/// Sorts an input in process: sample, split, route, sort each shard.
///
/// Map tasks and reduce tasks run on blocking threads, at most one per CPU
/// at a time. Each simulated worker loads the boundary file from its own
/// cache and builds its own partitioner.
pub struct SortJob<D = LocalCacheDistributor> {
    config: Config,
    work_dir: PathBuf,
    distributor: Arc<D>,
    workers: usize,
}

impl SortJob<LocalCacheDistributor> {
    pub fn local(config: Config, work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let workers = num_cpus::get();
        let distributor = LocalCacheDistributor::new(work_dir.join("cache"), workers);
        Self::new(config, work_dir, distributor, workers)
    }
}

impl<D: ArtifactDistributor + 'static> SortJob<D> {
    pub fn new(config: Config, work_dir: impl Into<PathBuf>, distributor: D, workers: usize) -> Self {
        Self {
            config,
            work_dir: work_dir.into(),
            distributor: Arc::new(distributor),
            workers: workers.max(1),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Samples the input, builds boundaries, writes and publishes the
    /// boundary file. Runs once, on the coordinator.
    pub fn prepare<S: InputSource + ?Sized>(&self, source: &S) -> Result<Prepared> {
        self.config.validate()?;
        let sample = Sampler::from_config(&self.config).sample(source)?;
        let sampled_keys = sample.len();
        let boundaries = SplitterBuilder::from_config(&self.config).build(sample)?;

        std::fs::create_dir_all(&self.work_dir)?;
        let boundary_file = self.work_dir.join(&self.config.boundary_file_name);
        boundaries.write_file(&boundary_file)?;
        self.distributor.publish(&boundary_file)?;

        Ok(Prepared {
            boundaries,
            sampled_keys,
            boundary_file,
        })
    }

    /// Loads the published boundary file once per worker.
    fn configure_workers(&self) -> Result<Vec<Arc<ConfigurablePartitioner>>> {
        (0..self.workers)
            .map(|worker_id| {
                let partitioner = ConfigurablePartitioner::new(self.config.search);
                let path = self
                    .distributor
                    .fetch(worker_id, &self.config.boundary_file_name)?;
                partitioner.configure_from_file(path)?;
                Ok(Arc::new(partitioner))
            })
            .collect()
    }

    pub async fn run<S: InputSource + 'static>(
        &self,
        source: Arc<S>,
        output_dir: impl AsRef<Path>,
    ) -> Result<JobSummary> {
        let output_dir = output_dir.as_ref();
        let prepared = self.prepare(&*source)?;
        let shards = prepared.boundaries.shards();
        info!(
            "sorting {} splits into {} shards with {} workers",
            source.splits_num(),
            shards,
            self.workers
        );

        let partitioners = self.configure_workers()?;
        let semaphore = Arc::new(Semaphore::new(num_cpus::get()));

        let mut map_handles: Vec<JoinHandle<Result<Vec<Bucket>>>> = Vec::new();
        for split in 0..source.splits_num() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Task(e.to_string()))?;
            let source = source.clone();
            let partitioner = partitioners[split % self.workers].clone();
            map_handles.push(tokio::task::spawn_blocking(move || {
                let buckets = map_task(&*source, split, partitioner.ready()?);
                drop(permit);
                buckets
            }));
        }

        let mut shuffled: Vec<Bucket> = (0..shards).map(|_| Vec::new()).collect();
        for handle in map_handles {
            let buckets = handle.await.map_err(|e| Error::Task(e.to_string()))??;
            for (shard, bucket) in buckets.into_iter().enumerate() {
                shuffled[shard].extend(bucket);
            }
        }

        tokio::fs::create_dir_all(output_dir).await?;
        let writer = Arc::new(FileWriter::new(output_dir));
        let mut reduce_handles: Vec<JoinHandle<Result<(usize, PathBuf)>>> = Vec::new();
        for (shard, data) in shuffled.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Task(e.to_string()))?;
            let writer = writer.clone();
            reduce_handles.push(tokio::task::spawn_blocking(move || {
                let written = reduce_task(data, shard, &writer);
                drop(permit);
                written
            }));
        }

        let mut records_per_shard = Vec::with_capacity(shards);
        let mut output_files = Vec::with_capacity(shards);
        for handle in reduce_handles {
            let (records, path) = handle.await.map_err(|e| Error::Task(e.to_string()))??;
            records_per_shard.push(records);
            output_files.push(path);
        }

        let summary = JobSummary {
            shards,
            boundaries: prepared.boundaries.len(),
            sampled_keys: prepared.sampled_keys,
            records_per_shard,
            output_files,
        };
        tokio::fs::write(
            output_dir.join(SUMMARY_FILE_NAME),
            serde_json::to_vec_pretty(&summary)?,
        )
        .await?;
        info!(
            "sorted {} records, per shard: {:?}",
            summary.records(),
            summary.records_per_shard
        );
        Ok(summary)
    }
}

fn map_task<S: InputSource + ?Sized>(
    source: &S,
    split: usize,
    partitioner: &RangePartitioner,
) -> Result<Vec<Bucket>> {
    let mapper = MapUsingPartitioner::new(IdentityMapper, partitioner);
    let records = source.records(split)?.collect::<Result<Vec<_>>>()?;
    let buckets = partition_data(
        partitioner.shards(),
        records.into_iter().map(|r| mapper.map(r)),
    );
    debug!(
        "split #{split} routed into {:?}",
        buckets.iter().map(Vec::len).collect::<Vec<_>>()
    );
    Ok(buckets)
}

fn reduce_task(mut data: Bucket, shard: usize, writer: &FileWriter) -> Result<(usize, PathBuf)> {
    data.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    let keys = reduce_sorted(&IdentityReducer, data);
    let path = writer.write(shard, &keys)?;
    debug!("shard #{shard} wrote {} keys", keys.len());
    Ok((keys.len(), path))
}
