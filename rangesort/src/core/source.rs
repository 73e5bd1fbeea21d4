use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

use log::debug;

use crate::core::key::{parse_record, Key, Record};
use crate::error::{Error, Result};

pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Record>> + Send + 'a>;

/// Input made of independently readable splits.
pub trait InputSource: Send + Sync {
    fn splits_num(&self) -> usize;

    fn records(&self, split: usize) -> Result<RecordIter<'_>>;

    fn keys(&self, split: usize) -> Result<Box<dyn Iterator<Item = Result<Key>> + Send + '_>> {
        Ok(Box::new(self.records(split)?.map(|r| r.map(|r| r.key))))
    }
}

/// Splits held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    splits: Vec<Vec<Record>>,
}

impl MemorySource {
    pub fn new(splits: Vec<Vec<Record>>) -> Self {
        Self { splits }
    }

    /// One split per inner list, every record with an empty value.
    pub fn from_keys<K: Into<Key>>(splits: Vec<Vec<K>>) -> Self {
        Self::new(
            splits
                .into_iter()
                .map(|keys| keys.into_iter().map(|k| Record::new(k, Vec::new())).collect())
                .collect(),
        )
    }
}

impl InputSource for MemorySource {
    fn splits_num(&self) -> usize {
        self.splits.len()
    }

    fn records(&self, split: usize) -> Result<RecordIter<'_>> {
        Ok(Box::new(self.splits[split].iter().cloned().map(Ok)))
    }
}

/// Numbered split files `0`, `1`, ... in a directory, one record per line.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
    splits_num: usize,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>, splits_num: usize) -> Self {
        Self {
            dir: dir.into(),
            splits_num,
        }
    }

    /// Finds the split files `0..n` in `dir`. Names that aren't numbers
    /// are ignored. A missing number among them is an error.
    pub fn discover(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let mut numbers = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(n) = entry.file_name().to_str().and_then(split_number) {
                numbers.push(n);
            }
        }
        numbers.sort_unstable();

        if let Some(missing) = (0..numbers.len()).find(|&i| numbers[i] != i) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} has no split file {missing}, but has {}",
                    dir.display(),
                    numbers[numbers.len() - 1]
                ),
            )));
        }
        debug!("found {} splits in {}", numbers.len(), dir.display());
        Ok(Self {
            dir,
            splits_num: numbers.len(),
        })
    }

    pub fn split_path(&self, split: usize) -> PathBuf {
        self.dir.join(split.to_string())
    }
}

/// `"12"` is split 12. `"012"` and `"+1"` are not splits.
fn split_number(name: &str) -> Option<usize> {
    let n: usize = name.parse().ok()?;
    (n.to_string() == name).then_some(n)
}

impl InputSource for DirSource {
    fn splits_num(&self) -> usize {
        self.splits_num
    }

    fn records(&self, split: usize) -> Result<RecordIter<'_>> {
        let reader = BufReader::new(File::open(self.split_path(split))?);
        Ok(Box::new(reader.split(b'\n').map(|line| {
            let line = line?;
            Ok(parse_record(&line))
        })))
    }
}
