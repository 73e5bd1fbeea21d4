use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Write},
    ops::Deref,
    path::Path,
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::key::Key;
use crate::error::{Error, Result};

/// Ordered keys splitting the keyspace into `len + 1` half-open ranges:
/// `(-inf, b0), [b0, b1), ..., [b_last, +inf)`.
///
/// Always non-decreasing. Repeats are allowed and make zero-width ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Key>", into = "Vec<Key>")]
pub struct BoundaryList {
    keys: Vec<Key>,
}

impl BoundaryList {
    /// Fails on the first descending pair.
    pub fn try_from_keys(keys: Vec<Key>) -> Result<Self> {
        if let Some(i) = keys.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::MalformedBoundaryFile {
                line: i + 2,
                reason: format!(
                    "{:?} sorts before previous boundary {:?}",
                    String::from_utf8_lossy(&keys[i + 1]),
                    String::from_utf8_lossy(&keys[i])
                ),
            });
        }
        Ok(Self { keys })
    }

    /// Number of ranges the boundaries define.
    pub fn shards(&self) -> usize {
        self.keys.len() + 1
    }

    /// How many boundaries equal their predecessor.
    pub fn repeats(&self) -> usize {
        self.keys.windows(2).filter(|w| w[0] == w[1]).count()
    }

    pub fn into_keys(self) -> Vec<Key> {
        self.keys
    }

    /// Keys holding `\n` can't be told apart from two lines in the file.
    fn check_writable(&self) -> Result<()> {
        match self.keys.iter().find(|key| key.contains(&b'\n')) {
            Some(key) => Err(Error::InvalidKey(String::from_utf8_lossy(key).into_owned())),
            None => Ok(()),
        }
    }

    /// One key per line, each terminated by `\n`. Keys are written verbatim.
    /// Nothing is written if any key holds a newline.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        self.check_writable()?;
        let mut writer = BufWriter::new(writer);
        for key in &self.keys {
            writer.write_all(key)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.check_writable()?;
        self.write_to(File::create(path)?)?;
        debug!("wrote {} boundaries to {}", self.keys.len(), path.display());
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let keys = BufReader::new(reader)
            .split(b'\n')
            .collect::<std::io::Result<Vec<_>>>()?;
        Self::try_from_keys(keys)
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let boundaries = Self::read_from(File::open(path)?)?;
        debug!(
            "loaded {} boundaries from {}",
            boundaries.keys.len(),
            path.display()
        );
        Ok(boundaries)
    }
}

impl Deref for BoundaryList {
    type Target = [Key];

    fn deref(&self) -> &[Key] {
        &self.keys
    }
}

impl TryFrom<Vec<Key>> for BoundaryList {
    type Error = Error;

    fn try_from(keys: Vec<Key>) -> Result<Self> {
        Self::try_from_keys(keys)
    }
}

impl From<BoundaryList> for Vec<Key> {
    fn from(boundaries: BoundaryList) -> Self {
        boundaries.keys
    }
}
