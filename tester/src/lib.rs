use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use rangesort::core::source::InputSource;

/// Writes `splits` numbered files of `records` random `key\tvalue` lines.
/// Returns every key written.
pub fn generate_input(dir: &Path, splits: usize, records: usize, seed: u64) -> io::Result<Vec<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    fs::create_dir_all(dir)?;
    let mut keys = Vec::with_capacity(splits * records);
    for split in 0..splits {
        let mut content = String::new();
        for _ in 0..records {
            let len = rng.gen_range(1..12);
            let key: String = (0..len).map(|_| rng.gen_range(b'!'..=b'~') as char).collect();
            content.push_str(&key);
            content.push('\t');
            content.push_str(&rng.gen::<u64>().to_string());
            content.push('\n');
            keys.push(key);
        }
        fs::write(dir.join(split.to_string()), content)?;
    }
    Ok(keys)
}

/// Lines of a file, without the trailing newline's empty segment.
fn lines(data: &[u8]) -> Vec<&[u8]> {
    match data.strip_suffix(b"\n") {
        Some(body) => body.split(|b| *b == b'\n').collect(),
        None if data.is_empty() => Vec::new(),
        None => data.split(|b| *b == b'\n').collect(),
    }
}

/// Keys of every record in every split of `source`.
pub fn read_input_keys<S: InputSource + ?Sized>(source: &S) -> rangesort::Result<Vec<Vec<u8>>> {
    let mut keys = Vec::new();
    for split in 0..source.splits_num() {
        for key in source.keys(split)? {
            keys.push(key?);
        }
    }
    Ok(keys)
}

/// Checks that the shard files concatenate to exactly the sorted input keys.
pub fn verify(output_files: &[PathBuf], mut input_keys: Vec<Vec<u8>>) -> Result<(), String> {
    let mut output = Vec::new();
    for file in output_files {
        let data = fs::read(file).map_err(|e| format!("{}: {e}", file.display()))?;
        output.extend(lines(&data).into_iter().map(<[u8]>::to_vec));
    }
    if let Some(i) = output.windows(2).position(|w| w[0] > w[1]) {
        return Err(format!(
            "output out of order at record {}: {:?} > {:?}",
            i + 1,
            String::from_utf8_lossy(&output[i]),
            String::from_utf8_lossy(&output[i + 1])
        ));
    }
    input_keys.sort();
    if output != input_keys {
        return Err(format!(
            "output holds {} keys, input holds {}",
            output.len(),
            input_keys.len()
        ));
    }
    Ok(())
}
