use anyhow::{bail, Context, Result};
use launcher::shards::{TEST_SHARD, VALIDATION_SHARD};
use launcher::ShardLayout;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Row count of each shard when `total` rows are split `num_shards` ways.
/// The first `total % num_shards` shards take one extra row.
pub fn shard_sizes(total: usize, num_shards: usize) -> Vec<usize> {
    let base = total / num_shards;
    let remainder = total % num_shards;
    (0..num_shards)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Shuffles the rows of `input` and writes them as `num_shards` numbered
/// shards under `layout`. Returns the number of rows written.
pub fn split_file(
    input: &Path,
    layout: &ShardLayout,
    num_shards: usize,
    seed: Option<u64>,
) -> Result<usize> {
    if num_shards <= VALIDATION_SHARD {
        bail!(
            "need at least {} shards so training and validation shards exist, got {}",
            VALIDATION_SHARD + 1,
            num_shards
        );
    }

    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let mut rows = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<String>>>()?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    rows.shuffle(&mut rng);

    fs::create_dir_all(layout.language_dir())?;

    let mut start = 0;
    for (index, size) in shard_sizes(rows.len(), num_shards).into_iter().enumerate() {
        let shard_path = layout.shard_path(index);
        let mut writer = BufWriter::new(File::create(&shard_path)?);
        for row in &rows[start..start + size] {
            writeln!(writer, "{}", row)?;
        }
        writer.flush()?;
        info!("Wrote {} rows to {}", size, shard_path.display());
        start += size;
    }
    if num_shards > TEST_SHARD {
        info!("Held-out test shard: {}", layout.test_path().display());
    }

    Ok(rows.len())
}
