use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::error::{LaunchError, Result};
use crate::shards::ShardLayout;

/// Training set assembled from shards 0-7 for a single run.
///
/// The concatenated file is deleted when this value is dropped, so holding it
/// for the duration of the trainer process is enough to guarantee cleanup on
/// every exit path that unwinds.
pub struct AssembledDataset {
    train: NamedTempFile,
    validation: PathBuf,
    train_lines: usize,
}

impl AssembledDataset {
    pub fn train_path(&self) -> &Path {
        self.train.path()
    }

    /// Shard 8, referenced in place.
    pub fn validation_path(&self) -> &Path {
        &self.validation
    }

    pub fn train_lines(&self) -> usize {
        self.train_lines
    }
}

/// Concatenates the training shards of `layout` into a fresh temporary file.
///
/// Every shard is opened before anything is written, so a missing shard fails
/// without creating the temporary file. `scratch_dir` defaults to the
/// language directory next to the shards.
pub fn assemble(layout: &ShardLayout, scratch_dir: Option<&Path>) -> Result<AssembledDataset> {
    let mut shards = Vec::new();
    for (index, path) in layout.train_shard_paths() {
        let file = File::open(&path).map_err(|source| LaunchError::MissingShard {
            index,
            path: path.clone(),
            source,
        })?;
        shards.push((index, file));
    }

    let validation = layout.validation_path();
    if !validation.is_file() {
        warn!(
            "Validation shard {} not found; passing it to the trainer anyway",
            validation.display()
        );
    }

    let dir = scratch_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| layout.language_dir());
    let mut train = tempfile::Builder::new()
        .prefix(&format!("{}_train.", layout.language()))
        .suffix(".tsv")
        .tempfile_in(&dir)?;

    let mut train_lines = 0;
    {
        let mut writer = BufWriter::new(train.as_file_mut());
        for (index, file) in shards {
            let lines = append_lines(BufReader::new(file), &mut writer)?;
            debug!("Shard {} contributed {} lines", index, lines);
            train_lines += lines;
        }
        writer.flush()?;
    }

    info!(
        "Assembled {} training lines for {} into {}",
        train_lines,
        layout.language(),
        train.path().display()
    );

    Ok(AssembledDataset {
        train,
        validation,
        train_lines,
    })
}

/// Copies `reader` into `writer`, terminating a final unterminated line so
/// shards never run together. Returns the number of lines written.
fn append_lines<R: BufRead, W: Write>(mut reader: R, writer: &mut W) -> Result<usize> {
    let mut lines = 0;
    let mut last = None;
    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        lines += chunk.iter().filter(|&&b| b == b'\n').count();
        last = chunk.last().copied();
        writer.write_all(chunk)?;
        let len = chunk.len();
        reader.consume(len);
    }
    if matches!(last, Some(b) if b != b'\n') {
        writer.write_all(b"\n")?;
        lines += 1;
    }
    Ok(lines)
}
