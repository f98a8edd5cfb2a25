use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::{LaunchError, Result};

/// Shard indices concatenated into the training set, in this order.
pub const TRAIN_SHARDS: RangeInclusive<usize> = 0..=7;
/// Shard passed to the trainer as the validation set.
pub const VALIDATION_SHARD: usize = 8;
/// Held-out shard. Written by `data_prep split`, never read by the launcher.
pub const TEST_SHARD: usize = 9;

/// Where the numbered shards of one language live:
/// `<data_root>/<language>/<language>_<index>.tsv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLayout {
    data_root: PathBuf,
    language: String,
}

impl ShardLayout {
    pub fn new(data_root: impl Into<PathBuf>, language: impl Into<String>) -> Result<Self> {
        let language = language.into();
        if !is_valid_language(&language) {
            return Err(LaunchError::InvalidLanguage(language));
        }
        Ok(Self {
            data_root: data_root.into(),
            language,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn language_dir(&self) -> PathBuf {
        self.data_root.join(&self.language)
    }

    pub fn shard_path(&self, index: usize) -> PathBuf {
        self.language_dir()
            .join(format!("{}_{}.tsv", self.language, index))
    }

    pub fn train_shard_paths(&self) -> Vec<(usize, PathBuf)> {
        TRAIN_SHARDS.map(|i| (i, self.shard_path(i))).collect()
    }

    pub fn validation_path(&self) -> PathBuf {
        self.shard_path(VALIDATION_SHARD)
    }

    pub fn test_path(&self) -> PathBuf {
        self.shard_path(TEST_SHARD)
    }
}

// The identifier becomes both a directory and a file-name prefix.
fn is_valid_language(language: &str) -> bool {
    !language.is_empty()
        && language != "."
        && language != ".."
        && !language.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_naming() {
        let layout = ShardLayout::new("/data", "mri").unwrap();
        assert_eq!(layout.shard_path(3), PathBuf::from("/data/mri/mri_3.tsv"));
        assert_eq!(layout.validation_path(), PathBuf::from("/data/mri/mri_8.tsv"));
        assert_eq!(layout.test_path(), PathBuf::from("/data/mri/mri_9.tsv"));
    }

    #[test]
    fn test_train_shards_in_index_order() {
        let layout = ShardLayout::new("d", "haw").unwrap();
        let indices: Vec<usize> = layout.train_shard_paths().into_iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_rejects_path_like_languages() {
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                ShardLayout::new("d", bad),
                Err(LaunchError::InvalidLanguage(_))
            ));
        }
    }
}
