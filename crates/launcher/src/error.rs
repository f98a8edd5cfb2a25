use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid language identifier: {0:?}")]
    InvalidLanguage(String),

    #[error("Training shard {index} unavailable at {}", path.display())]
    MissingShard {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start trainer {program:?}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted before the trainer finished")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, LaunchError>;
