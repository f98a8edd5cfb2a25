pub mod config;
pub mod dataset;
pub mod error;
pub mod run;
pub mod shards;
pub mod train;

pub use config::{Architecture, ExtraValue, HyperparameterOverrides, Hyperparameters, RunConfig, TrainerProgram};
pub use dataset::{assemble, AssembledDataset};
pub use error::{LaunchError, Result};
pub use run::{run, RunReport};
pub use shards::ShardLayout;
pub use train::{exit_code, TrainerCommand};
