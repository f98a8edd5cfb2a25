use log::{error, info};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::RunConfig;
use crate::dataset::assemble;
use crate::error::{LaunchError, Result};
use crate::shards::ShardLayout;
use crate::train::TrainerCommand;

#[derive(Debug)]
pub struct RunReport {
    pub train_lines: usize,
    pub status: ExitStatus,
}

/// Assembles the training set, runs the trainer, and removes the assembled
/// file before returning, whatever the outcome.
pub fn run(config: &RunConfig, shutdown: &AtomicBool) -> Result<RunReport> {
    let layout = ShardLayout::new(&config.data_root, config.language.as_str())?;
    let dataset = assemble(&layout, config.scratch_dir.as_deref())?;

    if shutdown.load(Ordering::Relaxed) {
        return Err(LaunchError::Interrupted);
    }

    let command = TrainerCommand::for_run(config, dataset.train_path(), dataset.validation_path());
    let status = command.run(shutdown)?;

    if status.success() {
        info!("Training for {} ({}) finished", config.experiment, config.arch);
    } else {
        error!("Trainer exited with {}", status);
    }

    Ok(RunReport {
        train_lines: dataset.train_lines(),
        status,
    })
}
