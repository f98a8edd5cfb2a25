use log::{info, warn};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::config::{ExtraValue, RunConfig};
use crate::error::{LaunchError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A fully resolved invocation of the external trainer.
#[derive(Debug, Clone)]
pub struct TrainerCommand {
    program: String,
    args: Vec<OsString>,
}

impl TrainerCommand {
    pub fn for_run(config: &RunConfig, train: &Path, val: &Path) -> Self {
        let hp = &config.hyperparameters;
        let mut args: Vec<OsString> = config.trainer.args.iter().map(OsString::from).collect();

        let mut flag = |name: &str, value: OsString| {
            args.push(format!("--{name}").into());
            args.push(value);
        };
        flag("experiment", config.experiment.clone().into());
        flag("train", train.into());
        flag("val", val.into());
        flag("model_dir", config.model_dir.clone().into());
        flag("arch", config.arch.id().into());
        flag("embedding_size", hp.embedding_size.to_string().into());
        flag("hidden_size", hp.hidden_size.to_string().into());
        flag("batch_size", hp.batch_size.to_string().into());
        flag("max_epochs", hp.max_epochs.to_string().into());
        flag("log_every_n_step", hp.log_every_n_step.to_string().into());
        flag("optimizer", hp.optimizer.clone().into());
        flag("learning_rate", hp.learning_rate.to_string().into());
        flag("dropout", hp.dropout.to_string().into());
        flag("seed", hp.seed.to_string().into());
        flag("gradient_clip_val", hp.gradient_clip_val.to_string().into());

        for (name, value) in &hp.extra {
            match (value, value.render()) {
                (ExtraValue::Flag(true), _) => args.push(format!("--{name}").into()),
                (ExtraValue::Flag(false), _) => {}
                (_, Some(rendered)) => {
                    args.push(format!("--{name}").into());
                    args.push(rendered.into());
                }
                (_, None) => {}
            }
        }

        Self {
            program: config.trainer.program.clone(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Runs the trainer to completion with inherited stdio.
    ///
    /// Returns the child's status whether or not it succeeded. If `shutdown`
    /// is raised while waiting, the child is killed and reaped and
    /// `LaunchError::Interrupted` is returned.
    pub fn run(&self, shutdown: &AtomicBool) -> Result<ExitStatus> {
        info!("Starting trainer: {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if shutdown.load(Ordering::Relaxed) {
                stop(&mut child);
                return Err(LaunchError::Interrupted);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn stop(child: &mut Child) {
    warn!("Shutdown requested; stopping trainer (pid {})", child.id());
    // The child may already be gone if it shares our terminal's SIGINT.
    if let Err(e) = child.kill() {
        warn!("Failed to kill trainer: {}", e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap trainer: {}", e);
    }
}

/// Process exit code to report for a finished trainer.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Architecture;
    use std::path::PathBuf;

    fn arg_value<'a>(cmd: &'a TrainerCommand, name: &str) -> Option<&'a OsString> {
        let flag = format!("--{name}");
        cmd.args()
            .iter()
            .position(|a| *a == *flag)
            .and_then(|i| cmd.args().get(i + 1))
    }

    fn strings(cmd: &TrainerCommand) -> Vec<String> {
        cmd.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_shared_flags_in_fixed_order() {
        let config = RunConfig::new(
            Architecture::PointerGeneratorLstm,
            "mri",
            PathBuf::from("/data"),
            PathBuf::from("/models/pg"),
        );
        let cmd = TrainerCommand::for_run(
            &config,
            Path::new("/data/mri/mri_train.abc.tsv"),
            Path::new("/data/mri/mri_8.tsv"),
        );
        let args = strings(&cmd);
        let flags: Vec<&str> = args
            .iter()
            .filter(|a| a.starts_with("--"))
            .map(String::as_str)
            .collect();

        assert_eq!(
            &flags[..15],
            &[
                "--experiment",
                "--train",
                "--val",
                "--model_dir",
                "--arch",
                "--embedding_size",
                "--hidden_size",
                "--batch_size",
                "--max_epochs",
                "--log_every_n_step",
                "--optimizer",
                "--learning_rate",
                "--dropout",
                "--seed",
                "--gradient_clip_val",
            ]
        );
        assert_eq!(&args[..2], &["--experiment", "mri"]);
        assert_eq!(arg_value(&cmd, "arch").unwrap(), "pointer_generator_lstm");
        assert_eq!(arg_value(&cmd, "val").unwrap(), "/data/mri/mri_8.tsv");
        assert_eq!(arg_value(&cmd, "learning_rate").unwrap(), "0.001");
        assert_eq!(cmd.program(), "yoyodyne-train");
    }

    #[test]
    fn test_boolean_extras() {
        let mut config = RunConfig::new(
            Architecture::AttentiveLstm,
            "mri",
            PathBuf::from("d"),
            PathBuf::from("m"),
        );
        let cmd = TrainerCommand::for_run(&config, Path::new("t"), Path::new("v"));
        let args = strings(&cmd);
        let pos = args.iter().position(|a| a == "--bidirectional").unwrap();
        assert!(args[pos + 1].starts_with("--"));

        config
            .hyperparameters
            .extra
            .insert("bidirectional".to_string(), ExtraValue::Flag(false));
        let cmd = TrainerCommand::for_run(&config, Path::new("t"), Path::new("v"));
        assert!(!strings(&cmd).iter().any(|a| a == "--bidirectional"));
    }

    #[test]
    fn test_leading_program_args() {
        let mut config = RunConfig::new(
            Architecture::Transformer,
            "mri",
            PathBuf::from("d"),
            PathBuf::from("m"),
        );
        config.trainer.program = "python".to_string();
        config.trainer.args = vec!["-m".to_string(), "yoyodyne.train".to_string()];
        let cmd = TrainerCommand::for_run(&config, Path::new("t"), Path::new("v"));
        let args = strings(&cmd);
        assert_eq!(&args[..3], &["-m", "yoyodyne.train", "--experiment"]);
        assert_eq!(arg_value(&cmd, "scheduler").unwrap(), "warmupinvsqrt");
    }

    #[test]
    fn test_spawn_failure() {
        let mut config = RunConfig::new(
            Architecture::Transformer,
            "mri",
            PathBuf::from("d"),
            PathBuf::from("m"),
        );
        config.trainer.program = "/nonexistent/trainer-binary".to_string();
        let cmd = TrainerCommand::for_run(&config, Path::new("t"), Path::new("v"));
        let err = cmd.run(&AtomicBool::new(false)).err().unwrap();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_from_status() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }
}
