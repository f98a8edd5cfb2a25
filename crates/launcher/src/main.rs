use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use launcher::{exit_code, Architecture, HyperparameterOverrides, LaunchError, RunConfig};

#[derive(Parser)]
#[command(author, version, about = "Assemble shards and launch the external seq2seq trainer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pointer-generator LSTM
    PointerGenerator(RunArgs),
    /// Attentive bidirectional LSTM
    AttentiveLstm(RunArgs),
    /// Transformer
    Transformer(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Language whose shards are assembled
    #[arg(short, long, default_value = "mri")]
    language: String,

    /// Directory holding `<language>/<language>_<i>.tsv` [default: $PWD/data]
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Output directory handed to the trainer [default: models/<arch>]
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Experiment name [default: the language]
    #[arg(long)]
    experiment: Option<String>,

    /// Directory for the assembled training file [default: the language directory]
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Trainer executable
    #[arg(long, default_value = "yoyodyne-train")]
    trainer_program: String,

    /// Argument placed before the generated flags (repeatable)
    #[arg(long = "trainer-arg", allow_hyphen_values = true)]
    trainer_args: Vec<String>,

    /// YAML file overriding the architecture's hyperparameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the resolved run configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

impl Commands {
    fn split(self) -> (Architecture, RunArgs) {
        match self {
            Commands::PointerGenerator(args) => (Architecture::PointerGeneratorLstm, args),
            Commands::AttentiveLstm(args) => (Architecture::AttentiveLstm, args),
            Commands::Transformer(args) => (Architecture::Transformer, args),
        }
    }
}

fn build_config(arch: Architecture, args: &RunArgs) -> Result<RunConfig> {
    let data_root = match &args.data_root {
        Some(root) => root.clone(),
        None => std::env::current_dir()
            .context("Failed to resolve working directory")?
            .join("data"),
    };
    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("models").join(arch.id()));

    let mut config = RunConfig::new(arch, &args.language, data_root, model_dir);
    if let Some(experiment) = &args.experiment {
        config.experiment = experiment.clone();
    }
    config.scratch_dir = args.scratch_dir.clone();
    config.trainer.program = args.trainer_program.clone();
    config.trainer.args = args.trainer_args.clone();

    if let Some(path) = &args.config {
        let overrides = HyperparameterOverrides::load(path)
            .with_context(|| format!("Failed to load overrides from {}", path.display()))?;
        overrides.apply(&mut config.hyperparameters);
    }
    Ok(config)
}

fn launch(cli: Cli) -> Result<i32> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install signal handler")?;

    let (arch, args) = cli.command.split();
    let config = build_config(arch, &args)?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(0);
    }

    let report = launcher::run(&config, &shutdown)
        .with_context(|| format!("Run {} ({}) failed", config.experiment, arch))?;
    Ok(exit_code(report.status))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let code = match launch(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<LaunchError>() {
                Some(LaunchError::Interrupted) => 130,
                _ => 1,
            }
        }
    };
    std::process::exit(code);
}
