use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Model design selected on the trainer command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    PointerGeneratorLstm,
    AttentiveLstm,
    Transformer,
}

impl Architecture {
    /// Identifier understood by the trainer's `--arch` flag.
    pub fn id(self) -> &'static str {
        match self {
            Architecture::PointerGeneratorLstm => "pointer_generator_lstm",
            Architecture::AttentiveLstm => "attentive_lstm",
            Architecture::Transformer => "transformer",
        }
    }

    /// Hyperparameter table this architecture is trained with.
    pub fn preset(self) -> Hyperparameters {
        match self {
            Architecture::PointerGeneratorLstm => Hyperparameters {
                embedding_size: 128,
                hidden_size: 512,
                extra: extras([
                    ("encoder_layers", ExtraValue::Int(1)),
                    ("decoder_layers", ExtraValue::Int(1)),
                ]),
                ..Hyperparameters::default()
            },
            Architecture::AttentiveLstm => Hyperparameters {
                embedding_size: 128,
                hidden_size: 512,
                extra: extras([
                    ("bidirectional", ExtraValue::Flag(true)),
                    ("encoder_layers", ExtraValue::Int(2)),
                    ("decoder_layers", ExtraValue::Int(1)),
                ]),
                ..Hyperparameters::default()
            },
            Architecture::Transformer => Hyperparameters {
                embedding_size: 256,
                hidden_size: 1024,
                batch_size: 400,
                max_epochs: 200,
                extra: extras([
                    ("encoder_layers", ExtraValue::Int(4)),
                    ("decoder_layers", ExtraValue::Int(4)),
                    ("source_attention_heads", ExtraValue::Int(4)),
                    ("label_smoothing", ExtraValue::Float(0.1)),
                    ("scheduler", ExtraValue::Text("warmupinvsqrt".to_string())),
                    ("warmup_steps", ExtraValue::Int(4000)),
                ]),
                ..Hyperparameters::default()
            },
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

fn extras<const N: usize>(pairs: [(&str, ExtraValue); N]) -> BTreeMap<String, ExtraValue> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Architecture-specific flag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    /// Emitted as a bare `--flag` when true, omitted when false.
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ExtraValue {
    /// Command-line rendering, or `None` for a flag that carries no value.
    pub fn render(&self) -> Option<String> {
        match self {
            ExtraValue::Flag(_) => None,
            ExtraValue::Int(v) => Some(v.to_string()),
            ExtraValue::Float(v) => Some(v.to_string()),
            ExtraValue::Text(v) => Some(v.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Dimension of the character embeddings.
    pub embedding_size: usize,
    /// Encoder/decoder hidden state size.
    pub hidden_size: usize,
    pub batch_size: usize,
    pub max_epochs: usize,
    pub log_every_n_step: usize,
    /// Optimizer name as the trainer spells it.
    pub optimizer: String,
    pub learning_rate: f64,
    pub dropout: f64,
    pub seed: u64,
    pub gradient_clip_val: f64,
    /// Flags appended after the shared table, in key order.
    #[serde(default)]
    pub extra: BTreeMap<String, ExtraValue>,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            embedding_size: 128,
            hidden_size: 512,
            batch_size: 32,
            max_epochs: 60,
            log_every_n_step: 20,
            optimizer: "adam".to_string(),
            learning_rate: 1e-3,
            dropout: 0.3,
            seed: 49,
            gradient_clip_val: 3.0,
            extra: BTreeMap::new(),
        }
    }
}

/// Partial hyperparameter table read from a YAML file and layered over a
/// preset. Absent keys keep the preset's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HyperparameterOverrides {
    pub embedding_size: Option<usize>,
    pub hidden_size: Option<usize>,
    pub batch_size: Option<usize>,
    pub max_epochs: Option<usize>,
    pub log_every_n_step: Option<usize>,
    pub optimizer: Option<String>,
    pub learning_rate: Option<f64>,
    pub dropout: Option<f64>,
    pub seed: Option<u64>,
    pub gradient_clip_val: Option<f64>,
    pub extra: BTreeMap<String, ExtraValue>,
}

impl HyperparameterOverrides {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn apply(self, base: &mut Hyperparameters) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field {
                    base.$field = v;
                })*
            };
        }
        set!(
            embedding_size,
            hidden_size,
            batch_size,
            max_epochs,
            log_every_n_step,
            optimizer,
            learning_rate,
            dropout,
            seed,
            gradient_clip_val
        );
        base.extra.extend(self.extra);
    }
}

/// Executable that performs the training, plus any leading arguments
/// (e.g. `python -m some.train`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerProgram {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for TrainerProgram {
    fn default() -> Self {
        Self {
            program: "yoyodyne-train".to_string(),
            args: Vec::new(),
        }
    }
}

/// Everything one run needs. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub experiment: String,
    pub language: String,
    pub data_root: PathBuf,
    /// Handed to the trainer as-is; not created here.
    pub model_dir: PathBuf,
    /// Where the assembled training file is written. Defaults to the
    /// language directory.
    pub scratch_dir: Option<PathBuf>,
    pub trainer: TrainerProgram,
    pub arch: Architecture,
    pub hyperparameters: Hyperparameters,
}

impl RunConfig {
    /// Preset run for `arch`, with the experiment named after the language.
    pub fn new(arch: Architecture, language: &str, data_root: PathBuf, model_dir: PathBuf) -> Self {
        Self {
            experiment: language.to_string(),
            language: language.to_string(),
            data_root,
            model_dir,
            scratch_dir: None,
            trainer: TrainerProgram::default(),
            arch,
            hyperparameters: arch.preset(),
        }
    }
}
