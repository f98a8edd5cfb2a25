use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use launcher::ShardLayout;

mod counts;
mod lemma;
mod split;

use counts::CountsOutput;
use lemma::{Form, LemmaSplitter};

#[derive(Parser)]
#[command(author, version, about = "Prepare TSV shards for training", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shuffle a TSV file and split it into numbered per-language shards
    Split {
        #[arg(short, long)]
        input: PathBuf,

        /// Root under which `<language>/<language>_<i>.tsv` is written
        #[arg(short, long, default_value = "data")]
        output_root: PathBuf,

        #[arg(short, long, default_value = "mri")]
        language: String,

        #[arg(short, long, default_value_t = 10)]
        num_shards: usize,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Split hyphenated `stem-suffix` forms into lemma and suffix columns
    LemmaSuffix {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = Form::Suffix)]
        form: Form,
    },
    /// Count stem-final vowels and vowel/suffix pairs in a `lemma<TAB>suffix` file
    Counts {
        #[arg(short, long)]
        input: PathBuf,

        /// Output TSV of `vowel, count`
        #[arg(long)]
        vowel_counts: PathBuf,

        /// Output TSV of `vowel, suffix, count`
        #[arg(long)]
        pair_counts: PathBuf,

        /// Output TSV of `vowel, suffix, P(suffix | vowel)`
        #[arg(long)]
        probabilities: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            input,
            output_root,
            language,
            num_shards,
            seed,
        } => {
            let layout = ShardLayout::new(output_root, language)?;
            let rows = split::split_file(&input, &layout, num_shards, seed)?;
            println!(
                "Done. Split {} rows into {} shards under {:?}.",
                rows,
                num_shards,
                layout.language_dir()
            );
        }
        Commands::LemmaSuffix {
            input,
            output,
            form,
        } => {
            let rows = LemmaSplitter::new(form)?.rewrite_file(&input, &output)?;
            println!("Done. Wrote {} rows to {:?}.", rows, output);
        }
        Commands::Counts {
            input,
            vowel_counts,
            pair_counts,
            probabilities,
        } => {
            let counts = counts::count_file(
                &input,
                &CountsOutput {
                    vowel_counts: &vowel_counts,
                    pair_counts: &pair_counts,
                    probabilities: &probabilities,
                },
            )?;
            for (vowel, count) in counts.vowels.most_common() {
                println!("{}:\t{}", vowel, count);
            }
        }
    }

    Ok(())
}
