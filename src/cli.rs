use std::fs::{self, File};
use std::io::Write;

use chrono::{DateTime, Utc};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::info;

use crate::data::Dataset;
use crate::driver::{find_motifs, ConvergencePolicy, MotifResult};
use crate::error::MotifError;
use crate::rng::Rng;

/// Generates a synthetic benchmark and runs the Gibbs sampler over it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// number of motifs to embed in every sequence
    pub num_motifs: usize,

    /// length of each embedded motif (also the sampler's `k`)
    pub motif_length: usize,

    /// number of sequences to generate
    pub num_sequences: usize,

    /// length of each generated sequence
    pub sequence_length: usize,

    /// pseudocount added to every PWM cell before normalization
    #[arg(short = 'p', long = "pseudocount", default_value_t = 0.1)]
    pub pseudocount: f64,

    /// maximum number of Gibbs sampling iterations
    #[arg(short = 'i', long = "iterations", default_value_t = 10_000)]
    pub max_iterations: usize,

    /// consecutive iterations of an unchanged consensus before early stop
    #[arg(long = "stable-window")]
    pub stable_consensus_window: Option<u32>,

    /// deterministic RNG seed (omit to seed from OS entropy)
    #[arg(short = 's', long = "seed")]
    pub seed: Option<u64>,

    /// run the PWM/scoring math in f64 instead of the f32 default
    #[arg(long = "double-precision")]
    pub double_precision: bool,

    /// save a results summary to file; pass a path, or omit one for a
    /// timestamped default name
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<Option<String>>,

    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Cli {
    pub fn run(self) -> Result<(), MotifError> {
        init_tracing(&self.verbose);

        if self.num_motifs == 0 {
            return Err(MotifError::InvalidArgument(
                "num_motifs must be positive".into(),
            ));
        }
        if self.motif_length == 0 {
            return Err(MotifError::InvalidArgument(
                "motif_length must be positive".into(),
            ));
        }
        if self.num_sequences == 0 {
            return Err(MotifError::InvalidArgument(
                "num_sequences must be positive".into(),
            ));
        }
        if self.sequence_length == 0 {
            return Err(MotifError::InvalidArgument(
                "sequence_length must be positive".into(),
            ));
        }

        let start_time = Utc::now();
        info!("Welcome to motif_gibbs!");

        let motif_lengths = vec![self.motif_length; self.num_motifs];
        let mut rng = match self.seed {
            Some(seed) => Rng::from_seed(seed),
            None => Rng::from_entropy(),
        };

        let dataset = Dataset::generate(
            &motif_lengths,
            self.num_sequences,
            self.sequence_length,
            0.0,
            &mut rng,
        )?;
        println!("{dataset}");

        let policy = ConvergencePolicy {
            max_iterations: self.max_iterations,
            stable_consensus_window: self.stable_consensus_window,
        };

        let result = if self.double_precision {
            find_motifs::<f64>(&dataset, self.motif_length, self.pseudocount, policy, rng)?
        } else {
            find_motifs::<f32>(
                &dataset,
                self.motif_length,
                self.pseudocount as f32,
                policy,
                rng,
            )?
        };

        println!("num correct: {}", result.num_correct);
        println!("{}", render_positions(&result.positions));

        if let Some(save_flag) = &self.output_file {
            let (mut file, file_path) = create_output_file(save_flag, self.motif_length)?;
            write_results_file(&mut file, &self, &result, start_time)?;
            info!(file_path, "results saved");
        }

        Ok(())
    }
}

fn render_positions(positions: &[usize]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn init_tracing(verbose: &Verbosity<InfoLevel>) {
    let level = match verbose.log_level_filter() {
        log::LevelFilter::Off => tracing::level_filters::LevelFilter::OFF,
        log::LevelFilter::Error => tracing::level_filters::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing::level_filters::LevelFilter::WARN,
        log::LevelFilter::Info => tracing::level_filters::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing::level_filters::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing::level_filters::LevelFilter::TRACE,
    };
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

fn create_output_file(
    save_flag: &Option<String>,
    k: usize,
) -> Result<(File, String), MotifError> {
    let timestamp = Utc::now().timestamp_micros();
    let save_path = save_flag
        .clone()
        .unwrap_or_else(|| format!("motif_gibbs-output-{timestamp}-{k}.txt"));
    let file = fs::File::create(&save_path)?;
    Ok((file, save_path))
}

fn write_results_file(
    file: &mut File,
    cli: &Cli,
    result: &MotifResult,
    start_time: DateTime<Utc>,
) -> Result<(), MotifError> {
    let version = env!("CARGO_PKG_VERSION");
    writeln!(file, "motif_gibbs {version}")?;
    writeln!(file, "num_motifs: {}", cli.num_motifs)?;
    writeln!(file, "motif_length: {}", cli.motif_length)?;
    writeln!(file, "num_sequences: {}", cli.num_sequences)?;
    writeln!(file, "sequence_length: {}", cli.sequence_length)?;
    writeln!(file, "pseudocount: {}", cli.pseudocount)?;
    writeln!(file, "max_iterations: {}", cli.max_iterations)?;
    writeln!(file, "start time: {}", start_time.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(
        file,
        "_________________________________________________________________________________________"
    )?;
    writeln!(file, "consensus: {}", result.consensus)?;
    writeln!(file, "num correct: {}", result.num_correct)?;
    writeln!(file, "positions: {}", render_positions(&result.positions))?;

    let end_time = Utc::now();
    if let Some(duration) = end_time.signed_duration_since(start_time).num_microseconds() {
        writeln!(file, "done in {} seconds", duration as f64 / 1_000_000.0)?;
    }
    Ok(())
}
