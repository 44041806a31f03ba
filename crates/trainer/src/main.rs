//! Training front-end for the Hold'em Toss solver.
//!
//! Thin shell around the core trainer: parse flags, run iteration chunks,
//! checkpoint between them, export a strategy-only artifact at the end.
//! Interrupting the process loses at most one chunk; the checkpoint on
//! disk always resumes bit-exactly.

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use toss_solver_core::cfr::train_parallel;
use toss_solver_core::checkpoint::Checkpoint;
use toss_solver_core::game::Action;
use toss_solver_core::{GameConfig, MccfrTrainer};

#[derive(Parser)]
#[command(name = "toss-solver-trainer")]
#[command(about = "Train Hold'em Toss strategies with external-sampling MCCFR")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run training iterations and write checkpoints
    Train {
        /// Number of iterations to run
        #[arg(short, long, default_value_t = 10_000)]
        iterations: u64,
        /// RNG seed (ignored when resuming)
        #[arg(short, long, default_value_t = 1)]
        seed: u64,
        /// Checkpoint path written during and after training
        #[arg(short, long, default_value = "toss.ckpt")]
        output: PathBuf,
        /// Also export a strategy-only artifact for the play side
        #[arg(short, long)]
        export: Option<PathBuf>,
        /// Checkpoint every N iterations (default: only at the end)
        #[arg(long)]
        checkpoint_every: Option<u64>,
        /// Resume from an existing checkpoint
        #[arg(long)]
        resume: Option<PathBuf>,
        /// YAML game-parameter file (defaults to canonical stakes)
        #[arg(long)]
        game_config: Option<PathBuf>,
        /// Shard across this many rayon workers (fresh runs only; the
        /// merged result is not resumable to a single-stream run)
        #[arg(long)]
        shards: Option<usize>,
    },
    /// Print summary statistics for a checkpoint
    Inspect {
        /// Checkpoint or strategy file
        path: PathBuf,
        /// Number of highest-mass infosets to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            iterations,
            seed,
            output,
            export,
            checkpoint_every,
            resume,
            game_config,
            shards,
        } => train(
            iterations,
            seed,
            &output,
            export.as_deref(),
            checkpoint_every,
            resume.as_deref(),
            game_config.as_deref(),
            shards,
        ),
        Commands::Inspect { path, top } => inspect(&path, top),
    }
}

#[allow(clippy::too_many_arguments)]
fn train(
    iterations: u64,
    seed: u64,
    output: &std::path::Path,
    export: Option<&std::path::Path>,
    checkpoint_every: Option<u64>,
    resume: Option<&std::path::Path>,
    game_config: Option<&std::path::Path>,
    shards: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let config = match game_config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    if let Some(shards) = shards {
        let started = Instant::now();
        let trainer = train_parallel(&config, seed, iterations, shards)?;
        trainer.to_checkpoint().save(output)?;
        report(&trainer, started, output);
        if let Some(path) = export {
            trainer.to_checkpoint().strategy_only().save(path)?;
            println!("exported strategy to {}", path.display());
        }
        return Ok(());
    }

    let mut trainer = match resume {
        Some(path) => {
            let checkpoint = Checkpoint::load(path)?;
            println!(
                "resuming from {} at iteration {}",
                path.display(),
                checkpoint.iteration
            );
            MccfrTrainer::from_checkpoint(config, checkpoint)
        }
        None => MccfrTrainer::new(config, seed),
    };

    let bar = ProgressBar::new(iterations);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec}) {msg}",
    )?);

    let started = Instant::now();
    let chunk = checkpoint_every.unwrap_or(iterations).max(1);
    let mut remaining = iterations;
    while remaining > 0 {
        let step = chunk.min(remaining);
        trainer.train_with_callback(step, |_| bar.inc(1))?;
        remaining -= step;

        // A failed write costs this checkpoint, not the run; the next
        // boundary retries.
        if let Err(e) = trainer.to_checkpoint().save(output) {
            bar.println(format!("checkpoint write failed, will retry: {e}"));
        }
        bar.set_message(format!(
            "{} infosets, mean {:+.3}",
            trainer.infoset_count(),
            trainer.mean_root_utility()
        ));
    }
    bar.finish();

    // The final checkpoint must land.
    trainer.to_checkpoint().save(output)?;

    report(&trainer, started, output);
    if let Some(path) = export {
        trainer.to_checkpoint().strategy_only().save(path)?;
        println!("exported strategy to {}", path.display());
    }
    Ok(())
}

fn report(trainer: &MccfrTrainer, started: Instant, output: &std::path::Path) {
    let elapsed = started.elapsed().as_secs_f64();
    #[allow(clippy::cast_precision_loss)]
    let rate = trainer.iterations() as f64 / elapsed.max(1e-9);
    println!(
        "{} iterations total ({rate:.0}/s this run), {} infosets, checkpoint at {}",
        trainer.iterations(),
        trainer.infoset_count(),
        output.display()
    );
}

fn inspect(path: &std::path::Path, top: usize) -> Result<(), Box<dyn Error>> {
    let checkpoint = Checkpoint::load(path)?;
    println!("iteration:    {}", checkpoint.iteration);
    println!("infosets:     {}", checkpoint.strategy_sum.len());
    println!("regret rows:  {}", checkpoint.regret_sum.len());

    let mut ranked: Vec<(&String, f64)> = checkpoint
        .strategy_sum
        .iter()
        .map(|(key, row)| (key, row.iter().sum::<f64>()))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    println!("top {top} infosets by accumulated mass:");
    for (key, mass) in ranked.into_iter().take(top) {
        let row = &checkpoint.strategy_sum[key];
        let mix: Vec<String> = Action::ALL
            .iter()
            .filter(|a| row[a.index()] > 0.0)
            .map(|a| format!("{a:?}={:.2}", row[a.index()] / mass))
            .collect();
        println!("  {key}  mass={mass:.1}  {}", mix.join(" "));
    }
    Ok(())
}
