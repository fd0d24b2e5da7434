use anyhow::{bail, Context, Result};
use bbox::CoordinateSystem;
use clap::{Parser, Subcommand};
use grounding_tool::{commands, config::Config, dataset};
use rendezvous::Role;
use std::{env, path::PathBuf, time::Duration};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
/// Prepare grounding datasets and coordinate multi-node start-up
struct Args {
    #[clap(long)]
    /// configuration file
    config_file: Option<PathBuf>,
    #[clap(subcommand)]
    command: Opts,
}

#[derive(Debug, Clone, Subcommand)]
enum Opts {
    /// Convert <ref>/<point> tagged pointing data into annotation samples
    ConvertPointing {
        /// input .json or .jsonl file
        input_file: PathBuf,
        /// output .json file
        output_file: PathBuf,
        #[clap(long)]
        /// save skipped items to this file
        save_malformed: Option<PathBuf>,
        #[clap(long)]
        /// coordinate system of the points
        system: Option<CoordinateSystem>,
    },
    /// Convert annotation coordinates between absolute and relative_1000
    Normalize {
        input_file: PathBuf,
        output_file: PathBuf,
        #[clap(long)]
        /// coordinate system of the input
        from: CoordinateSystem,
        #[clap(long)]
        /// coordinate system of the output, defaults to the configured one
        to: Option<CoordinateSystem>,
        #[clap(long)]
        /// directory the image paths are relative to
        image_dir: PathBuf,
    },
    /// Map absolute coordinates onto the processor's resized image size
    Rescale {
        input_file: PathBuf,
        output_file: PathBuf,
        #[clap(long)]
        system: Option<CoordinateSystem>,
        #[clap(long)]
        image_dir: PathBuf,
    },
    /// Validate an annotation file
    Check {
        input_file: PathBuf,
        #[clap(long)]
        system: Option<CoordinateSystem>,
    },
    /// Resolve dataset names with optional %NN sampling suffixes
    Datasets { names: Vec<String> },
    /// Start-up gate shared by all ranks of a job
    Gate {
        #[clap(long, env = "SLURM_JOB_ID")]
        /// unique identifier of the run
        run_id: String,
        #[clap(long)]
        /// shared directory holding the flag, overrides the config
        flag_dir: Option<PathBuf>,
        #[clap(subcommand)]
        action: GateAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum GateAction {
    /// Lead on rank 0 by running the command, otherwise wait for the leader
    Pass {
        #[clap(long, env = "RANK")]
        /// rank of this process, falls back to SLURM_PROCID
        rank: Option<usize>,
        #[clap(long)]
        /// give up waiting after this many seconds
        timeout_secs: Option<u64>,
        #[clap(last = true, required = true)]
        command: Vec<String>,
    },
    /// Wait for the leader without preparing anything
    Wait {
        #[clap(long)]
        timeout_secs: Option<u64>,
    },
    /// Remove the flag at the end of the job
    Release,
}

fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    // parse arguments
    let Args {
        config_file,
        command,
    } = Args::parse();
    let config = match &config_file {
        Some(path) => Config::open(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => Config::default(),
    };
    let system_or_config = |system: Option<CoordinateSystem>| {
        system.or_else(|| config.coordinate_system()).context(
            "coordinate system is not given, pass --system or set model_family in the config",
        )
    };

    match command {
        Opts::ConvertPointing {
            input_file,
            output_file,
            save_malformed,
            system,
        } => {
            commands::convert_pointing(
                &input_file,
                &output_file,
                save_malformed.as_deref(),
                system_or_config(system)?,
            )?;
        }
        Opts::Normalize {
            input_file,
            output_file,
            from,
            to,
            image_dir,
        } => {
            commands::normalize(
                &input_file,
                &output_file,
                from,
                system_or_config(to)?,
                &image_dir,
            )?;
        }
        Opts::Rescale {
            input_file,
            output_file,
            system,
            image_dir,
        } => {
            commands::rescale(
                &input_file,
                &output_file,
                system_or_config(system)?,
                &image_dir,
                &config.resize,
            )?;
        }
        Opts::Check { input_file, system } => {
            let report = commands::check(&input_file, system_or_config(system)?)?;
            report.print();
            if !report.is_ok() {
                bail!("{} invalid samples", report.errors.len());
            }
        }
        Opts::Datasets { names } => {
            let names: Vec<String> = if names.is_empty() {
                config.datasets.keys().cloned().collect()
            } else {
                names
            };
            let selected = dataset::select_datasets(&config.datasets, &names)?;
            commands::print_datasets(&selected);
        }
        Opts::Gate {
            run_id,
            flag_dir,
            action,
        } => {
            let flag = commands::gate_flag(&config.gate, flag_dir, &run_id)?;
            let wait_options = |timeout_secs: Option<u64>| {
                let mut options = config.gate.wait_options(None);
                if let Some(secs) = timeout_secs {
                    options.timeout = Some(Duration::from_secs(secs));
                }
                options
            };

            match action {
                GateAction::Pass {
                    rank,
                    timeout_secs,
                    command,
                } => {
                    let procid = env::var("SLURM_PROCID").ok();
                    let rank = commands::resolve_rank(rank, procid.as_deref())?;
                    commands::pass_gate(
                        flag,
                        Role::from_rank(rank),
                        &wait_options(timeout_secs),
                        &command,
                    )?;
                }
                GateAction::Wait { timeout_secs } => {
                    commands::pass_gate(flag, Role::Follower, &wait_options(timeout_secs), &[])?;
                }
                GateAction::Release => {
                    commands::release_gate(flag)?;
                }
            }
        }
    }

    Ok(())
}
