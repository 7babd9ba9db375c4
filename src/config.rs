use std::env;
use std::path::PathBuf;

use crate::cli::Cli;

// Rank/size variables exported by the common launchers, checked in order.
const RANK_ENV_VARS: &[&str] = &["OMPI_COMM_WORLD_RANK", "PMI_RANK", "SLURM_PROCID"];
const SIZE_ENV_VARS: &[&str] = &["OMPI_COMM_WORLD_SIZE", "PMI_SIZE", "SLURM_NTASKS"];

/// Per-worker configuration, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub(crate) struct WorkerConfig {
    pub(crate) job_file: PathBuf,
    pub(crate) verbose: bool,
    pub(crate) wait_on_idle: bool,
    pub(crate) sleep_time: u64,
    pub(crate) retry: bool,
    pub(crate) max_retries: u64,
    pub(crate) rank: u32,
    pub(crate) world_size: u32,
}

impl WorkerConfig {
    pub(crate) fn from_cli(cli: &Cli) -> Result<Self, String> {
        if cli.wait_on_idle && cli.sleep_time == 0 {
            return Err("Sleep time must be greater than zero.".to_string());
        }
        if cli.retry && cli.max_retries == 0 {
            return Err("Maximum number of retries must be greater than zero.".to_string());
        }

        // A single attempt when retry is unset, whatever -m says.
        let max_retries = if cli.retry { cli.max_retries } else { 1 };

        Ok(Self {
            job_file: cli.file.clone(),
            verbose: cli.verbose,
            wait_on_idle: cli.wait_on_idle,
            sleep_time: cli.sleep_time,
            retry: cli.retry,
            max_retries,
            rank: detect_rank(),
            world_size: detect_world_size(),
        })
    }
}

/// Process rank within the allocation, used only for log labelling.
pub(crate) fn detect_rank() -> u32 {
    env_u32(RANK_ENV_VARS).unwrap_or(0)
}

pub(crate) fn detect_world_size() -> u32 {
    env_u32(SIZE_ENV_VARS).unwrap_or(1).max(1)
}

fn env_u32(keys: &[&str]) -> Option<u32> {
    for key in keys {
        let Ok(value) = env::var(key) else {
            continue;
        };
        if let Ok(parsed) = value.trim().parse::<u32>() {
            return Some(parsed);
        }
    }
    None
}
