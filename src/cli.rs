use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "taskfarmer",
    about = "A simple task farmer for running serial jobs within a parallel allocation.",
    long_about = "Taskfarmer executes system commands from a shared job file one-by-one. Each worker process repeatedly claims the first remaining line under an exclusive file lock, runs it through the shell, and repeats until the file is empty.\n\nLaunch one instance per core, e.g.: mpirun -np 4 taskfarmer -f jobs.txt",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Location of the job file shared by all workers.
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help = "Location of job file (required)."
    )]
    pub(crate) file: PathBuf,

    #[arg(
        short = 'v',
        long = "verbose",
        help = "Print status updates to stdout."
    )]
    pub(crate) verbose: bool,

    #[arg(
        short = 'w',
        long = "wait-on-idle",
        help = "Wait for more jobs when the job file is empty."
    )]
    pub(crate) wait_on_idle: bool,

    #[arg(short = 'r', long = "retry", help = "Retry failed jobs.")]
    pub(crate) retry: bool,

    /// Sleep duration when idle (seconds).
    #[arg(
        short = 's',
        long = "sleep-time",
        value_name = "SECONDS",
        default_value_t = 300,
        help = "Sleep duration when idle (seconds)."
    )]
    pub(crate) sleep_time: u64,

    /// Maximum number of attempts for failed jobs.
    #[arg(
        short = 'm',
        long = "max-retries",
        value_name = "COUNT",
        default_value_t = 10,
        help = "Maximum number of attempts for failed jobs."
    )]
    pub(crate) max_retries: u64,
}
