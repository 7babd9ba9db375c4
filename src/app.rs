use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::WorkerConfig;
use crate::logger::Logger;
use crate::queue::JobQueue;
use crate::runner::ShellRunner;
use crate::worker::{quit, run_loop, Quit, WorkerState};

pub(crate) fn require_file(path: &Path, label: &str) -> Result<(), String> {
    if !path.is_file() {
        return Err(format!("Missing {}: {}", label, path.display()));
    }
    Ok(())
}

pub(crate) fn run_with_cli(cli: Cli) -> Result<(), Quit> {
    let config = WorkerConfig::from_cli(&cli).map_err(|message| {
        eprintln!("{}", message);
        quit(&message, 1)
    })?;

    if let Err(message) = require_file(&config.job_file, "job file") {
        eprintln!("{}", message);
        return Err(quit(&message, 1));
    }

    let interrupt_flag = Arc::new(AtomicBool::new(false));
    if let Err(err) = ctrlc::set_handler({
        let interrupt_flag = Arc::clone(&interrupt_flag);
        move || {
            interrupt_flag.store(true, Ordering::SeqCst);
        }
    }) {
        eprintln!("Failed to set interrupt handler: {}", err);
    }

    let logger = Logger::new(config.rank, config.verbose);
    logger.status(&format!(
        "worker {} of {} starting",
        config.rank, config.world_size
    ));

    let queue = JobQueue::new(config.job_file.clone());
    let mut state = WorkerState {
        config,
        queue,
        runner: ShellRunner,
        logger,
        interrupt_flag,
    };

    run_loop(&mut state)
}

pub(crate) fn run_with_args(args: Vec<OsString>) -> Result<(), Quit> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // clap's `Error::print()` uses termcolor and can bypass Rust's test
            // output capturing. Rendering it ourselves keeps CLI errors
            // capture-friendly. Usage errors exit 1 (not clap's 2), matching
            // the other configuration failures; help and version stay 0.
            let code = if err.use_stderr() { 1 } else { 0 };
            if err.use_stderr() {
                eprintln!("{err}");
            } else {
                println!("{err}");
            }
            return Err(Quit {
                code,
                reason: "cli_parse".to_string(),
            });
        }
    };
    run_with_cli(cli)
}

pub(crate) fn main_with_args(args: Vec<OsString>) -> ExitCode {
    match run_with_args(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(quit) => quit.exit_code(),
    }
}

pub(crate) fn main() -> ExitCode {
    main_with_args(env::args_os().collect())
}
