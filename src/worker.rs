use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::WorkerConfig;
use crate::logger::Logger;
use crate::queue::JobQueue;
use crate::runner::CommandRunner;

/// Everything one worker needs, assembled once at startup.
pub(crate) struct WorkerState<R: CommandRunner> {
    pub(crate) config: WorkerConfig,
    pub(crate) queue: JobQueue,
    pub(crate) runner: R,
    pub(crate) logger: Logger,
    pub(crate) interrupt_flag: Arc<AtomicBool>,
}

#[derive(Debug)]
pub(crate) struct Quit {
    pub(crate) code: i32,
    #[allow(dead_code)]
    pub(crate) reason: String,
}

impl Quit {
    pub(crate) fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code as u8)
    }
}

pub(crate) fn quit(reason: &str, code: i32) -> Quit {
    Quit {
        code,
        reason: reason.to_string(),
    }
}

/// The claim/execute cycle. Runs until the job file is empty (unless
/// wait-on-idle keeps the worker polling), a fatal queue error occurs, or
/// the worker is interrupted.
pub(crate) fn run_loop<R: CommandRunner>(state: &mut WorkerState<R>) -> Result<(), Quit> {
    loop {
        check_interrupted(state)?;

        let claimed = state.queue.dequeue().map_err(|err| {
            eprintln!("{}", err);
            quit(&format!("dequeue_failed:{err}"), 1)
        })?;

        match claimed {
            Some(job) => execute_job(state, &job)?,
            None if state.config.wait_on_idle => {
                state.logger.status("waiting for more jobs");
                thread::sleep(Duration::from_secs(state.config.sleep_time));
            }
            None => {
                state.logger.status("job file is empty: exiting");
                return Ok(());
            }
        }
    }
}

/// Run one claimed job, re-executing the same text on failure until it
/// succeeds or the attempt budget is spent. An exhausted job is abandoned:
/// it is never written back to the job file, and only the worker that
/// claimed it ever retries it.
fn execute_job<R: CommandRunner>(state: &WorkerState<R>, job: &str) -> Result<(), Quit> {
    state.logger.status(&format!("launching: {}", job));

    let mut attempts: u64 = 0;
    loop {
        check_interrupted(state)?;
        attempts += 1;

        let succeeded = match state.runner.run(job) {
            Ok(succeeded) => succeeded,
            Err(err) => {
                state.logger.warn(&err);
                false
            }
        };
        if succeeded {
            return Ok(());
        }

        if state.config.retry {
            state.logger.warn(&format!(
                "system command failed, {} ({}/{})",
                job, attempts, state.config.max_retries
            ));
        } else {
            state.logger.warn(&format!("system command failed, {}", job));
        }

        if attempts >= state.config.max_retries {
            return Ok(());
        }
    }
}

fn check_interrupted<R: CommandRunner>(state: &WorkerState<R>) -> Result<(), Quit> {
    if state.interrupt_flag.load(Ordering::SeqCst) {
        return Err(quit("interrupted", 130));
    }
    Ok(())
}
