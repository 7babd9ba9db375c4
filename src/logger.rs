use chrono::Utc;
use std::io::Write;

/// Rank-labelled status logging. Silent unless verbose mode is on; fatal
/// errors bypass this entirely and go straight to stderr.
#[derive(Debug)]
pub(crate) struct Logger {
    rank: u32,
    verbose: bool,
}

impl Logger {
    pub(crate) fn new(rank: u32, verbose: bool) -> Self {
        Self { rank, verbose }
    }

    /// Status lines go to stdout so schedulers can redirect them away from
    /// the jobs' own output (jobs are expected to redirect theirs).
    pub(crate) fn status(&self, message: &str) {
        if !self.verbose {
            return;
        }
        // Avoid `println!` so tests can reliably capture output via fd
        // redirection.
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(
            stdout,
            "{} {}",
            self.prefix(),
            sanitize_log_value(message)
        );
    }

    pub(crate) fn warn(&self, message: &str) {
        if !self.verbose {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{} Warning: {}",
            self.prefix(),
            sanitize_log_value(message)
        );
    }

    fn prefix(&self) -> String {
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        format!("{} rank {:04}", ts, self.rank)
    }
}

/// One job is always one log line, whatever the job text contains.
pub(crate) fn sanitize_log_value(value: &str) -> String {
    value
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
