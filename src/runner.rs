use std::process::Command;

/// Runs one claimed job and reports only whether it succeeded. Job text is
/// opaque to the worker; a line may chain several shell commands with `;`
/// and the shell's own sequencing rules apply.
pub(crate) trait CommandRunner {
    /// `Ok(true)` on zero exit status, `Ok(false)` on non-zero. `Err` means
    /// the shell itself could not be launched; callers treat that as a
    /// failed attempt, never as a process-level error.
    fn run(&self, command: &str) -> Result<bool, String>;
}

/// Executes jobs through `sh -c`, inheriting stdio so job output lands
/// wherever the job redirects it.
#[derive(Debug)]
pub(crate) struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<bool, String> {
        if command.is_empty() {
            // A blank job line is a claimable no-op.
            return Ok(true);
        }
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|err| format!("Failed to run command '{}': {}", command, err))?;
        Ok(status.success())
    }
}
