use std::fs;
use std::io::Write;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

fn taskfarmer_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_taskfarmer").expect("CARGO_BIN_EXE_taskfarmer")
}

#[test]
fn drains_the_job_file_and_abandons_failures() {
    let temp = tempfile::tempdir().expect("temp dir");
    let jobs = temp.path().join("jobs.txt");
    fs::write(&jobs, "echo a > a.log\nexit 1\necho c > c.log\n").expect("write jobs");

    let output = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(&jobs)
        .current_dir(temp.path())
        .output()
        .expect("run taskfarmer");

    assert!(
        output.status.success(),
        "expected exit 0, got {:?}, stderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        temp.path().join("a.log").exists(),
        "job before the failure should have run"
    );
    assert!(
        temp.path().join("c.log").exists(),
        "job after the failure should have run"
    );
    assert_eq!(
        fs::read_to_string(&jobs).expect("read jobs"),
        "",
        "the job file should be drained"
    );
}

#[test]
fn retry_runs_a_failing_job_exactly_max_retries_times() {
    let temp = tempfile::tempdir().expect("temp dir");
    let jobs = temp.path().join("jobs.txt");
    fs::write(&jobs, "echo attempt >> attempts.log; exit 1\n").expect("write jobs");

    let output = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(&jobs)
        .arg("-r")
        .arg("-m")
        .arg("3")
        .arg("-v")
        .current_dir(temp.path())
        .output()
        .expect("run taskfarmer");

    assert!(
        output.status.success(),
        "an abandoned job is not a process failure, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let attempts = fs::read_to_string(temp.path().join("attempts.log")).expect("read attempts");
    assert_eq!(
        attempts.lines().count(),
        3,
        "expected exactly three attempts, got:\n{attempts}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("(3/3)"),
        "final attempt should be reported against the budget, got:\n{stderr}"
    );
    assert_eq!(fs::read_to_string(&jobs).expect("read jobs"), "");
}

#[test]
fn verbose_mode_labels_status_lines_with_the_launcher_rank() {
    let temp = tempfile::tempdir().expect("temp dir");
    let jobs = temp.path().join("jobs.txt");
    fs::write(&jobs, "true\n").expect("write jobs");

    let output = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(&jobs)
        .arg("-v")
        .env("OMPI_COMM_WORLD_RANK", "3")
        .env("OMPI_COMM_WORLD_SIZE", "8")
        .current_dir(temp.path())
        .output()
        .expect("run taskfarmer");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("rank 0003"),
        "status lines should carry the zero-padded rank, got:\n{stdout}"
    );
    assert!(
        stdout.contains("worker 3 of 8 starting"),
        "startup line should label rank and world size, got:\n{stdout}"
    );
    assert!(
        stdout.contains("launching: true"),
        "each claimed job should be announced, got:\n{stdout}"
    );
    assert!(
        stdout.contains("job file is empty"),
        "normal termination should be announced, got:\n{stdout}"
    );
}

#[test]
fn silent_without_verbose() {
    let temp = tempfile::tempdir().expect("temp dir");
    let jobs = temp.path().join("jobs.txt");
    fs::write(&jobs, "exit 1\n").expect("write jobs");

    let output = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(&jobs)
        .current_dir(temp.path())
        .output()
        .expect("run taskfarmer");

    assert!(output.status.success());
    assert!(
        output.stdout.is_empty(),
        "non-verbose run should write nothing to stdout, got: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(
        output.stderr.is_empty(),
        "job failures should not be reported without -v, got: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn missing_job_file_is_a_fatal_configuration_error() {
    let temp = tempfile::tempdir().expect("temp dir");

    let output = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(temp.path().join("nope.txt"))
        .output()
        .expect("run taskfarmer");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Missing job file"),
        "expected a missing-file message, got:\n{stderr}"
    );
}

#[test]
fn invalid_options_exit_one_and_help_exits_zero() {
    let temp = tempfile::tempdir().expect("temp dir");
    let jobs = temp.path().join("jobs.txt");
    fs::write(&jobs, "").expect("write jobs");

    let output = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(&jobs)
        .arg("-w")
        .arg("-s")
        .arg("0")
        .output()
        .expect("run taskfarmer");
    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("Sleep time"),
        "zero sleep with wait-on-idle should be rejected"
    );

    let output = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(&jobs)
        .arg("-m")
        .arg("many")
        .output()
        .expect("run taskfarmer");
    assert_eq!(
        output.status.code(),
        Some(1),
        "non-numeric options are configuration errors"
    );

    let output = Command::new(taskfarmer_bin())
        .arg("--help")
        .output()
        .expect("run taskfarmer");
    assert_eq!(output.status.code(), Some(0));
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("job file"),
        "help text should describe the job file option"
    );
}

#[test]
fn wait_on_idle_picks_up_jobs_appended_later() {
    let temp = tempfile::tempdir().expect("temp dir");
    let jobs = temp.path().join("jobs.txt");
    fs::write(&jobs, "").expect("write jobs");

    let mut child = Command::new(taskfarmer_bin())
        .arg("-f")
        .arg(&jobs)
        .arg("-w")
        .arg("-s")
        .arg("1")
        .current_dir(temp.path())
        .spawn()
        .expect("spawn taskfarmer");

    // Append while the worker is asleep; redirection keeps the write atomic.
    thread::sleep(Duration::from_millis(300));
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&jobs)
        .expect("open jobs for append");
    file.write_all(b"echo late > late.log\n").expect("append job");
    drop(file);

    let late = temp.path().join("late.log");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !late.exists() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(100));
    }

    assert!(
        child.try_wait().expect("try_wait").is_none(),
        "an idle worker should keep polling, not exit"
    );
    child.kill().expect("kill worker");
    let _ = child.wait();

    assert!(
        late.exists(),
        "the appended job should run on the first check after waking"
    );
    assert_eq!(fs::read_to_string(&jobs).expect("read jobs"), "");
}
