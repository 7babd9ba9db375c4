use std::process::ExitCode;

mod app;
mod cli;
mod config;
mod logger;
mod queue;
mod runner;
mod worker;


fn main() -> ExitCode {
    app::main()
}
