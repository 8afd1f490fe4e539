use clap::Parser;
use eqindex::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
