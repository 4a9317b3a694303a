use clap::Parser;
use rebalancer::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
