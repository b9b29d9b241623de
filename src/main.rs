use std::process::ExitCode;

use clap::Parser;

use darknet_inferencer::cli::{Cli, execute, init_tracing};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}
