use std::process::ExitCode;

use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let cli = repolink::cli::Cli::parse();
    repolink::init(cli.verbose);

    repolink::cli::run(cli)
}
