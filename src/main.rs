use clap::Parser;
use robotrader::cli::{run, Cli};
use robotrader::logger::setup_logger;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    setup_logger(if cli.verbose { "debug" } else { "info" });
    run(cli)
}
