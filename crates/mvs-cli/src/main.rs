use clap::Parser;

mod cli;
mod commands;
mod demo;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
    commands::run_command(cli)
}
