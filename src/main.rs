use clap::Parser;
use tracing_subscriber::EnvFilter;

mod builds;
mod cli;
mod contigs;
mod dict;
mod error;
mod header;
mod samples;
mod sniff;
mod source;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("hts_probe=debug,info")
    } else {
        EnvFilter::new("hts_probe=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Dict(args) => {
            cli::dict::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Samples(args) => {
            cli::samples::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Contigs(args) => {
            cli::contigs::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Build(args) => {
            cli::build::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
