use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

use pdv_cli::{Cli, Commands};

mod commands;

use commands::{compare, metrics, processors};

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Commands::Compare {
            config,
            output_dir,
            force,
        } => compare::handle(config, output_dir.as_deref(), *force),
        Commands::Metrics {
            processor,
            data_dir,
            force,
        } => metrics::handle(processor, data_dir, *force),
        Commands::Processors => processors::handle(),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
