use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;

mod metrics;
mod seed;
mod setup;

use metrics::print_metrics;
use seed::seed_orders;
use setup::{handle_setup_command, SetupCommand};

/// Local maintenance commands for the order flow service. Every command works directly on the database at
/// `OFS_DATABASE_URL`, so the server does not need to be running.
#[derive(Parser, Debug)]
#[command(version = "0.1.0")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Database setup commands
    #[command(subcommand)]
    Setup(SetupCommand),
    /// Fill the database with randomly generated sample orders
    Seed(SeedParams),
    /// Print the order counts and the average processing time
    Metrics(MetricsParams),
}

#[derive(Debug, Args)]
pub struct SeedParams {
    /// The number of orders to create
    #[arg(short, long, default_value = "10")]
    pub count: usize,
}

#[derive(Debug, Args)]
pub struct MetricsParams {
    /// Print the metrics as JSON, in the same shape as the server's `/orders/metrics` endpoint
    #[arg(short, long)]
    pub json: bool,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    match cli.command {
        Command::Setup(command) => handle_setup_command(command).await,
        Command::Seed(params) => seed_orders(params).await,
        Command::Metrics(params) => print_metrics(params).await,
    }
}
