use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "lifeplan",
    about = "Household life-plan cashflow projector (monthly income, expenses, and balances to a target age)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    #[command(about = "Project a plan from a JSON payload file and print the monthly table")]
    Simulate {
        input: PathBuf,
        #[arg(long, help = "Only print the most recent N years of the projection")]
        recent_years: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = lifeplan::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Simulate {
            input,
            recent_years,
        } => {
            if let Err(msg) = lifeplan::api::run_simulate_file(&input, recent_years) {
                eprintln!("{msg}");
                std::process::exit(1);
            }
        }
    }
}
