use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(about = "Windspot CLI.")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the API and the static front end
    Http {
        #[arg(env = "WINDSPOT_SERVER_ADDRESS", default_value = "127.0.0.1:8000")]
        address: std::net::SocketAddr,
    },
    /// Fetch one day of station observations and print them as JSON
    Scrape {
        /// Day to scrape (inclusive)
        #[arg(long)]
        date: NaiveDate,
    },
}
