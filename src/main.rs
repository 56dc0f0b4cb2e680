use clap::Parser;
use cli::{Cli, Command};

mod cli;
mod config;
mod forecast;
mod observations;
mod server;
mod station;
mod tides;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();

    match args.cmd {
        Command::Http { address } => server::run(address).await,
        Command::Scrape { date } => {
            let source = station::StationSource::new(config::config());
            let set = observations::fetch_day(&source, date).await.unwrap();
            println!("{}", serde_json::to_string_pretty(&set).unwrap());
        }
    }
}
