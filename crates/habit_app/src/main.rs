use clap::Parser;
use habit_app::app::AppConfig;
use habit_app::cli::{run, Cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to read habit dashboard configuration: {err:#}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cli, config).await {
        eprintln!("Failed to run habit dashboard: {err:#}");
        std::process::exit(1);
    }
}
