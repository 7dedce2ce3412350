pub mod types;
pub mod config;
pub mod data;
pub mod geodesy;
pub mod neighbors;
pub mod coverage;
pub mod distribution;
pub mod treatment;
pub mod layers;
pub mod charts;
pub mod report;
pub mod dashboard_html;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use types::CountryScope;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print coverage metrics for one country or all of them
    Metrics {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Country to report on; omit for all countries
        #[arg(long)]
        country: Option<String>,
        /// Also print the per-country table
        #[arg(long)]
        breakdown: bool,
    },
    /// Print clinic and treatment summaries
    Analyze {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(long)]
        country: Option<String>,
    },
    /// Render static bar charts to the output directory
    Charts {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Metrics { config, country, breakdown } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let dataset = data::load_data(&app_config)?;

            let scope = CountryScope::from_selection(country.as_deref());
            let metrics = coverage::calculate_metrics(
                &dataset.clinics,
                &dataset.patients,
                &scope,
                &app_config.coverage,
            );
            print!("{}", report::metrics_report(&scope, &metrics));

            if *breakdown {
                let rows = coverage::country_breakdown(&dataset, &app_config.coverage);
                println!();
                print!("{}", report::breakdown_report(&rows));
            }
        }
        Commands::Analyze { config, country } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let dataset = data::load_data(&app_config)?;
            let scope = CountryScope::from_selection(country.as_deref());
            print!("{}", report::analysis_report(&dataset, &scope));
        }
        Commands::Charts { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let dataset = data::load_data(&app_config)?;
            let written = charts::generate_charts(&app_config, &dataset)?;
            for chart in &written {
                println!("{} -> {:?}", chart.title, app_config.output.chart_dir.join(&chart.file));
            }
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let dataset = data::load_data(&app_config)?;
            server::start_server(app_config, dataset).await?;
        }
    }

    Ok(())
}
