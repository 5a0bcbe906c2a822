mod scrape;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bizscrape-cli")]
#[command(about = "Scrape services, contact details and FAQs from business websites")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a business website and persist the result
    Scrape {
        /// Business id as configured in the selectors file
        business_id: String,
    },
    /// Scrape without persisting; print the result and its validation report
    Check {
        /// Business id as configured in the selectors file
        business_id: String,
        /// Print compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = bizscrape_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = bizscrape_db::PoolConfig::from_app_config(&config);
    let pool = bizscrape_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Scrape { business_id } => {
            scrape::run_scrape(&config, pool, &business_id).await?;
        }
        Commands::Check {
            business_id,
            compact,
        } => {
            scrape::run_check(&config, pool, &business_id, compact).await?;
        }
        Commands::Migrate => {
            let applied = bizscrape_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations applied");
            println!("applied {applied} migration(s)");
        }
    }

    Ok(())
}
