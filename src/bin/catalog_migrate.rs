use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use product_catalog::{config, db, Migrator};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Apply, roll back and inspect catalog schema migrations
#[derive(Parser)]
#[command(name = "catalog-migrate", version)]
struct Cli {
    /// Overrides `database_url` from configuration
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Emit logs as JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations (one by default)
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop every table, then apply all migrations
    Fresh,
    /// Roll back all migrations, then apply them again
    Refresh,
    /// Roll back all migrations
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("failed to load catalog config")?;
    config::init_tracing(&cfg.log_level, cli.json || cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }
    // Never migrate implicitly here; the subcommand decides.
    cfg.auto_migrate = false;

    let pool = db::establish_connection_from_config(&cfg)
        .await
        .context("failed to connect to database")?;

    match cli.command {
        Commands::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("Migrations applied");
        }
        Commands::Down { steps } => {
            Migrator::down(&pool, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        Commands::Status => Migrator::status(&pool).await?,
        Commands::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("Schema recreated");
        }
        Commands::Refresh => {
            Migrator::refresh(&pool).await?;
            info!("Migrations refreshed");
        }
        Commands::Reset => {
            Migrator::reset(&pool).await?;
            info!("Migrations reset");
        }
    }

    Ok(())
}
