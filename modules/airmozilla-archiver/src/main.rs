use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use airmozilla_archiver::config::load_config;
use airmozilla_archiver::notify::{NoopBackend, NotifyBackend, SmtpMailer};
use airmozilla_archiver::{AppConfig, Archiver, ArchiverConfig, PgEventStore, Sweeper};
use vidly_client::VidlyClient;

#[derive(Parser)]
#[command(name = "archiver", about = "Reconcile pending events with Vid.ly")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "./config/archiver.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile every pending Vid.ly event once
    Sweep,
    /// Sweep repeatedly, sleeping the pester interval between passes
    Watch,
    /// Reconcile a single event
    Archive {
        event_id: i64,
    },
    /// List media known to Vid.ly
    Media,
    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Command::Media => list_media(&config).await?,
        Command::Migrate => {
            connect_store(&config).await?.migrate().await?;
            info!("Migrations applied");
        }
        Command::Sweep => {
            let archiver = build_archiver(&cli.config, &config).await?;
            let stats = Sweeper::new(archiver).run_once().await?;
            info!("Archiver complete. {stats}");
        }
        Command::Watch => {
            let archiver = build_archiver(&cli.config, &config).await?;
            Sweeper::new(archiver).watch().await?;
        }
        Command::Archive { event_id } => {
            let archiver = build_archiver(&cli.config, &config).await?;
            let outcome = archiver.archive_by_id(event_id).await?;
            info!(event_id, ?outcome, "Archive complete");
        }
    }

    Ok(())
}

async fn connect_store(config: &AppConfig) -> Result<PgEventStore> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;
    Ok(PgEventStore::new(pool))
}

async fn build_archiver(config_path: &Path, config: &AppConfig) -> Result<Archiver> {
    let file_config = load_config(config_path)?;
    let archiver_config = ArchiverConfig::try_from(&file_config)?;
    info!(
        administrators = archiver_config.administrators.len(),
        pester_interval_days = archiver_config.pester_interval.num_days(),
        marker = %archiver_config.provider_marker,
        "Archiver configured"
    );

    // SMTP if configured, otherwise Noop
    let notifier: Arc<dyn NotifyBackend> = match &config.smtp_host {
        Some(host) => {
            let credentials = config
                .smtp_username
                .clone()
                .zip(config.smtp_password.clone());
            info!(host = %host, "SMTP notifications enabled");
            Arc::new(SmtpMailer::new(
                host,
                config.smtp_port,
                credentials,
                &file_config.archiver.from_address,
            )?)
        }
        None => {
            info!("No SMTP_HOST set, notifications disabled");
            Arc::new(NoopBackend)
        }
    };

    let store = connect_store(config).await?;
    let vidly = VidlyClient::new(config.vidly_options())?;

    Ok(Archiver::new(
        archiver_config,
        Arc::new(vidly),
        Arc::new(store),
        notifier,
    ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn list_media(config: &AppConfig) -> Result<()> {
    let vidly = VidlyClient::new(config.vidly_options())?;
    for record in vidly.media_list().await? {
        println!(
            "{}\t{}\t{}",
            record.tag,
            record.status,
            record.updated.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
