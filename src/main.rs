//! ddns-sync - Dynamic DNS updater with convergence verification.

use clap::{Parser, Subcommand};
use ddns_sync::config::Config;
use ddns_sync::detector::IpDetector;
use ddns_sync::ipversion::IpVersion;
use ddns_sync::providers::{create_provider, Provider};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ddns-sync")]
#[command(about = "Dynamic DNS updater with convergence verification")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configured providers and the detected public IP
    Status,

    /// Update all DNS records once
    Update,

    /// Run as daemon (periodic check and update)
    Daemon {
        /// Check interval in seconds (defaults to the configured value)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Validate configuration
    Validate,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    // Default locations
    let candidates = [
        dirs::config_dir().map(|p| p.join("ddns-sync/config.toml")),
        Some(PathBuf::from("/etc/ddns-sync/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist
    dirs::config_dir()
        .map(|p| p.join("ddns-sync/config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}

/// Construct every configured provider, failing on the first invalid one.
fn build_providers(config: &Config) -> anyhow::Result<Vec<Box<dyn Provider>>> {
    let mut providers = Vec::with_capacity(config.providers.len());
    for provider_config in &config.providers {
        let provider = create_provider(provider_config).map_err(|e| {
            anyhow::anyhow!(
                "invalid {} configuration for {}: {}",
                provider_config.kind(),
                provider_config.record_name(),
                e
            )
        })?;
        providers.push(provider);
    }
    Ok(providers)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config_path = get_config_path(cli.config);
    let config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Status => cmd_status(config).await?,
        Commands::Update => cmd_update(config).await?,
        Commands::Daemon { interval } => cmd_daemon(config, interval).await?,
        Commands::Validate => cmd_validate(config)?,
    }

    Ok(())
}

async fn cmd_status(config: Config) -> anyhow::Result<()> {
    let detector = IpDetector::with_services(config.ip_services.clone());

    println!("ddns-sync Status");
    println!("================\n");

    let versions_in_use: Vec<IpVersion> = [IpVersion::Ipv4, IpVersion::Ipv6]
        .into_iter()
        .filter(|v| config.providers.iter().any(|p| p.ip_version() == *v))
        .collect();

    for version in versions_in_use {
        match detector.detect(version).await {
            Ok(ip) => println!("Current public {}: {}", version, ip),
            Err(e) => println!("Failed to detect {}: {}", version, e),
        }
    }

    println!("\nProviders:");
    println!("---------");

    for provider_config in &config.providers {
        match create_provider(provider_config) {
            Ok(provider) => println!(
                "  {} ({}): {}",
                provider.kind(),
                provider.record_name(),
                provider.ip_version()
            ),
            Err(e) => println!(
                "  {} ({}): invalid - {}",
                provider_config.kind(),
                provider_config.record_name(),
                e
            ),
        }
    }

    Ok(())
}

async fn cmd_update(config: Config) -> anyhow::Result<()> {
    let providers = build_providers(&config)?;
    if providers.is_empty() {
        println!("No providers configured.");
        return Ok(());
    }

    let detector = IpDetector::with_services(config.ip_services.clone());
    let client = http_client()?;

    let mut detected: HashMap<IpVersion, IpAddr> = HashMap::new();
    let mut failures = 0;

    for provider in &providers {
        let version = provider.ip_version();
        let ip = match detected.get(&version) {
            Some(ip) => *ip,
            None => {
                let ip = detector.detect(version).await?;
                println!("Current public {}: {}", version, ip);
                detected.insert(version, ip);
                ip
            }
        };

        print!("Updating {} ({})... ", provider.kind(), provider.record_name());

        match provider.update(&client, ip).await {
            Ok(confirmed) => println!("OK ({confirmed})"),
            Err(e) => {
                failures += 1;
                println!("FAILED: {e}");
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }

    Ok(())
}

async fn cmd_daemon(config: Config, interval: Option<u64>) -> anyhow::Result<()> {
    let providers = build_providers(&config)?;
    if providers.is_empty() {
        anyhow::bail!("no providers configured");
    }

    let interval = Duration::from_secs(interval.unwrap_or(config.check_interval_secs));
    let detector = IpDetector::with_services(config.ip_services.clone());
    let client = http_client()?;

    tracing::info!(
        "Starting ddns-sync daemon ({} providers, interval {}s)",
        providers.len(),
        interval.as_secs()
    );

    let mut last: HashMap<IpVersion, IpAddr> = HashMap::new();

    loop {
        for version in [IpVersion::Ipv4, IpVersion::Ipv6] {
            let targets: Vec<_> = providers
                .iter()
                .filter(|p| p.ip_version() == version)
                .collect();
            if targets.is_empty() {
                continue;
            }

            let current = match detector.detect(version).await {
                Ok(ip) => ip,
                Err(e) => {
                    tracing::warn!("Failed to detect {}: {}", version, e);
                    continue;
                }
            };

            if last.get(&version) == Some(&current) {
                continue;
            }

            tracing::info!("{} changed: {:?} -> {}", version, last.get(&version), current);

            let mut all_converged = true;
            for provider in &targets {
                match provider.update(&client, current).await {
                    Ok(confirmed) => {
                        tracing::info!(
                            "{} ({}): converged on {}",
                            provider.kind(),
                            provider.record_name(),
                            confirmed
                        );
                    }
                    Err(e) => {
                        all_converged = false;
                        tracing::error!(
                            "{} ({}): {}",
                            provider.kind(),
                            provider.record_name(),
                            e
                        );
                    }
                }
            }

            // Only remember the IP once every record converged, so failed
            // providers are retried on the next tick.
            if all_converged {
                last.insert(version, current);
            }
        }

        tokio::time::sleep(interval).await;
    }
}

fn cmd_validate(config: Config) -> anyhow::Result<()> {
    println!("Validating configuration...\n");

    let mut all_valid = true;

    for provider_config in &config.providers {
        print!(
            "  {} ({}): ",
            provider_config.kind(),
            provider_config.record_name()
        );

        match create_provider(provider_config) {
            Ok(_) => println!("OK"),
            Err(e) => {
                println!("FAILED - {e}");
                all_valid = false;
            }
        }
    }

    println!();

    if all_valid {
        println!("All providers validated successfully.");
    } else {
        println!("Some providers failed validation.");
        std::process::exit(1);
    }

    Ok(())
}
