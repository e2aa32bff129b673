mod auth;
mod config;
mod console_log;
mod environment;
mod error;
mod registry;
mod report;
mod resume;
mod sweep;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

use config::{CliArgs, Command, HarnessConfig};
use environment::{Product, Role};
use report::{EntryStatus, RunEntry, RunReport};
use resume::ResumeSignal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ms_harness=info".into()),
        )
        .init();

    let args = CliArgs::parse();
    let config = HarnessConfig::from_args(&args)?;
    info!(
        "ms-harness v{} (environment {})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    match args.command {
        Command::Resolve { product, route, id } => {
            let product: Product = product.parse()?;
            let url = registry::resolve(product, &route, config.environment, id.as_deref())?;
            println!("{}", url);
        }

        Command::Routes => {
            for (name, url) in registry::curated_urls(config.environment) {
                println!("{:<30} {}", name, url);
            }
        }

        Command::Sweep { threshold } => {
            let client = sweep::probe_client();
            let started_at = Utc::now();
            let sweep_report = sweep::run_sweep(&client, config.environment).await;
            let ended_at = Utc::now();

            for check in sweep_report.failed() {
                warn!("Failed: {} (status {})", check.url, check.status);
            }

            let run = RunReport {
                started_at,
                ended_at,
                entries: sweep_report
                    .checks
                    .iter()
                    .map(|check| RunEntry {
                        name: check.name.clone(),
                        status: if check.ok {
                            EntryStatus::Passed
                        } else {
                            EntryStatus::Failed
                        },
                        duration_secs: check.duration_secs,
                        project: format!("sweep-{}", config.environment),
                        video_path: report::video_link(config.video_dir.as_deref(), &check.name),
                    })
                    .collect(),
            };
            report::write_reports(&config.results_dir, &run)?;

            let rate = sweep_report.success_rate();
            if !sweep_report.meets_threshold(threshold) {
                error!(
                    "Sweep below threshold: {:.0}% reachable < {:.0}% required",
                    rate * 100.0,
                    threshold * 100.0
                );
                anyhow::bail!("deep-link sweep failed for {}", config.environment);
            }
            info!("Sweep passed: {:.0}% reachable", rate * 100.0);
        }

        Command::Login { role } => {
            let role: Role = role.parse()?;
            let mut surface = auth::HttpLoginSurface::new();
            info!("Waiting for manual login; press Enter here once signed in");
            let resume = ResumeSignal::from_stdin();
            let path = auth::capture_session_state(&mut surface, role, &config, resume).await?;
            println!("{}", path.display());
        }

        Command::ConsoleCheck { file } => {
            let unexpected = console_log::check_file(&file)?;
            if unexpected.is_empty() {
                info!("Console log is clean ({})", file.display());
            } else {
                for message in &unexpected {
                    error!("Unexpected console error: {}", message);
                }
                anyhow::bail!("{} console errors outside the allow-list", unexpected.len());
            }
        }
    }

    Ok(())
}
