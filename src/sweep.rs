use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::SWEEP_PROBE_TIMEOUT_SECS;
use crate::environment::Environment;
use crate::registry;

/// Outcome of probing one deep link. Transport failures are recorded as
/// status 0 rather than propagated; only the aggregate matters.
#[derive(Debug, Clone, Serialize)]
pub struct UrlCheck {
    pub name: String,
    pub url: String,
    pub ok: bool,
    pub status: u16,
    pub duration_secs: f64,
}

#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub environment: Environment,
    pub checks: Vec<UrlCheck>,
}

impl SweepReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.ok).count()
    }

    pub fn failed(&self) -> Vec<&UrlCheck> {
        self.checks.iter().filter(|c| !c.ok).collect()
    }

    pub fn success_rate(&self) -> f64 {
        if self.checks.is_empty() {
            return 1.0;
        }
        self.passed() as f64 / self.checks.len() as f64
    }

    pub fn meets_threshold(&self, threshold: f64) -> bool {
        self.success_rate() >= threshold
    }
}

pub fn probe_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(SWEEP_PROBE_TIMEOUT_SECS))
        .build()
        .expect("failed to build reqwest client")
}

/// Lightweight existence check: HEAD, default redirect handling, success is
/// any status below 400. Network failure reports (false, 0).
pub async fn check_url(client: &reqwest::Client, url: &str) -> (bool, u16) {
    match client.head(url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            (status < 400, status)
        }
        Err(_) => (false, 0),
    }
}

/// Probe every curated deep link for the environment, strictly in sequence.
/// Individual failures are logged and recorded, never fatal; callers assert
/// the aggregate threshold on the returned report.
pub async fn run_sweep(client: &reqwest::Client, env: Environment) -> SweepReport {
    let urls = registry::curated_urls(env);
    info!("Checking {} URLs for environment {}", urls.len(), env);

    let mut checks = Vec::with_capacity(urls.len());
    for (name, url) in urls {
        let started = Instant::now();
        let (ok, status) = check_url(client, &url).await;
        let duration_secs = started.elapsed().as_secs_f64();

        if ok {
            info!("{:<30} {} {}", name, status, url);
        } else {
            warn!("{:<30} {} {}", name, status, url);
        }

        checks.push(UrlCheck {
            name,
            url,
            ok,
            status,
            duration_secs,
        });
    }

    let report = SweepReport {
        environment: env,
        checks,
    };
    info!(
        "Sweep results: {}/{} URLs reachable",
        report.passed(),
        report.checks.len()
    );
    report
}
