use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

use crate::environment::Environment;
use crate::error::HarnessError;

/// Magic Suite regression harness: URL registry, session capture, sweeps.
#[derive(Parser, Debug, Clone)]
#[command(name = "ms-harness")]
pub struct CliArgs {
    /// Target environment (falls back to MS_ENV, then alpha2)
    #[arg(short = 'e', long = "env", global = true)]
    pub environment: Option<String>,

    /// Directory for captured session state files
    #[arg(long = "auth-dir", global = true)]
    pub auth_dir: Option<PathBuf>,

    /// Directory for sweep reports and run artifacts
    #[arg(long = "results-dir", global = true)]
    pub results_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve a (product, route) pair to a fully qualified URL
    Resolve {
        product: String,
        route: String,
        /// Resource id for routes like deviceById
        #[arg(long = "id")]
        id: Option<String>,
    },

    /// Print the curated deep-link enumeration for the environment
    Routes,

    /// Probe every curated deep link and assert aggregate reachability
    Sweep {
        /// Minimum fraction of reachable URLs for the sweep to pass
        #[arg(long = "threshold", default_value_t = SWEEP_SUCCESS_THRESHOLD)]
        threshold: f64,
    },

    /// Capture an authenticated session state for a role
    Login { role: String },

    /// Check a captured console log against the benign-noise allow-list
    ConsoleCheck { file: PathBuf },
}

pub struct HarnessConfig {
    pub environment: Environment,
    pub auth_dir: PathBuf,
    pub results_dir: PathBuf,
    pub video_dir: Option<PathBuf>,
}

// Environment variables
pub const ENV_VAR: &str = "MS_ENV";
pub const USERNAME_VARS: &[&str] = &["MS_TEST_USER", "MS_USERNAME"];
pub const PASSWORD_VARS: &[&str] = &["MS_TEST_PASSWORD", "MS_PASSWORD"];
pub const VIDEO_DIR_VAR: &str = "MS_VIDEO_DIR";
pub const ONEDRIVE_VARS: &[&str] = &["OneDrive", "OneDriveConsumer"];

// Canonical default environment. The historical per-file defaults drifted
// between alpha, test2 and alpha2; alpha2 is the one the consolidated auth
// setup and the deep-link sweep used.
pub const DEFAULT_ENVIRONMENT: Environment = Environment::Alpha2;

// Directory conventions
pub const DEFAULT_AUTH_DIR: &str = ".auth";
pub const DEFAULT_RESULTS_DIR: &str = "test-results";
pub const VIDEO_SUBDIR: &str = "MagicSuiteTestVideos";

// Domain constants
pub const ROOT_DOMAIN: &str = "magicsuite.net";

// Login constants
pub const MANUAL_LOGIN_TIMEOUT_SECS: u64 = 300; // 5 minutes for a human
pub const AUTO_LOGIN_STEP_DELAY_MS: u64 = 2000;

// Sweep constants
pub const SWEEP_SUCCESS_THRESHOLD: f64 = 0.90;
pub const SWEEP_PROBE_TIMEOUT_SECS: u64 = 10;

// Report constants
pub const RUNS_INDEX_LIMIT: usize = 50;
pub const REPORT_HISTORY_SHOWN: usize = 10;

impl HarnessConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self, HarnessError> {
        let environment = match &args.environment {
            Some(tag) => tag.parse()?,
            None => Environment::from_env()?,
        };

        Ok(HarnessConfig {
            environment,
            auth_dir: args
                .auth_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AUTH_DIR)),
            results_dir: args
                .results_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            video_dir: video_dir_from_env(),
        })
    }
}

/// External directory for run videos, kept out of the repository. `MS_VIDEO_DIR`
/// wins; otherwise a OneDrive root gets a `MagicSuiteTestVideos` subdirectory.
/// Absence disables video links, it is never an error.
pub fn video_dir_from_env() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(VIDEO_DIR_VAR) {
        return Some(PathBuf::from(dir));
    }

    for var in ONEDRIVE_VARS {
        if let Ok(root) = std::env::var(var) {
            return Some(PathBuf::from(root).join(VIDEO_SUBDIR));
        }
    }

    warn!(
        "No {} or OneDrive root set; video capture links are disabled",
        VIDEO_DIR_VAR
    );
    None
}
