use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{REPORT_HISTORY_SHOWN, RUNS_INDEX_LIMIT};
use crate::error::HarnessError;

const RUNS_DIR: &str = "video-reports";
const RUNS_INDEX_FILE: &str = "runs-index.json";
const HTML_FILE: &str = "test-videos.html";
const MARKDOWN_FILE: &str = "test-videos.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Passed,
    Failed,
    Flaky,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Passed => "passed",
            EntryStatus::Failed => "failed",
            EntryStatus::Flaky => "flaky",
        }
    }
}

/// One test (or sweep item) in a run, with an optional recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEntry {
    pub name: String,
    pub status: EntryStatus,
    pub duration_secs: f64,
    pub project: String,
    pub video_path: Option<PathBuf>,
}

pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub entries: Vec<RunEntry>,
}

/// Rolling index entry for one archived run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedRun {
    pub run_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: f64,
    pub entry_count: usize,
    pub html_path: String,
}

pub struct ReportPaths {
    pub html: PathBuf,
    pub markdown: PathBuf,
    pub archive_dir: PathBuf,
}

impl RunReport {
    pub fn run_id(&self) -> String {
        format!("run-{}", self.started_at.format("%Y-%m-%dT%H-%M-%S"))
    }

    pub fn duration_secs(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Test Run Report\n");
        let _ = writeln!(
            md,
            "**Date:** {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(md, "**Duration:** {:.2}s\n", self.duration_secs());
        let _ = writeln!(md, "## Summary\n");
        let _ = writeln!(md, "- Total: {}", self.entries.len());
        let _ = writeln!(md, "- Passed: {}", self.count(EntryStatus::Passed));
        let _ = writeln!(md, "- Failed: {}", self.count(EntryStatus::Failed));
        let _ = writeln!(md, "- Flaky: {}\n", self.count(EntryStatus::Flaky));
        let _ = writeln!(md, "## Results\n");

        for entry in &self.entries {
            let marker = match entry.status {
                EntryStatus::Passed => "PASS",
                EntryStatus::Failed => "FAIL",
                EntryStatus::Flaky => "FLAKY",
            };
            let _ = writeln!(md, "### {} {}\n", marker, entry.name);
            let _ = writeln!(md, "- **Status:** {}", entry.status.as_str());
            let _ = writeln!(md, "- **Duration:** {:.2}s", entry.duration_secs);
            let _ = writeln!(md, "- **Project:** {}", entry.project);
            if let Some(video) = &entry.video_path {
                let shown = video.display();
                let _ = writeln!(md, "- **Video:** [{}]({})", shown, shown);
            }
            let _ = writeln!(md);
        }

        md
    }

    pub fn to_html(&self, previous_runs: &[IndexedRun]) -> String {
        let run_id = self.run_id();
        let mut html = String::new();

        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Test Run {run_id}</title>
<style>
body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; background: #f0f2f5; color: #333; padding: 20px; }}
.container {{ max-width: 1200px; margin: 0 auto; background: white; border-radius: 8px; padding: 30px; box-shadow: 0 2px 12px rgba(0,0,0,0.1); }}
.stats {{ display: flex; gap: 20px; margin: 20px 0; }}
.stat {{ flex: 1; text-align: center; padding: 15px; border-radius: 6px; background: #f8f9fa; }}
.stat .number {{ font-size: 2em; font-weight: bold; }}
.stat.passed .number {{ color: #28a745; }}
.stat.failed .number {{ color: #dc3545; }}
.stat.flaky .number {{ color: #ffc107; }}
.entry {{ border-left: 4px solid #ccc; padding: 10px 15px; margin: 10px 0; background: #f8f9fa; }}
.entry.passed {{ border-left-color: #28a745; }}
.entry.failed {{ border-left-color: #dc3545; }}
.entry.flaky {{ border-left-color: #ffc107; }}
.meta {{ color: #666; font-size: 0.85em; }}
.history {{ margin-top: 30px; border-top: 1px solid #dee2e6; padding-top: 15px; }}
a {{ color: #4a5fc1; }}
</style>
</head>
<body>
<div class="container">
<h1>Test Run Report</h1>
<p class="meta">Started {started} &bull; Duration {duration:.2}s &bull; Run ID <code>{run_id}</code></p>
<div class="stats">
<div class="stat"><div class="number">{total}</div><div>Total</div></div>
<div class="stat passed"><div class="number">{passed}</div><div>Passed</div></div>
<div class="stat failed"><div class="number">{failed}</div><div>Failed</div></div>
<div class="stat flaky"><div class="number">{flaky}</div><div>Flaky</div></div>
</div>
"#,
            run_id = run_id,
            started = self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            duration = self.duration_secs(),
            total = self.entries.len(),
            passed = self.count(EntryStatus::Passed),
            failed = self.count(EntryStatus::Failed),
            flaky = self.count(EntryStatus::Flaky),
        );

        // Failures first so a human triaging sees them without scrolling.
        for status in [EntryStatus::Failed, EntryStatus::Flaky, EntryStatus::Passed] {
            let entries: Vec<&RunEntry> =
                self.entries.iter().filter(|e| e.status == status).collect();
            if entries.is_empty() {
                continue;
            }
            let _ = write!(
                html,
                "<h2>{} ({})</h2>\n",
                capitalize(status.as_str()),
                entries.len()
            );
            for entry in entries {
                let _ = write!(
                    html,
                    r#"<div class="entry {status}"><strong>{name}</strong>
<div class="meta">{status} &bull; {duration:.2}s &bull; {project}</div>
"#,
                    status = status.as_str(),
                    name = escape_html(&entry.name),
                    duration = entry.duration_secs,
                    project = escape_html(&entry.project),
                );
                if let Some(video) = &entry.video_path {
                    let shown = video.display().to_string();
                    let _ = write!(
                        html,
                        "<a href=\"{}\" target=\"_blank\">Play video</a>\n",
                        escape_html(&shown)
                    );
                }
                let _ = write!(html, "</div>\n");
            }
        }

        if !previous_runs.is_empty() {
            let _ = write!(
                html,
                "<div class=\"history\"><h2>Previous Runs (last {})</h2>\n<ul>\n",
                previous_runs.len()
            );
            for run in previous_runs {
                let _ = write!(
                    html,
                    "<li><a href=\"{}\">{}</a> &mdash; {} entries, {:.2}s</li>\n",
                    escape_html(&run.html_path),
                    run.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
                    run.entry_count,
                    run.duration_secs,
                );
            }
            let _ = write!(html, "</ul></div>\n");
        }

        let _ = write!(
            html,
            "<p class=\"meta\">Generated {}</p>\n</div>\n</body>\n</html>\n",
            Utc::now().to_rfc3339()
        );

        html
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Link an entry to its recording under the external video directory, when
/// one exists. Recordings are named `<entry>.webm`; a missing file or an
/// unset directory yields no link rather than a dead one.
pub fn video_link(video_dir: Option<&Path>, name: &str) -> Option<PathBuf> {
    let path = video_dir?.join(format!("{}.webm", name));
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Write the HTML and Markdown reports (latest at the results root, an
/// archived copy per run) and roll the runs index forward.
pub fn write_reports(results_dir: &Path, report: &RunReport) -> Result<ReportPaths, HarnessError> {
    let run_id = report.run_id();
    let runs_dir = results_dir.join(RUNS_DIR);
    let archive_dir = runs_dir.join(&run_id);
    std::fs::create_dir_all(&archive_dir)?;

    let previous = load_runs_index(&runs_dir.join(RUNS_INDEX_FILE));
    let shown = &previous[..previous.len().min(REPORT_HISTORY_SHOWN)];

    let html = report.to_html(shown);
    let markdown = report.to_markdown();

    let html_path = results_dir.join(HTML_FILE);
    let markdown_path = results_dir.join(MARKDOWN_FILE);
    std::fs::write(&html_path, &html)?;
    std::fs::write(&markdown_path, &markdown)?;
    std::fs::write(archive_dir.join(HTML_FILE), &html)?;
    std::fs::write(archive_dir.join(MARKDOWN_FILE), &markdown)?;

    update_runs_index(
        results_dir,
        IndexedRun {
            run_id: run_id.clone(),
            start_time: report.started_at,
            end_time: report.ended_at,
            duration_secs: report.duration_secs(),
            entry_count: report.entries.len(),
            html_path: format!("{}/{}/{}", RUNS_DIR, run_id, HTML_FILE),
        },
    )?;

    info!(
        "Run report written: {} ({} entries)",
        html_path.display(),
        report.entries.len()
    );

    Ok(ReportPaths {
        html: html_path,
        markdown: markdown_path,
        archive_dir,
    })
}

/// Prepend this run to the rolling index, keeping the last 50.
pub fn update_runs_index(results_dir: &Path, run: IndexedRun) -> Result<PathBuf, HarnessError> {
    let runs_dir = results_dir.join(RUNS_DIR);
    std::fs::create_dir_all(&runs_dir)?;
    let index_path = runs_dir.join(RUNS_INDEX_FILE);

    let mut runs = load_runs_index(&index_path);
    runs.insert(0, run);
    runs.truncate(RUNS_INDEX_LIMIT);

    std::fs::write(&index_path, serde_json::to_string_pretty(&runs)?)?;
    Ok(index_path)
}

/// A missing or corrupt index starts over; history is best-effort.
pub fn load_runs_index(index_path: &Path) -> Vec<IndexedRun> {
    match std::fs::read_to_string(index_path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring corrupt runs index {}: {}", index_path.display(), e);
            Vec::new()
        }),
        Err(_) => Vec::new(),
    }
}
