use chrono::{DateTime, FixedOffset, Utc};
use mirror_client::{DownloadSummary, HealthReport};
use mirror_core::{AppViewModel, JobRecord, JobStatus};

const BAR_WIDTH: usize = 20;

/// One status line per job, in submission order.
pub fn render(view: &AppViewModel, now: DateTime<Utc>) -> Vec<String> {
    let mut lines: Vec<String> = view.jobs.iter().map(|job| render_job(job, now)).collect();
    if view.busy {
        lines.push("Submitting...".to_string());
    }
    lines
}

pub fn render_job(job: &JobRecord, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{} {:>3}% {:<11} {}  {}",
        progress_bar(job.progress),
        job.progress,
        job.status.as_str(),
        job.label(),
        job.message
    );
    if let Some(elapsed) = elapsed(job, now) {
        line.push_str(&format!(" ({})", format_duration(elapsed)));
    }
    if let Some(method) = &job.download_method {
        line.push_str(&format!(" [{method}]"));
    }
    line
}

/// Detail lines printed once a job has finished.
pub fn render_outcome(job: &JobRecord) -> Vec<String> {
    let mut lines = Vec::new();
    match job.status {
        JobStatus::Completed => {
            let files = job.files.as_deref().unwrap_or_default();
            lines.push(format!("{} ({}) completed, {} file(s)", job.label(), job.id, files.len()));
            lines.extend(files.iter().map(|file| format!("  - {file}")));
            if let Some(warning) = &job.warning {
                lines.push(format!("  warning: {warning}"));
            }
        }
        JobStatus::Error => {
            lines.push(format!("{} ({}) failed: {}", job.label(), job.id, job.message));
            for error in job.errors.as_deref().unwrap_or_default() {
                lines.push(format!("  ! {error}"));
            }
        }
        JobStatus::Downloading => {
            lines.push(format!(
                "{} ({}) stopped updating at {}%: {}",
                job.label(),
                job.id,
                job.progress,
                job.message
            ));
        }
    }
    lines
}

pub fn render_summary(summary: &DownloadSummary) -> String {
    format!(
        "{}  {:<11} {:>3}%  {}  {}",
        summary.id,
        summary.status.as_deref().unwrap_or("unknown"),
        summary.progress.unwrap_or(0),
        summary.url.as_deref().unwrap_or("-"),
        summary.message.as_deref().unwrap_or("")
    )
}

pub fn render_health(report: &HealthReport) -> String {
    match (&report.wget_error, report.is_healthy()) {
        (_, true) => format!("service {}: wget available", report.status),
        (Some(error), false) => format!("service {}: {error}", report.status),
        (None, false) => format!("service {}", report.status),
    }
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn elapsed(job: &JobRecord, now: DateTime<Utc>) -> Option<chrono::Duration> {
    let started = parse_timestamp(job.started_at.as_deref()?)?;
    let end = match job.completed_at.as_deref().and_then(parse_timestamp) {
        Some(completed) => completed.with_timezone(&Utc),
        None => now,
    };
    let elapsed = end.signed_duration_since(started.with_timezone(&Utc));
    (elapsed >= chrono::Duration::zero()).then_some(elapsed)
}

// The service may send RFC 3339 or naive ISO-8601 (assumed UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

fn format_duration(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}
