use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::LevelFilter;
use mirror_client::{ArchiveService, ArtifactKind, PollOutcome, ReqwestArchiveService, Tracker};
use mirror_core::{JobId, JobStatus};
use mirror_logging::{mirror_debug, mirror_error, mirror_warn};
use tokio::time;

use super::config::AppConfig;
use super::logging;
use super::{artifacts, render};
use crate::cli::{Cli, Command};

/// How often the job table is checked for changes while following jobs.
const RENDER_INTERVAL: Duration = Duration::from_millis(200);

pub fn run_app(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.api_url, cli.output_dir);
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log_destination, level);
    mirror_debug!("Effective config: {:?}", config);

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(execute(cli.command, &config))
}

async fn execute(command: Command, config: &AppConfig) -> Result<()> {
    let service = Arc::new(
        ReqwestArchiveService::new(config.service_settings())
            .with_context(|| format!("cannot use api base url {}", config.api_base_url))?,
    );

    match command {
        Command::Submit { urls, fetch } => {
            let tracker = new_tracker(&service, config);
            let mut started = 0usize;
            for url in urls.iter().map(|url| url.trim()).filter(|url| !url.is_empty()) {
                match tracker.start_job(url).await {
                    Ok(job_id) => {
                        println!("{url} -> job {job_id}");
                        started += 1;
                    }
                    Err(err) => eprintln!("{url}: {}", err.user_message()),
                }
            }
            if started == 0 {
                bail!("no job was started");
            }
            follow(&tracker, &service, config, fetch).await
        }
        Command::Attach { ids } => {
            let tracker = new_tracker(&service, config);
            for id in &ids {
                if !tracker.attach(id) {
                    mirror_warn!("Job {} listed twice; following it once", id);
                }
            }
            follow(&tracker, &service, config, None).await
        }
        Command::Fetch { id, kind } => {
            let path = artifacts::fetch_and_save(&service, &config.output_dir, &id, kind).await?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Grab { url } => {
            let url = url.trim();
            let artifact = service
                .download_in_memory(url)
                .await
                .with_context(|| format!("failed to mirror {url}"))?;
            let path = artifacts::save(&config.output_dir, &artifact)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::List => {
            let downloads = service.list_downloads().await.context("failed to list jobs")?;
            if downloads.is_empty() {
                println!("No downloads yet.");
            }
            for summary in &downloads {
                println!("{}", render::render_summary(summary));
            }
            Ok(())
        }
        Command::Sitemap { id } => {
            let content = service
                .site_map(&id)
                .await
                .with_context(|| format!("failed to fetch site map of job {id}"))?;
            print!("{content}");
            Ok(())
        }
        Command::Health => {
            let report = service.health().await.context("service did not answer")?;
            println!("{}", render::render_health(&report));
            if !report.is_healthy() {
                bail!("service is {}", report.status);
            }
            Ok(())
        }
    }
}

fn new_tracker(service: &Arc<ReqwestArchiveService>, config: &AppConfig) -> Tracker {
    let service: Arc<dyn ArchiveService> = service.clone();
    Tracker::new(service, config.poll_settings())
}

/// Prints job lines as they change until every poller has stopped, then the
/// outcome of each job. Optionally saves an artifact of completed jobs.
async fn follow(
    tracker: &Tracker,
    service: &ReqwestArchiveService,
    config: &AppConfig,
    fetch: Option<ArtifactKind>,
) -> Result<()> {
    let outcomes = watch(tracker, &mut |line| println!("{line}")).await;
    let mut outcomes: HashMap<JobId, PollOutcome> = outcomes.into_iter().collect();

    let mut unfinished = 0usize;
    let mut unsaved = 0usize;
    for job in tracker.view().jobs {
        let Some(outcome) = outcomes.remove(&job.id) else {
            continue;
        };
        for line in render::render_outcome(&job) {
            println!("{line}");
        }
        match outcome {
            PollOutcome::Terminal(JobStatus::Completed) => {
                let Some(kind) = fetch else {
                    continue;
                };
                match artifacts::fetch_and_save(service, &config.output_dir, &job.id, kind).await {
                    Ok(path) => println!("  saved {}", path.display()),
                    Err(err) => {
                        mirror_error!("Saving {} artifact of job {} failed: {:#}", kind, job.id, err);
                        eprintln!("  could not save {kind} artifact: {err:#}");
                        unsaved += 1;
                    }
                }
            }
            PollOutcome::FetchFailed { error, .. } => {
                eprintln!("  lost contact with the service: {error}");
                unfinished += 1;
            }
            _ => unfinished += 1,
        }
    }

    if unfinished > 0 || unsaved > 0 {
        bail!("{unfinished} job(s) did not complete, {unsaved} artifact(s) not saved");
    }
    Ok(())
}

/// Emits changed job lines until no poller is left, then once more for the
/// last merges, and returns how each poller ended.
async fn watch(tracker: &Tracker, emit: &mut impl FnMut(&str)) -> Vec<(JobId, PollOutcome)> {
    let mut ticker = time::interval(RENDER_INTERVAL);
    let mut printed: Vec<String> = Vec::new();
    loop {
        ticker.tick().await;
        emit_changes(tracker, &mut printed, &mut *emit);
        if tracker.active_pollers() == 0 {
            break;
        }
    }
    let outcomes = tracker.wait_idle().await;
    emit_changes(tracker, &mut printed, &mut *emit);
    outcomes
}

fn emit_changes(tracker: &Tracker, printed: &mut Vec<String>, emit: &mut impl FnMut(&str)) {
    let Some(view) = tracker.state().take_changes() else {
        return;
    };
    let lines = render::render(&view, Utc::now());
    for (index, line) in lines.iter().enumerate() {
        if printed.get(index) != Some(line) {
            emit(line.as_str());
        }
    }
    *printed = lines;
}
