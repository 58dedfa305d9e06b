use mirror_core::{
    update, AppState, Effect, JobStatus, Msg, StatusFragment, StopReason, STARTING_MESSAGE,
};

fn init_logging() {
    mirror_logging::initialize_for_tests();
}

fn accept(state: AppState, job_id: &str, url: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::SubmitStarted);
    update(
        state,
        Msg::JobAccepted {
            job_id: job_id.to_string(),
            url: url.to_string(),
        },
    )
}

fn fetched(state: AppState, job_id: &str, fragment: StatusFragment) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusFetched {
            job_id: job_id.to_string(),
            fragment,
        },
    )
}

#[test]
fn accepted_submission_creates_downloading_record_and_starts_polling() {
    init_logging();
    let (mut state, effects) = accept(AppState::new(), "abc", "https://example.com/page");

    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            job_id: "abc".into()
        }]
    );
    let record = state.job("abc").expect("record");
    assert_eq!(record.url.as_deref(), Some("https://example.com/page"));
    assert_eq!(record.domain.as_deref(), Some("example.com"));
    assert_eq!(record.status, JobStatus::Downloading);
    assert_eq!(record.progress, 0);
    assert_eq!(record.message, STARTING_MESSAGE);
    assert!(!state.is_busy());
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn malformed_url_keeps_raw_string_as_domain() {
    let (state, _) = accept(AppState::new(), "abc", "not a url");
    let record = state.job("abc").unwrap();
    assert_eq!(record.url.as_deref(), Some("not a url"));
    assert_eq!(record.domain.as_deref(), Some("not a url"));
}

#[test]
fn busy_while_submissions_are_in_flight() {
    let (state, _) = update(AppState::new(), Msg::SubmitStarted);
    let (state, _) = update(state, Msg::SubmitStarted);
    assert!(state.is_busy());

    let (state, _) = update(
        state,
        Msg::SubmitFailed {
            message: "Failed to start download".into(),
        },
    );
    assert!(state.is_busy());

    let (state, _) = update(
        state,
        Msg::JobAccepted {
            job_id: "x".into(),
            url: "https://example.com".into(),
        },
    );
    assert!(!state.is_busy());
}

#[test]
fn abandoned_submission_clears_busy_without_registering() {
    let (state, _) = update(AppState::new(), Msg::SubmitStarted);
    let (state, effects) = update(state, Msg::SubmitAbandoned);

    assert!(effects.is_empty());
    assert!(!state.is_busy());
    assert!(state.registry().is_empty());
    assert_eq!(state.last_error(), None);
}

#[test]
fn failed_submission_records_message_and_no_job() {
    let (state, _) = update(AppState::new(), Msg::SubmitStarted);
    let (state, effects) = update(
        state,
        Msg::SubmitFailed {
            message: "Invalid URL".into(),
        },
    );

    assert!(effects.is_empty());
    assert!(state.registry().is_empty());
    assert_eq!(state.last_error(), Some("Invalid URL"));
    assert_eq!(state.view().last_error.as_deref(), Some("Invalid URL"));
}

#[test]
fn progress_then_completion_stops_polling() {
    let (state, _) = accept(AppState::new(), "abc", "https://example.com/page");

    let (state, effects) = fetched(
        state,
        "abc",
        StatusFragment {
            status: Some(JobStatus::Downloading),
            progress: Some(42),
            message: Some("fetching assets".into()),
            ..StatusFragment::default()
        },
    );
    assert!(effects.is_empty());
    let record = state.job("abc").unwrap();
    assert_eq!(record.progress, 42);
    assert_eq!(record.message, "fetching assets");
    assert_eq!(record.domain.as_deref(), Some("example.com"));

    let (state, effects) = fetched(
        state,
        "abc",
        StatusFragment {
            status: Some(JobStatus::Completed),
            files: Some(vec!["index.html".into(), "style.css".into()]),
            completed_at: Some("2024-01-01T00:00:00Z".into()),
            ..StatusFragment::default()
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StopPolling {
            job_id: "abc".into(),
            reason: StopReason::Terminal(JobStatus::Completed),
        }]
    );
    let record = state.job("abc").unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.files.as_ref().map(Vec::len), Some(2));
    assert_eq!(record.completed_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    assert_eq!(record.progress, 42);
}

#[test]
fn terminal_record_is_frozen() {
    let (state, _) = accept(AppState::new(), "abc", "https://example.com");
    let (state, _) = fetched(
        state,
        "abc",
        StatusFragment {
            status: Some(JobStatus::Error),
            errors: Some(vec!["wget failed with return code 8".into()]),
            ..StatusFragment::default()
        },
    );
    let frozen = state.job("abc").unwrap().clone();

    let (state, effects) = fetched(
        state,
        "abc",
        StatusFragment {
            status: Some(JobStatus::Downloading),
            progress: Some(99),
            ..StatusFragment::default()
        },
    );
    assert_eq!(state.job("abc"), Some(&frozen));
    assert_eq!(
        effects,
        vec![Effect::StopPolling {
            job_id: "abc".into(),
            reason: StopReason::Terminal(JobStatus::Error),
        }]
    );
}

#[test]
fn fetch_failure_leaves_record_untouched() {
    let (state, _) = accept(AppState::new(), "abc", "https://example.com");
    let (state, _) = fetched(
        state,
        "abc",
        StatusFragment {
            progress: Some(10),
            ..StatusFragment::default()
        },
    );
    let before = state.job("abc").unwrap().clone();

    let (state, effects) = update(
        state,
        Msg::StatusFetchFailed {
            job_id: "abc".into(),
            error: "network error".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::PollingAbandoned {
            job_id: "abc".into(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.job("abc"), Some(&before));
    assert_eq!(
        state.last_error(),
        Some("status poll for job abc failed: network error")
    );
    assert_eq!(before.status, JobStatus::Downloading);
    assert_eq!(before.progress, 10);
}

#[test]
fn fragments_for_unknown_jobs_stop_their_poller() {
    let (state, effects) = fetched(AppState::new(), "ghost", StatusFragment::default());
    assert!(state.registry().is_empty());
    assert_eq!(
        effects,
        vec![Effect::StopPolling {
            job_id: "ghost".into(),
            reason: StopReason::UnknownJob,
        }]
    );
}

#[test]
fn duplicate_ids_never_get_a_second_poller() {
    let (state, _) = accept(AppState::new(), "abc", "https://example.com/one");
    let (state, effects) = accept(state, "abc", "https://example.com/two");

    assert!(effects.is_empty());
    assert_eq!(state.registry().len(), 1);
    assert_eq!(
        state.job("abc").unwrap().url.as_deref(),
        Some("https://example.com/one")
    );
    assert!(state.last_error().unwrap().contains("already tracked"));
}

#[test]
fn attached_job_has_safe_defaults() {
    let (state, effects) = update(
        AppState::new(),
        Msg::AttachJob {
            job_id: "remote".into(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            job_id: "remote".into()
        }]
    );
    let record = state.job("remote").unwrap();
    assert_eq!(record.status, JobStatus::Downloading);
    assert_eq!(record.progress, 0);
    assert_eq!(record.url, None);
    assert_eq!(record.label(), "remote");
}

#[test]
fn view_lists_jobs_in_submission_order() {
    let (state, _) = accept(AppState::new(), "zzz", "https://b.example");
    let (state, _) = accept(state, "aaa", "https://a.example");
    let (state, _) = fetched(
        state,
        "zzz",
        StatusFragment {
            status: Some(JobStatus::Completed),
            ..StatusFragment::default()
        },
    );

    let view = state.view();
    let ids: Vec<_> = view.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["zzz", "aaa"]);
    assert_eq!(view.active_jobs, 1);
    assert!(view.dirty);
}
