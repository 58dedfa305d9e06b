use mirror_core::{reconcile, JobRecord, JobStatus, StatusFragment};
use pretty_assertions::assert_eq;

fn submitted() -> JobRecord {
    JobRecord::submitted("job-1", "https://example.com/page")
}

fn hostile_fragment() -> StatusFragment {
    StatusFragment {
        status: Some(JobStatus::Downloading),
        progress: Some(55),
        url: Some("https://elsewhere.test/other".into()),
        domain: Some("elsewhere.test".into()),
        ..StatusFragment::default()
    }
}

#[test]
fn fragment_fields_overwrite_and_absent_fields_survive() {
    let mut record = submitted();
    record.started_at = Some("2024-01-01T00:00:00Z".into());

    let merged = reconcile(
        &record,
        &StatusFragment {
            status: Some(JobStatus::Downloading),
            progress: Some(42),
            message: Some("fetching assets".into()),
            ..StatusFragment::default()
        },
    );

    assert_eq!(merged.progress, 42);
    assert_eq!(merged.message, "fetching assets");
    assert_eq!(merged.started_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    assert_eq!(merged.url.as_deref(), Some("https://example.com/page"));
    assert_eq!(merged.domain.as_deref(), Some("example.com"));
}

#[test]
fn url_and_domain_are_sticky_across_many_merges() {
    let mut record = submitted();
    for _ in 0..5 {
        record = reconcile(&record, &hostile_fragment());
        assert_eq!(record.url.as_deref(), Some("https://example.com/page"));
        assert_eq!(record.domain.as_deref(), Some("example.com"));
    }
}

#[test]
fn reconcile_is_idempotent() {
    let fragments = [
        StatusFragment::default(),
        hostile_fragment(),
        StatusFragment {
            status: Some(JobStatus::Completed),
            files: Some(vec!["index.html".into(), "style.css".into()]),
            completed_at: Some("2024-01-01T00:00:00Z".into()),
            ..StatusFragment::default()
        },
        StatusFragment {
            status: Some(JobStatus::Error),
            errors: Some(vec!["wget failed".into()]),
            ..StatusFragment::default()
        },
    ];
    for base in [submitted(), JobRecord::attached("job-2")] {
        for fragment in &fragments {
            let once = reconcile(&base, fragment);
            let twice = reconcile(&once, fragment);
            assert_eq!(once, twice);
        }
    }
}

#[test]
fn attached_record_takes_domain_from_fragment_url_not_fragment_domain() {
    let merged = reconcile(&JobRecord::attached("job-3"), &hostile_fragment());
    assert_eq!(merged.url.as_deref(), Some("https://elsewhere.test/other"));
    assert_eq!(merged.domain.as_deref(), Some("elsewhere.test"));

    let merged = reconcile(
        &JobRecord::attached("job-4"),
        &StatusFragment {
            domain: Some("given.example".into()),
            ..StatusFragment::default()
        },
    );
    assert_eq!(merged.url, None);
    assert_eq!(merged.domain.as_deref(), Some("given.example"));
}

#[test]
fn progress_regressions_pass_through() {
    let mut record = submitted();
    record.progress = 80;
    let merged = reconcile(
        &record,
        &StatusFragment {
            progress: Some(10),
            ..StatusFragment::default()
        },
    );
    assert_eq!(merged.progress, 10);
}
