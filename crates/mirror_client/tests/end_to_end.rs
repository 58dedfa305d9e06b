use std::sync::Arc;
use std::time::Duration;

use mirror_client::{
    PollOutcome, PollSettings, ReqwestArchiveService, ServiceSettings, Tracker,
};
use mirror_core::JobStatus;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn tracker_drives_real_http_service_to_completion() {
    mirror_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "download_id": "e2e" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "downloading",
            "progress": 10,
            "message": "Downloading site with wget...",
            "url": "https://other.example",
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "progress": 100,
            "message": "Site mirror complete!",
            "site_map": "downloads/e2e/site_map.md",
        })))
        .mount(&server)
        .await;

    let service = ReqwestArchiveService::new(ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    })
    .unwrap();
    let tracker = Tracker::new(
        Arc::new(service),
        PollSettings {
            interval: Duration::from_millis(20),
            ..PollSettings::default()
        },
    );

    tracker.start_job("https://example.com/page").await.unwrap();
    let outcomes = tracker.wait_idle().await;
    assert_eq!(
        outcomes,
        vec![("e2e".to_string(), PollOutcome::Terminal(JobStatus::Completed))]
    );

    let record = tracker.job("e2e").unwrap();
    assert_eq!(record.progress, 100);
    assert_eq!(record.message, "Site mirror complete!");
    assert_eq!(record.site_map.as_deref(), Some("downloads/e2e/site_map.md"));
    assert_eq!(record.url.as_deref(), Some("https://example.com/page"));
    assert_eq!(record.domain.as_deref(), Some("example.com"));

    let status_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/api/status/e2e")
        .count();
    assert_eq!(status_calls, 3);
}
