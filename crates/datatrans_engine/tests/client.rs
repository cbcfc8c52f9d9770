use std::time::Duration;

use datatrans_engine::{
    ApiClient, ApiExportMode, ApiFileFormat, ApiJobStatus, ApiPreview, ClientSettings,
    CreateJobPayload, FailureKind, ReqwestApiClient,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestApiClient {
    ReqwestApiClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("client")
}

fn job_json(job_id: &str, status: &str) -> serde_json::Value {
    json!({
        "job_id": job_id,
        "file_id": "f1",
        "status": status,
        "mode": "add_columns",
        "target_lang": "zh-CN",
        "row_limit": 50,
        "selected_fields": ["name"],
        "progress_total": 4,
        "progress_done": 1,
        "progress_failed": 0,
        "error_message": null,
        "download_url": null
    })
}

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("name,desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file_id": "f1",
            "detected_format": "csv",
            "field_candidates": ["name", "desc"],
            "preview": {"type": "table", "columns": ["name", "desc"], "rows": [{"name": "a", "desc": "b"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempfile::TempDir::new().unwrap();
    let file = temp.path().join("items.csv");
    std::fs::write(&file, "name,desc\na,b\n").unwrap();

    let uploaded = client_for(&server).upload_file(&file).await.expect("upload ok");
    assert_eq!(uploaded.file_id, "f1");
    assert_eq!(uploaded.detected_format, ApiFileFormat::Csv);
    assert_eq!(uploaded.field_candidates, vec!["name", "desc"]);
    match uploaded.preview {
        ApiPreview::Table { columns, rows } => {
            assert_eq!(columns, vec!["name", "desc"]);
            assert_eq!(rows.len(), 1);
        }
        other => panic!("unexpected preview {other:?}"),
    }
}

#[tokio::test]
async fn upload_of_missing_file_is_a_local_error() {
    let server = MockServer::start().await;
    let temp = tempfile::TempDir::new().unwrap();

    let err = client_for(&server)
        .upload_file(&temp.path().join("absent.json"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::LocalFile);
}

#[tokio::test]
async fn create_job_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/jobs"))
        .and(body_json(json!({
            "file_id": "f1",
            "selected_fields": ["name", "meta.title"],
            "row_limit": 50,
            "mode": "overwrite",
            "target_lang": "ja"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job_id": "J1", "status": "pending"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let payload = CreateJobPayload {
        file_id: "f1".to_string(),
        selected_fields: vec!["name".to_string(), "meta.title".to_string()],
        row_limit: 50,
        mode: ApiExportMode::Overwrite,
        target_lang: "ja".to_string(),
    };
    let created = client_for(&server).create_job(&payload).await.expect("create ok");
    assert_eq!(created.job_id, "J1");
    assert_eq!(created.status, ApiJobStatus::Pending);
}

#[tokio::test]
async fn get_job_decodes_status_and_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/J1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("J1", "running")))
        .mount(&server)
        .await;

    let job = client_for(&server).get_job("J1").await.expect("job");
    assert_eq!(job.status, ApiJobStatus::Running);
    assert_eq!(job.mode, ApiExportMode::AddColumns);
    assert_eq!((job.progress_done, job.progress_total), (1, 4));
    assert_eq!(job.error_message, None);
}

#[tokio::test]
async fn list_jobs_passes_limit_and_offset() {
    let server = MockServer::start().await;
    let mut older = job_json("J1", "succeeded");
    older["download_url"] = json!("/api/v1/jobs/J1/download");
    older["filename"] = json!("items.csv");
    older["created_at"] = json!("2024-05-01T10:00:00Z");
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [job_json("J2", "pending"), older],
            "limit": 20,
            "offset": 40
        })))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client_for(&server).list_jobs(20, 40).await.expect("list");
    let ids: Vec<&str> = listing.jobs.iter().map(|item| item.job.job_id.as_str()).collect();
    assert_eq!(ids, vec!["J2", "J1"]);
    assert_eq!(listing.jobs[1].filename.as_deref(), Some("items.csv"));
    assert_eq!(
        listing.jobs[1].job.download_url.as_deref(),
        Some("/api/v1/jobs/J1/download")
    );
    assert_eq!(listing.jobs[0].created_at, None);
}

#[tokio::test]
async fn error_detail_becomes_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "job not found"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).get_job("missing").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.to_string(), "job not found");
}

#[tokio::test]
async fn empty_error_body_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/jobs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let payload = CreateJobPayload {
        file_id: "f1".to_string(),
        selected_fields: vec!["name".to_string()],
        row_limit: 1,
        mode: ApiExportMode::AddColumns,
        target_lang: "zh-CN".to_string(),
    };
    let err = client_for(&server).create_job(&payload).await.unwrap_err();
    assert_eq!(err.message, "request failed: 500");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/J1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_job("J1").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/J1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(job_json("J1", "running")),
        )
        .mount(&server)
        .await;

    let client = ReqwestApiClient::new(ClientSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .unwrap();
    let err = client.get_job("J1").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestApiClient::new(ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .err()
    .expect("invalid url");
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn session_cookie_is_kept_and_resent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs"))
        .and(header("cookie", "session=abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"jobs": [], "limit": 20, "offset": 0})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/J1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc; Path=/")
                .set_body_json(job_json("J1", "running")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.session_cookie(), None);
    client.get_job("J1").await.expect("job");
    assert_eq!(client.session_cookie().as_deref(), Some("session=abc"));
    client.list_jobs(20, 0).await.expect("cookie sent");

    // A new client seeded with the saved cookie resumes the session.
    let resumed = ReqwestApiClient::new(ClientSettings {
        base_url: server.uri(),
        session_cookie: Some("session=abc".to_string()),
        ..ClientSettings::default()
    })
    .unwrap();
    resumed.list_jobs(20, 0).await.expect("seeded cookie sent");
}

#[tokio::test]
async fn download_reads_suggested_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/J1/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"items_zh.csv\"")
                .set_body_bytes(b"name,name_zh\na,b\n".to_vec()),
        )
        .mount(&server)
        .await;

    let export = client_for(&server)
        .download("/api/v1/jobs/J1/download")
        .await
        .expect("download");
    assert_eq!(export.filename.as_deref(), Some("items_zh.csv"));
    assert_eq!(export.bytes, b"name,name_zh\na,b\n");
}
