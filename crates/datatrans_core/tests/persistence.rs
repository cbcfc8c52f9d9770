use std::time::Duration;

use datatrans_core::{
    update, AppState, CreatedJob, Effect, ExportMode, JobDetail, JobStatus, JobSummary, Msg, Page,
    Progress,
};

fn summary(job_id: &str, status: JobStatus) -> JobSummary {
    JobSummary {
        job: JobDetail {
            job_id: job_id.to_string(),
            file_id: "file-1".to_string(),
            status,
            mode: ExportMode::AddColumns,
            target_lang: "zh-CN".to_string(),
            row_limit: 50,
            selected_fields: vec!["name".to_string()],
            progress: Progress::default(),
            error_message: String::new(),
            download_url: None,
        },
        filename: "data.jsonl".to_string(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn persisted(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::PersistSelection { job_id } => Some(job_id.clone()),
            _ => None,
        })
        .collect()
}

fn start(persisted_job_id: Option<&str>) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::SessionStarted {
            persisted_job_id: persisted_job_id.map(str::to_string),
        },
    );
    state
}

fn load(state: AppState, request: u64, jobs: Vec<JobSummary>) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::DirectoryLoaded {
            request,
            result: Ok(jobs),
        },
    )
}

fn created(state: AppState, job_id: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::JobCreated(Ok(CreatedJob {
            job_id: job_id.to_string(),
            status: JobStatus::Pending,
        })),
    )
}

#[test]
fn restored_selection_survives_when_listed() {
    let state = start(Some("B"));
    let (state, effects) = load(
        state,
        1,
        vec![
            summary("A", JobStatus::Running),
            summary("B", JobStatus::Succeeded),
        ],
    );
    assert_eq!(state.effective_job_id(), Some("B"));
    assert!(persisted(&effects).is_empty());
}

#[test]
fn stale_restored_selection_is_overwritten() {
    let state = start(Some("J1"));
    let (state, effects) = load(
        state,
        1,
        vec![
            summary("A", JobStatus::Succeeded),
            summary("B", JobStatus::Running),
        ],
    );
    assert_eq!(state.effective_job_id(), Some("B"));
    assert_eq!(persisted(&effects), vec!["B"]);
}

#[test]
fn empty_directory_writes_nothing() {
    let state = start(Some("J1"));
    let (state, effects) = load(state, 1, Vec::new());
    assert_eq!(state.effective_job_id(), None);
    assert!(persisted(&effects).is_empty());
}

#[test]
fn created_job_is_persisted_immediately() {
    let state = start(None);
    let (state, _) = load(state, 1, vec![summary("A", JobStatus::Succeeded)]);

    let (state, effects) = created(state, "J1");
    assert_eq!(persisted(&effects), vec!["J1"]);
    // The listing is stale until the next refresh; the older job stays on screen.
    assert_eq!(state.effective_job_id(), Some("A"));
    assert!(effects.contains(&Effect::FetchDirectory {
        request: 2,
        page: Page::default(),
        delay: Duration::ZERO,
    }));
}

#[test]
fn created_job_missing_from_listing_falls_back_and_overwrites() {
    let state = start(None);
    let (state, _) = load(state, 1, vec![summary("A", JobStatus::Succeeded)]);
    let (state, _) = created(state, "J1");

    let (state, effects) = load(
        state,
        2,
        vec![
            summary("A", JobStatus::Succeeded),
            summary("C", JobStatus::Running),
        ],
    );
    assert_eq!(state.effective_job_id(), Some("C"));
    assert_eq!(persisted(&effects), vec!["C"]);
}

#[test]
fn created_job_missing_from_listing_with_same_fallback() {
    let state = start(None);
    let (state, _) = load(state, 1, vec![summary("A", JobStatus::Succeeded)]);
    let (state, _) = created(state, "J1");

    let (state, effects) = load(state, 2, vec![summary("A", JobStatus::Succeeded)]);
    assert_eq!(state.effective_job_id(), Some("A"));
    assert_eq!(persisted(&effects), vec!["A"]);
}

#[test]
fn created_job_listed_takes_over_without_extra_write() {
    let state = start(None);
    let (state, _) = load(state, 1, vec![summary("A", JobStatus::Succeeded)]);
    let (state, _) = created(state, "J1");

    let (state, effects) = load(
        state,
        2,
        vec![
            summary("J1", JobStatus::Pending),
            summary("A", JobStatus::Succeeded),
        ],
    );
    assert_eq!(state.effective_job_id(), Some("J1"));
    assert!(persisted(&effects).is_empty());
}

#[test]
fn listing_older_than_creation_does_not_release_write_back() {
    let state = start(None);
    // Scheduled refresh (request 2) is in flight when the job gets created.
    let (state, _) = load(state, 1, vec![summary("A", JobStatus::Running)]);
    let (state, _) = created(state, "J1");

    let (state, effects) = load(state, 2, vec![summary("A", JobStatus::Running)]);
    assert!(persisted(&effects).is_empty());

    let (state, effects) = load(state, 3, vec![summary("J1", JobStatus::Pending)]);
    assert_eq!(state.effective_job_id(), Some("J1"));
    assert!(persisted(&effects).is_empty());
}
