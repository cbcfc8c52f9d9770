use std::sync::Once;

use datatrans_core::{
    update, AppState, DetectedFormat, Effect, ExportMode, JobRequest, Msg, Preview, UploadedFile,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(datatrans_logging::initialize_for_tests);
}

fn uploaded(candidates: &[&str]) -> UploadedFile {
    UploadedFile {
        file_id: "file-1".to_string(),
        detected_format: DetectedFormat::Csv,
        field_candidates: candidates.iter().map(|c| c.to_string()).collect(),
        preview: Preview::Table {
            columns: candidates.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        },
    }
}

fn with_upload(candidates: &[&str]) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::UploadRequested {
            path: "data.csv".to_string(),
        },
    );
    let (state, _) = update(state, Msg::UploadFinished(Ok(uploaded(candidates))));
    state
}

fn checked(state: &AppState) -> Vec<String> {
    state
        .view()
        .fields
        .into_iter()
        .filter(|row| row.checked)
        .map(|row| row.path)
        .collect()
}

#[test]
fn upload_request_emits_effect_and_marks_pending() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::UploadRequested {
            path: " data.csv ".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UploadFile {
            path: "data.csv".to_string()
        }]
    );
    assert!(state.view().upload.pending);
    assert!(state.consume_dirty());

    // A second request while the first is in flight is ignored.
    let (_state, effects) = update(
        state,
        Msg::UploadRequested {
            path: "other.csv".to_string(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn upload_seeds_fields_and_select_all() {
    init_logging();
    let state = with_upload(&["name", "desc"]);
    let view = state.view();
    assert!(!view.upload.pending);
    assert_eq!(
        view.upload.file.as_ref().map(|f| f.detected_format),
        Some(DetectedFormat::Csv)
    );
    assert_eq!(checked(&state), vec!["name"]);

    let (state, _) = update(state, Msg::SelectAllFields);
    assert_eq!(checked(&state), vec!["name", "desc"]);

    let (state, _) = update(state, Msg::ClearFields);
    assert!(checked(&state).is_empty());
    assert!(!state.view().can_start);
}

#[test]
fn custom_fields_are_merged_and_selected() {
    init_logging();
    let state = with_upload(&["name"]);
    let (state, _) = update(state, Msg::CustomFieldAdded("  nested.desc ".to_string()));
    let (state, _) = update(state, Msg::CustomFieldAdded("   ".to_string()));
    let (state, _) = update(state, Msg::CustomFieldAdded("name".to_string()));

    let view = state.view();
    let paths: Vec<_> = view.fields.iter().map(|row| row.path.as_str()).collect();
    assert_eq!(paths, vec!["name", "nested.desc"]);
    assert!(!view.fields[0].custom);
    assert!(view.fields[1].custom);
    assert_eq!(checked(&state), vec!["name", "nested.desc"]);

    let (state, _) = update(
        state,
        Msg::FieldToggled {
            path: "name".to_string(),
            checked: false,
        },
    );
    assert_eq!(checked(&state), vec!["nested.desc"]);
}

#[test]
fn failed_upload_keeps_previous_file() {
    init_logging();
    let state = with_upload(&["name"]);
    let (state, _) = update(
        state,
        Msg::UploadRequested {
            path: "broken.bin".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::UploadFinished(Err("unsupported".to_string())));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.upload.error.as_deref(), Some("unsupported"));
    assert_eq!(
        view.upload.file.map(|f| f.file_id),
        Some("file-1".to_string())
    );
    assert_eq!(checked(&state), vec!["name"]);
    assert!(view.can_start);
}

#[test]
fn start_without_upload_is_refused() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StartClicked);
    assert!(effects.is_empty());
    let view = state.view();
    assert!(!view.can_start);
    assert_eq!(view.validation.as_deref(), Some("upload a file first"));
}

#[test]
fn start_without_fields_is_refused() {
    init_logging();
    let state = with_upload(&[]);
    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
    assert_eq!(
        state.view().validation.as_deref(),
        Some("select at least one field")
    );
}

#[test]
fn start_emits_create_job_with_options() {
    init_logging();
    let state = with_upload(&["name", "desc"]);
    let (state, _) = update(state, Msg::SelectAllFields);
    let (state, _) = update(state, Msg::RowLimitChanged(99_999));
    let (state, _) = update(state, Msg::ModeChanged(ExportMode::Overwrite));
    assert_eq!(state.view().row_limit, 5000);

    let (state, effects) = update(state, Msg::StartClicked);
    assert_eq!(
        effects,
        vec![Effect::CreateJob(JobRequest {
            file_id: "file-1".to_string(),
            selected_fields: vec!["name".to_string(), "desc".to_string()],
            row_limit: 5000,
            mode: ExportMode::Overwrite,
            target_lang: "zh-CN".to_string(),
        })]
    );
    let view = state.view();
    assert!(view.create_pending);
    assert!(!view.can_start);

    // Double click while the create call is in flight.
    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
    assert_eq!(
        state.view().validation.as_deref(),
        Some("another request is still in progress")
    );
}

#[test]
fn create_failure_is_shown_and_allows_retry() {
    init_logging();
    let state = with_upload(&["name"]);
    let (state, _) = update(state, Msg::StartClicked);
    let (state, effects) = update(state, Msg::JobCreated(Err("file not found".to_string())));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.create_error.as_deref(), Some("file not found"));
    assert!(view.can_start);
    assert!(view.upload.file.is_some());

    let (_state, effects) = update(state, Msg::StartClicked);
    assert_eq!(effects.len(), 1);
}

#[test]
fn row_limit_defaults_and_clamps_low() {
    init_logging();
    let state = AppState::new();
    assert_eq!(state.view().row_limit, 50);
    let (state, _) = update(state, Msg::RowLimitChanged(0));
    assert_eq!(state.view().row_limit, 1);
}

#[test]
fn blank_target_lang_is_ignored() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::TargetLangChanged("ja".to_string()));
    let (state, _) = update(state, Msg::TargetLangChanged("  ".to_string()));
    assert_eq!(state.view().target_lang, "ja");
}
