use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionStarted { persisted_job_id } => state.start_session(persisted_job_id),
        Msg::UploadRequested { path } => {
            let path = path.trim().to_string();
            if path.is_empty() {
                return (state, Vec::new());
            }
            state.begin_upload(path)
        }
        Msg::UploadFinished(result) => {
            state.finish_upload(result);
            Vec::new()
        }
        Msg::CustomFieldAdded(path) => {
            state.fields_mut().add_custom(&path);
            Vec::new()
        }
        Msg::FieldToggled { path, checked } => {
            state.fields_mut().toggle(&path, checked);
            Vec::new()
        }
        Msg::SelectAllFields => {
            state.fields_mut().select_all();
            Vec::new()
        }
        Msg::ClearFields => {
            state.fields_mut().clear_all();
            Vec::new()
        }
        Msg::RowLimitChanged(raw) => {
            state.set_row_limit(raw);
            Vec::new()
        }
        Msg::ModeChanged(mode) => {
            state.set_mode(mode);
            Vec::new()
        }
        Msg::TargetLangChanged(lang) => {
            state.set_target_lang(lang);
            Vec::new()
        }
        Msg::StartClicked => state.start_job(),
        Msg::JobCreated(result) => state.finish_create(result),
        Msg::JobSelected { job_id } => state.select_job(job_id),
        Msg::RefreshClicked => state.refresh_directory(),
        Msg::DirectoryLoaded { request, result } => state.apply_directory(request, result),
        Msg::JobDetailLoaded {
            job_id,
            generation,
            result,
        } => state.apply_detail(&job_id, generation, result),
        Msg::DownloadRequested { output_dir } => state.begin_download(output_dir),
        Msg::DownloadFinished(result) => {
            state.finish_download(result);
            Vec::new()
        }
    };

    (state, effects)
}
