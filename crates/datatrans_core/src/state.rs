use std::time::Duration;

use crate::resolve::resolve;
use crate::schedule::{detail_poll_delay, directory_poll_delay, DIRECTORY_POLL_INTERVAL};
use crate::view_model::{
    AppViewModel, DownloadView, FieldRowView, JobRowView, PollPhase, TrackedJobView,
    UploadView, UploadedFileView,
};
use crate::{
    clamp_row_limit, CreatedJob, Effect, ExportMode, FieldSelection, JobDetail, JobRequest,
    JobSummary, Page, RequestId, UploadedFile, ValidationError, DEFAULT_ROW_LIMIT,
    DEFAULT_TARGET_LANG,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ActionState {
    pending: bool,
    error: Option<String>,
}

impl ActionState {
    fn begin(&mut self) {
        self.pending = true;
        self.error = None;
    }

    fn finish(&mut self, error: Option<String>) {
        self.pending = false;
        self.error = error;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct JobOptions {
    row_limit: u32,
    mode: ExportMode,
    target_lang: String,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            mode: ExportMode::default(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
        }
    }
}

/// Last applied job listing plus request bookkeeping.
///
/// Only the most recently issued request may schedule a follow-up, so at most
/// one refresh chain is alive. A response older than the applied one is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct DirectoryCache {
    jobs: Vec<JobSummary>,
    loaded: bool,
    error: Option<String>,
    page: Page,
    last_issued: RequestId,
    last_applied: RequestId,
}

impl DirectoryCache {
    fn issue(&mut self, delay: Duration) -> Effect {
        self.last_issued += 1;
        Effect::FetchDirectory {
            request: self.last_issued,
            page: self.page,
            delay,
        }
    }
}

/// Detail poller for the effective job. `generation` changes with every
/// retarget and tags each fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct DetailTracker {
    job_id: Option<String>,
    generation: u64,
    detail: Option<JobDetail>,
    error: Option<String>,
}

impl DetailTracker {
    fn retarget(&mut self, job_id: Option<String>) -> Option<Effect> {
        self.generation += 1;
        self.detail = None;
        self.error = None;
        self.job_id = job_id;
        self.job_id.as_ref().map(|job_id| Effect::FetchJob {
            job_id: job_id.clone(),
            generation: self.generation,
            delay: Duration::ZERO,
        })
    }

    fn phase(&self) -> PollPhase {
        match (&self.job_id, &self.detail) {
            (None, _) => PollPhase::Idle,
            (Some(_), Some(detail)) if detail.status.is_terminal() => PollPhase::Terminal,
            (Some(_), _) => PollPhase::Polling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    uploaded: Option<UploadedFile>,
    fields: FieldSelection,
    options: JobOptions,
    upload: ActionState,
    create: ActionState,
    validation: Option<ValidationError>,
    last_created: Option<String>,
    /// Job the user asked for: restored, explicitly picked, or just created.
    selection: Option<String>,
    /// Last value handed to the selection store.
    last_written: Option<String>,
    /// Directory request issued right after a job was created. Write-back is
    /// held until a listing at least this fresh has been applied.
    awaiting_created: Option<RequestId>,
    directory: DirectoryCache,
    tracker: DetailTracker,
    download: ActionState,
    saved_export: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Job the detail poller is currently following.
    pub fn effective_job_id(&self) -> Option<&str> {
        self.tracker.job_id.as_deref()
    }

    pub fn fields(&self) -> &FieldSelection {
        &self.fields
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn start_session(&mut self, persisted: Option<String>) -> Vec<Effect> {
        let persisted = persisted.filter(|id| !id.is_empty());
        self.selection = persisted.clone();
        self.last_written = persisted;
        self.mark_dirty();
        vec![self.directory.issue(Duration::ZERO)]
    }

    pub(crate) fn begin_upload(&mut self, path: String) -> Vec<Effect> {
        if self.upload.pending {
            return Vec::new();
        }
        self.upload.begin();
        self.mark_dirty();
        vec![Effect::UploadFile { path }]
    }

    pub(crate) fn finish_upload(&mut self, result: Result<UploadedFile, String>) {
        match result {
            Ok(file) => {
                self.fields.reset(file.field_candidates.clone());
                self.uploaded = Some(file);
                self.validation = None;
                self.upload.finish(None);
            }
            Err(message) => self.upload.finish(Some(message)),
        }
        self.mark_dirty();
    }

    pub(crate) fn fields_mut(&mut self) -> &mut FieldSelection {
        self.mark_dirty();
        &mut self.fields
    }

    pub(crate) fn set_row_limit(&mut self, raw: i64) {
        self.options.row_limit = clamp_row_limit(raw);
        self.mark_dirty();
    }

    pub(crate) fn set_mode(&mut self, mode: ExportMode) {
        self.options.mode = mode;
        self.mark_dirty();
    }

    pub(crate) fn set_target_lang(&mut self, lang: String) {
        let lang = lang.trim();
        if !lang.is_empty() {
            self.options.target_lang = lang.to_string();
            self.mark_dirty();
        }
    }

    fn validate_start(&self) -> Result<JobRequest, ValidationError> {
        let uploaded = self.uploaded.as_ref().ok_or(ValidationError::NoFile)?;
        let selected_fields = self.fields.selected_fields();
        if selected_fields.is_empty() {
            return Err(ValidationError::NoFields);
        }
        if self.upload.pending || self.create.pending {
            return Err(ValidationError::Busy);
        }
        Ok(JobRequest {
            file_id: uploaded.file_id.clone(),
            selected_fields,
            row_limit: self.options.row_limit,
            mode: self.options.mode,
            target_lang: self.options.target_lang.clone(),
        })
    }

    pub(crate) fn start_job(&mut self) -> Vec<Effect> {
        self.mark_dirty();
        match self.validate_start() {
            Ok(request) => {
                self.validation = None;
                self.create.begin();
                vec![Effect::CreateJob(request)]
            }
            Err(err) => {
                self.validation = Some(err);
                Vec::new()
            }
        }
    }

    pub(crate) fn finish_create(&mut self, result: Result<CreatedJob, String>) -> Vec<Effect> {
        self.mark_dirty();
        let created = match result {
            Ok(created) => created,
            Err(message) => {
                self.create.finish(Some(message));
                return Vec::new();
            }
        };
        self.create.finish(None);
        let job_id = created.job_id;
        self.last_created = Some(job_id.clone());
        self.selection = Some(job_id.clone());
        self.last_written = Some(job_id.clone());

        // The listing does not know the new job yet; tracking and write-back
        // wait for one that does.
        let refresh = self.directory.issue(Duration::ZERO);
        self.awaiting_created = Some(self.directory.last_issued);

        vec![Effect::PersistSelection { job_id }, refresh]
    }

    /// Explicit choice: persisted right away, then resolution runs.
    pub(crate) fn select_job(&mut self, job_id: String) -> Vec<Effect> {
        if job_id.is_empty() {
            return Vec::new();
        }
        self.selection = Some(job_id.clone());
        self.last_written = Some(job_id.clone());
        self.awaiting_created = None;
        self.mark_dirty();
        let mut effects = vec![Effect::PersistSelection { job_id }];
        effects.extend(self.reconcile());
        effects
    }

    pub(crate) fn refresh_directory(&mut self) -> Vec<Effect> {
        vec![self.directory.issue(Duration::ZERO)]
    }

    pub(crate) fn apply_directory(
        &mut self,
        request: RequestId,
        result: Result<Vec<JobSummary>, String>,
    ) -> Vec<Effect> {
        let latest = request == self.directory.last_issued;
        let mut effects = Vec::new();
        match result {
            Ok(jobs) => {
                if request <= self.directory.last_applied {
                    return effects;
                }
                self.directory.jobs = jobs;
                self.directory.loaded = true;
                self.directory.error = None;
                self.directory.last_applied = request;
                if self.awaiting_created.is_some_and(|awaited| request >= awaited) {
                    self.awaiting_created = None;
                }
                self.mark_dirty();
                effects.extend(self.reconcile());
                if latest {
                    if let Some(delay) = directory_poll_delay(&self.directory.jobs) {
                        effects.push(self.directory.issue(delay));
                    }
                }
            }
            Err(message) => {
                if !latest {
                    return effects;
                }
                self.directory.error = Some(message);
                self.mark_dirty();
                // Keep retrying until a created job shows up in a listing; the
                // last good listing cannot know about it.
                let delay = if self.directory.loaded && self.awaiting_created.is_none() {
                    directory_poll_delay(&self.directory.jobs)
                } else {
                    Some(DIRECTORY_POLL_INTERVAL)
                };
                if let Some(delay) = delay {
                    effects.push(self.directory.issue(delay));
                }
            }
        }
        effects
    }

    pub(crate) fn apply_detail(
        &mut self,
        job_id: &str,
        generation: u64,
        result: Result<JobDetail, String>,
    ) -> Vec<Effect> {
        if generation != self.tracker.generation || self.tracker.job_id.as_deref() != Some(job_id)
        {
            return Vec::new();
        }
        match result {
            Ok(detail) => {
                self.tracker.detail = Some(detail);
                self.tracker.error = None;
            }
            Err(message) => self.tracker.error = Some(message),
        }
        self.mark_dirty();

        let status = self.tracker.detail.as_ref().map(|detail| detail.status);
        detail_poll_delay(status)
            .map(|delay| Effect::FetchJob {
                job_id: job_id.to_string(),
                generation,
                delay,
            })
            .into_iter()
            .collect()
    }

    pub(crate) fn begin_download(&mut self, output_dir: String) -> Vec<Effect> {
        if self.download.pending {
            return Vec::new();
        }
        self.mark_dirty();
        let ready = self.tracker.detail.as_ref().and_then(|detail| {
            detail
                .download_url
                .as_ref()
                .filter(|_| detail.status.is_terminal())
                .map(|url| (detail.job_id.clone(), url.clone()))
        });
        match ready {
            Some((job_id, download_url)) => {
                self.download.begin();
                self.saved_export = None;
                vec![Effect::DownloadExport {
                    job_id,
                    download_url,
                    output_dir,
                }]
            }
            None => {
                self.download.error = Some("export is not ready".to_string());
                Vec::new()
            }
        }
    }

    pub(crate) fn finish_download(&mut self, result: Result<String, String>) {
        match result {
            Ok(path) => {
                self.saved_export = Some(path);
                self.download.finish(None);
            }
            Err(message) => self.download.finish(Some(message)),
        }
        self.mark_dirty();
    }

    /// Recompute the effective job, retarget the poller when it changed and
    /// write the result back to the selection store.
    ///
    /// While a created job is awaited the listing predates it, so the poller
    /// stays on its current job instead of hopping to a fallback.
    fn reconcile(&mut self) -> Vec<Effect> {
        if self.awaiting_created.is_some() {
            return Vec::new();
        }
        let effective = resolve(self.selection.as_deref(), &self.directory.jobs);
        let mut effects = Vec::new();
        if effective != self.tracker.job_id {
            effects.extend(self.tracker.retarget(effective.clone()));
            self.mark_dirty();
        }
        if let Some(job_id) = effective {
            if self.last_written.as_ref() != Some(&job_id) {
                self.last_written = Some(job_id.clone());
                effects.push(Effect::PersistSelection { job_id });
            }
        }
        effects
    }

    pub fn view(&self) -> AppViewModel {
        let fields = self
            .fields
            .merged_fields()
            .into_iter()
            .map(|path| FieldRowView {
                checked: self.fields.is_selected(&path),
                custom: !self.fields.candidates().contains(&path),
                path,
            })
            .collect();

        let effective = self.tracker.job_id.as_deref();
        let jobs = self
            .directory
            .jobs
            .iter()
            .map(|summary| JobRowView {
                job_id: summary.job_id().to_string(),
                status: summary.status(),
                progress_text: progress_text(&summary.job),
                filename: summary.filename.clone(),
                created_at: summary.created_at.clone(),
                active: Some(summary.job_id()) == effective,
            })
            .collect();

        let tracked = self.tracker.job_id.as_ref().map(|job_id| {
            let detail = self.tracker.detail.as_ref();
            let progress = detail.map(|d| d.progress).unwrap_or_default();
            TrackedJobView {
                job_id: job_id.clone(),
                phase: self.tracker.phase(),
                status: detail.map(|d| d.status),
                progress_pct: progress.percent(),
                done: progress.done,
                total: progress.total,
                failed: progress.failed,
                error_message: detail
                    .map(|d| d.error_message.clone())
                    .filter(|message| !message.is_empty()),
                download_url: detail.and_then(|d| d.download_url.clone()),
                fetch_error: self.tracker.error.clone(),
            }
        });

        AppViewModel {
            upload: UploadView {
                pending: self.upload.pending,
                error: self.upload.error.clone(),
                file: self.uploaded.as_ref().map(|file| UploadedFileView {
                    file_id: file.file_id.clone(),
                    detected_format: file.detected_format,
                    preview: file.preview.clone(),
                }),
            },
            fields,
            row_limit: self.options.row_limit,
            mode: self.options.mode,
            target_lang: self.options.target_lang.clone(),
            can_start: self.validate_start().is_ok(),
            validation: self.validation.map(|err| err.to_string()),
            create_pending: self.create.pending,
            create_error: self.create.error.clone(),
            last_created_job: self.last_created.clone(),
            directory_loaded: self.directory.loaded,
            directory_error: self.directory.error.clone(),
            jobs,
            tracked,
            download: DownloadView {
                pending: self.download.pending,
                error: self.download.error.clone(),
                saved_path: self.saved_export.clone(),
            },
            dirty: self.dirty,
        }
    }
}

fn progress_text(job: &JobDetail) -> String {
    if job.progress.total == 0 {
        String::new()
    } else {
        format!("{}/{}", job.progress.done, job.progress.total)
    }
}
