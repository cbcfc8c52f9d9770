use std::time::Duration;

use datatrans_core::{
    CreatedJob, DetectedFormat, Effect, ExportMode, JobDetail, JobRequest, JobStatus, JobSummary,
    Msg, Preview, Progress, UploadedFile,
};
use datatrans_engine::{
    ApiExportMode, ApiFileFormat, ApiJobStatus, ApiPreview, CreateJobPayload, EngineEvent,
    EngineHandle, JobListItem, JobStatusResponse, UploadResponse,
};
use datatrans_logging::{dt_debug, dt_info};

use super::persistence::SelectionStore;

/// Executes core effects against the engine and the selection store, and
/// turns engine completions back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    store: SelectionStore,
}

impl EffectRunner {
    pub(crate) fn new(engine: EngineHandle, store: SelectionStore) -> Self {
        Self { engine, store }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::UploadFile { path } => {
                    dt_info!("UploadFile path={}", path);
                    self.engine.upload(path);
                }
                Effect::CreateJob(request) => {
                    dt_info!(
                        "CreateJob file_id={} fields={} row_limit={}",
                        request.file_id,
                        request.selected_fields.len(),
                        request.row_limit
                    );
                    self.engine.create_job(map_request(request));
                }
                Effect::PersistSelection { job_id } => {
                    dt_debug!("PersistSelection job_id={}", job_id);
                    self.store.set_last_job_id(&job_id);
                }
                Effect::FetchDirectory {
                    request,
                    page,
                    delay,
                } => {
                    dt_debug!("FetchDirectory request={} delay={:?}", request, delay);
                    self.engine
                        .list_jobs(request, page.limit, page.offset, delay);
                }
                Effect::FetchJob {
                    job_id,
                    generation,
                    delay,
                } => {
                    dt_debug!(
                        "FetchJob job_id={} generation={} delay={:?}",
                        job_id,
                        generation,
                        delay
                    );
                    self.engine.fetch_job(job_id, generation, delay);
                }
                Effect::DownloadExport {
                    job_id,
                    download_url,
                    output_dir,
                } => {
                    dt_info!("DownloadExport job_id={} output_dir={}", job_id, output_dir);
                    self.engine.download(job_id, download_url, output_dir);
                }
            }
        }
    }

    /// Wait up to `timeout` for the next engine completion.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        self.store.set_session_cookie(self.engine.session_cookie());
        Some(map_event(event))
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Uploaded(result) => {
            Msg::UploadFinished(result.map(map_upload).map_err(|err| err.to_string()))
        }
        EngineEvent::JobCreated(result) => Msg::JobCreated(
            result
                .map(|created| CreatedJob {
                    job_id: created.job_id,
                    status: map_status(created.status),
                })
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::DirectoryLoaded { request, result } => Msg::DirectoryLoaded {
            request,
            result: result
                .map(|listing| listing.jobs.into_iter().map(map_summary).collect())
                .map_err(|err| err.to_string()),
        },
        EngineEvent::JobLoaded {
            job_id,
            generation,
            result,
        } => Msg::JobDetailLoaded {
            job_id,
            generation,
            result: result.map(map_detail).map_err(|err| err.to_string()),
        },
        EngineEvent::ExportSaved { result, .. } => Msg::DownloadFinished(
            result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
        ),
    }
}

fn map_request(request: JobRequest) -> CreateJobPayload {
    CreateJobPayload {
        file_id: request.file_id,
        selected_fields: request.selected_fields,
        row_limit: request.row_limit,
        mode: match request.mode {
            ExportMode::AddColumns => ApiExportMode::AddColumns,
            ExportMode::Overwrite => ApiExportMode::Overwrite,
        },
        target_lang: request.target_lang,
    }
}

fn map_upload(upload: UploadResponse) -> UploadedFile {
    UploadedFile {
        file_id: upload.file_id,
        detected_format: match upload.detected_format {
            ApiFileFormat::Json => DetectedFormat::Json,
            ApiFileFormat::Jsonl => DetectedFormat::Jsonl,
            ApiFileFormat::Csv => DetectedFormat::Csv,
            ApiFileFormat::Xlsx => DetectedFormat::Xlsx,
        },
        field_candidates: upload.field_candidates,
        preview: match upload.preview {
            ApiPreview::Table { columns, rows } => Preview::Table { columns, rows },
            ApiPreview::Json { value } => Preview::Raw { value },
        },
    }
}

fn map_status(status: ApiJobStatus) -> JobStatus {
    match status {
        ApiJobStatus::Pending => JobStatus::Pending,
        ApiJobStatus::Running => JobStatus::Running,
        ApiJobStatus::Succeeded => JobStatus::Succeeded,
        ApiJobStatus::Failed => JobStatus::Failed,
    }
}

fn map_detail(job: JobStatusResponse) -> JobDetail {
    JobDetail {
        job_id: job.job_id,
        file_id: job.file_id,
        status: map_status(job.status),
        mode: match job.mode {
            ApiExportMode::AddColumns => ExportMode::AddColumns,
            ApiExportMode::Overwrite => ExportMode::Overwrite,
        },
        target_lang: job.target_lang,
        row_limit: job.row_limit,
        selected_fields: job.selected_fields,
        progress: Progress {
            total: job.progress_total,
            done: job.progress_done,
            failed: job.progress_failed,
        },
        error_message: job.error_message.unwrap_or_default(),
        download_url: job.download_url.filter(|url| !url.is_empty()),
    }
}

fn map_summary(item: JobListItem) -> JobSummary {
    JobSummary {
        job: map_detail(item.job),
        filename: item.filename.unwrap_or_default(),
        created_at: item.created_at.unwrap_or_default(),
        updated_at: item.updated_at.unwrap_or_default(),
    }
}
