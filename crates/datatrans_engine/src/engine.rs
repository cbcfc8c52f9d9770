use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use datatrans_logging::{dt_debug, dt_info, dt_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, ClientSettings, ReqwestApiClient};
use crate::filename::export_filename;
use crate::persist::FileStore;
use crate::{ApiError, CreateJobPayload, EngineError, EngineEvent, FailureKind};

enum EngineCommand {
    Upload {
        path: PathBuf,
    },
    CreateJob {
        payload: CreateJobPayload,
    },
    ListJobs {
        request: u64,
        limit: u32,
        offset: u32,
        delay: Duration,
    },
    FetchJob {
        job_id: String,
        generation: u64,
        delay: Duration,
    },
    Download {
        job_id: String,
        download_url: String,
        output_dir: PathBuf,
    },
}

/// Runs backend calls on a private tokio runtime and reports completions as
/// [`EngineEvent`]s, in completion order.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    client: Arc<dyn ApiClient>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let client = ReqwestApiClient::new(settings)?;
        Self::with_client(Arc::new(client))
    }

    pub fn with_client(client: Arc<dyn ApiClient>) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new().map_err(EngineError::Runtime)?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker_client = client.clone();

        thread::spawn(move || {
            let mut detail_lane = DetailLane::default();
            while let Ok(command) = cmd_rx.recv() {
                let cancel = match &command {
                    EngineCommand::FetchJob {
                        job_id, generation, ..
                    } => match detail_lane.token_for(*generation) {
                        Some(token) => Some(token),
                        None => {
                            dt_debug!("Dropping superseded fetch job_id={job_id} generation={generation}");
                            continue;
                        }
                    },
                    _ => None,
                };
                let client = worker_client.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(client.as_ref(), command, cancel, event_tx).await;
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            client,
        })
    }

    pub fn upload(&self, path: impl Into<PathBuf>) {
        self.send(EngineCommand::Upload { path: path.into() });
    }

    pub fn create_job(&self, payload: CreateJobPayload) {
        self.send(EngineCommand::CreateJob { payload });
    }

    pub fn list_jobs(&self, request: u64, limit: u32, offset: u32, delay: Duration) {
        self.send(EngineCommand::ListJobs {
            request,
            limit,
            offset,
            delay,
        });
    }

    /// Fetch a job after `delay`. A fetch with a higher generation cancels
    /// every pending fetch of lower generations.
    pub fn fetch_job(&self, job_id: impl Into<String>, generation: u64, delay: Duration) {
        self.send(EngineCommand::FetchJob {
            job_id: job_id.into(),
            generation,
            delay,
        });
    }

    pub fn download(
        &self,
        job_id: impl Into<String>,
        download_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) {
        self.send(EngineCommand::Download {
            job_id: job_id.into(),
            download_url: download_url.into(),
            output_dir: output_dir.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn session_cookie(&self) -> Option<String> {
        self.client.session_cookie()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            dt_warn!("Engine worker is gone; command dropped");
        }
    }
}

/// Cancellation for the single tracked-job poll chain.
#[derive(Default)]
struct DetailLane {
    generation: u64,
    token: CancellationToken,
}

impl DetailLane {
    fn token_for(&mut self, generation: u64) -> Option<CancellationToken> {
        if generation < self.generation {
            return None;
        }
        if generation > self.generation {
            self.token.cancel();
            self.token = CancellationToken::new();
            self.generation = generation;
        }
        Some(self.token.clone())
    }
}

async fn handle_command(
    client: &dyn ApiClient,
    command: EngineCommand,
    cancel: Option<CancellationToken>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Upload { path } => {
            let result = client.upload_file(&path).await;
            if let Ok(upload) = &result {
                dt_info!(
                    "Uploaded {:?} file_id={} candidates={}",
                    path,
                    upload.file_id,
                    upload.field_candidates.len()
                );
            }
            EngineEvent::Uploaded(result)
        }
        EngineCommand::CreateJob { payload } => {
            let result = client.create_job(&payload).await;
            if let Ok(created) = &result {
                dt_info!("Created job {} for file {}", created.job_id, payload.file_id);
            }
            EngineEvent::JobCreated(result)
        }
        EngineCommand::ListJobs {
            request,
            limit,
            offset,
            delay,
        } => {
            tokio::time::sleep(delay).await;
            let result = client.list_jobs(limit, offset).await;
            EngineEvent::DirectoryLoaded { request, result }
        }
        EngineCommand::FetchJob {
            job_id,
            generation,
            delay,
        } => {
            let cancel = cancel.unwrap_or_default();
            let work = async {
                tokio::time::sleep(delay).await;
                client.get_job(&job_id).await
            };
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    dt_debug!("Cancelled fetch job_id={job_id} generation={generation}");
                    return;
                }
                result = work => result,
            };
            EngineEvent::JobLoaded {
                job_id,
                generation,
                result,
            }
        }
        EngineCommand::Download {
            job_id,
            download_url,
            output_dir,
        } => {
            let result = save_export(client, &job_id, &download_url, &output_dir).await;
            EngineEvent::ExportSaved { job_id, result }
        }
    };

    if let Some(failure) = describe_failure(&event) {
        dt_warn!("{failure}");
    }
    let _ = event_tx.send(event);
}

async fn save_export(
    client: &dyn ApiClient,
    job_id: &str,
    download_url: &str,
    output_dir: &Path,
) -> Result<PathBuf, ApiError> {
    let export = client.download(download_url).await?;
    let filename = export_filename(export.filename.as_deref(), job_id);
    let path = FileStore::open(output_dir)
        .and_then(|store| store.replace(&filename, &export.bytes))
        .map_err(|err| ApiError::new(FailureKind::LocalFile, err.to_string()))?;
    dt_info!("Saved export of job {} to {:?}", job_id, path);
    Ok(path)
}

fn describe_failure(event: &EngineEvent) -> Option<String> {
    let (what, err) = match event {
        EngineEvent::Uploaded(Err(err)) => ("upload".to_string(), err),
        EngineEvent::JobCreated(Err(err)) => ("create job".to_string(), err),
        EngineEvent::DirectoryLoaded {
            request,
            result: Err(err),
        } => (format!("list jobs (request {request})"), err),
        EngineEvent::JobLoaded {
            job_id,
            result: Err(err),
            ..
        } => (format!("get job {job_id}"), err),
        EngineEvent::ExportSaved {
            job_id,
            result: Err(err),
        } => (format!("download export of {job_id}"), err),
        _ => return None,
    };
    Some(format!("{what} failed: {err}"))
}
