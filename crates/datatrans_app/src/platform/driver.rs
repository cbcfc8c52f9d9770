//! Feeds user intent from the command line into the core, one view at a time.

use datatrans_core::{AppViewModel, ExportMode, JobStatus, Msg, PollPhase};

use crate::cli::{Commands, TranslateArgs};

/// What the run loop should do after looking at the latest view.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Dispatch these messages, in order. Never empty.
    Send(Vec<Msg>),
    /// Wait for the next engine completion.
    Wait,
    Finish,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Start,
    Uploading,
    Creating,
    Following(String),
    Downloading,
    Watching,
}

#[derive(Debug, Clone)]
struct TranslatePlan {
    path: String,
    fields: Vec<String>,
    custom_fields: Vec<String>,
    all_fields: bool,
    row_limit: Option<i64>,
    mode: ExportMode,
    target_lang: Option<String>,
    output_dir: Option<String>,
}

#[derive(Debug, Clone)]
enum Script {
    Jobs,
    Watch { job: Option<String> },
    Translate(TranslatePlan),
}

pub struct Driver {
    script: Script,
    stage: Stage,
}

impl Driver {
    pub fn new(command: &Commands) -> Self {
        let script = match command {
            Commands::Jobs => Script::Jobs,
            Commands::Watch { job } => Script::Watch { job: job.clone() },
            Commands::Translate(args) => Script::Translate(TranslatePlan::from_args(args)),
        };
        Self {
            script,
            stage: Stage::Start,
        }
    }

    pub fn step(&mut self, view: &AppViewModel) -> Step {
        match &self.script {
            Script::Jobs => jobs_step(view),
            Script::Watch { job } => {
                let job = job.clone();
                self.watch_step(job, view)
            }
            Script::Translate(plan) => {
                let plan = plan.clone();
                self.translate_step(&plan, view)
            }
        }
    }

    fn watch_step(&mut self, job: Option<String>, view: &AppViewModel) -> Step {
        let Some(job_id) = job else {
            return match &view.tracked {
                Some(tracked) if tracked.phase == PollPhase::Terminal => Step::Finish,
                None if view.directory_loaded => Step::Finish,
                _ => Step::Wait,
            };
        };
        // Only select a job the listing knows about.
        if !view.directory_loaded {
            return Step::Wait;
        }
        if !view.jobs.iter().any(|row| row.job_id == job_id) {
            return Step::Fail(format!("job {job_id} is not in this session's job list"));
        }
        if self.stage == Stage::Start {
            self.stage = Stage::Watching;
            return Step::Send(vec![Msg::JobSelected { job_id }]);
        }
        match &view.tracked {
            Some(tracked) if tracked.job_id == job_id && tracked.phase == PollPhase::Terminal => {
                Step::Finish
            }
            _ => Step::Wait,
        }
    }

    fn translate_step(&mut self, plan: &TranslatePlan, view: &AppViewModel) -> Step {
        match self.stage.clone() {
            Stage::Start => {
                self.stage = Stage::Uploading;
                Step::Send(vec![Msg::UploadRequested {
                    path: plan.path.clone(),
                }])
            }
            Stage::Uploading => {
                if let Some(err) = &view.upload.error {
                    return Step::Fail(format!("upload failed: {err}"));
                }
                if view.upload.pending || view.upload.file.is_none() {
                    return Step::Wait;
                }
                self.stage = Stage::Creating;
                match plan.configure(view) {
                    Ok(msgs) => Step::Send(msgs),
                    Err(message) => Step::Fail(message),
                }
            }
            Stage::Creating => {
                if let Some(message) = &view.validation {
                    return Step::Fail(message.clone());
                }
                if let Some(err) = &view.create_error {
                    return Step::Fail(format!("could not create job: {err}"));
                }
                match &view.last_created_job {
                    Some(job_id) if !view.create_pending => {
                        self.stage = Stage::Following(job_id.clone());
                        Step::Wait
                    }
                    _ => Step::Wait,
                }
            }
            Stage::Following(job_id) => {
                let Some(tracked) = view
                    .tracked
                    .as_ref()
                    .filter(|tracked| tracked.job_id == job_id)
                else {
                    return Step::Wait;
                };
                if tracked.phase != PollPhase::Terminal {
                    return Step::Wait;
                }
                match (tracked.status, &plan.output_dir) {
                    (Some(JobStatus::Failed), _) => Step::Fail(format!(
                        "job {job_id} failed: {}",
                        tracked.error_message.as_deref().unwrap_or("no details")
                    )),
                    (_, Some(output_dir)) => {
                        self.stage = Stage::Downloading;
                        Step::Send(vec![Msg::DownloadRequested {
                            output_dir: output_dir.clone(),
                        }])
                    }
                    _ => Step::Finish,
                }
            }
            Stage::Watching => Step::Wait,
            Stage::Downloading => {
                if let Some(err) = &view.download.error {
                    return Step::Fail(format!("download failed: {err}"));
                }
                if view.download.saved_path.is_some() {
                    Step::Finish
                } else {
                    Step::Wait
                }
            }
        }
    }
}

fn jobs_step(view: &AppViewModel) -> Step {
    if view.directory_loaded {
        return Step::Finish;
    }
    match &view.directory_error {
        Some(err) => Step::Fail(format!("could not list jobs: {err}")),
        None => Step::Wait,
    }
}

impl TranslatePlan {
    fn from_args(args: &TranslateArgs) -> Self {
        Self {
            path: args.file.display().to_string(),
            fields: args.fields.clone(),
            custom_fields: args.custom_fields.clone(),
            all_fields: args.all_fields,
            row_limit: args.row_limit,
            mode: args.mode.into(),
            target_lang: args.target_lang.clone(),
            output_dir: args.output.as_ref().map(|dir| dir.display().to_string()),
        }
    }

    /// Field and option messages for a fresh upload, ending with the start.
    fn configure(&self, view: &AppViewModel) -> Result<Vec<Msg>, String> {
        let mut msgs: Vec<Msg> = self
            .custom_fields
            .iter()
            .map(|path| Msg::CustomFieldAdded(path.clone()))
            .collect();

        if self.all_fields {
            msgs.push(Msg::SelectAllFields);
        } else if !self.fields.is_empty() {
            let offered: Vec<&str> = view.fields.iter().map(|f| f.path.as_str()).collect();
            if let Some(unknown) = self
                .fields
                .iter()
                .find(|path| !offered.contains(&path.as_str()) && !self.custom_fields.contains(path))
            {
                return Err(format!(
                    "field {unknown} is not offered by this file (available: {})",
                    offered.join(", ")
                ));
            }
            msgs.push(Msg::ClearFields);
            msgs.extend(
                self.fields
                    .iter()
                    .chain(self.custom_fields.iter())
                    .map(|path| Msg::FieldToggled {
                        path: path.clone(),
                        checked: true,
                    }),
            );
        }

        if let Some(limit) = self.row_limit {
            msgs.push(Msg::RowLimitChanged(limit));
        }
        msgs.push(Msg::ModeChanged(self.mode));
        if let Some(lang) = &self.target_lang {
            msgs.push(Msg::TargetLangChanged(lang.clone()));
        }
        msgs.push(Msg::StartClicked);
        Ok(msgs)
    }
}
