use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use datatrans_core::{update, AppState, AppViewModel, Msg};
use datatrans_engine::{ClientSettings, EngineHandle};
use datatrans_logging::{dt_debug, dt_info, LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;

use super::driver::{Driver, Step};
use super::effects::EffectRunner;
use super::persistence::SelectionStore;
use super::ui::render;
use crate::cli::Cli;

const EVENT_WAIT: Duration = Duration::from_millis(250);

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    init_logging(&cli);

    let store = SelectionStore::open(&cli.state_dir);
    let persisted_job_id = store.last_job_id();
    let settings = ClientSettings {
        base_url: cli.api_url.clone(),
        session_cookie: store.session_cookie(),
        ..ClientSettings::default()
    };
    let engine = EngineHandle::new(settings)
        .with_context(|| format!("cannot use backend at {}", cli.api_url))?;
    dt_info!(
        "Session started api_url={} persisted_job_id={:?}",
        cli.api_url,
        persisted_job_id
    );

    let mut runner = EffectRunner::new(engine, store);
    let mut driver = Driver::new(&cli.command);
    let mut console = Console::default();
    let mut state = dispatch(
        AppState::new(),
        Msg::SessionStarted { persisted_job_id },
        &mut runner,
    );

    loop {
        let view = state.view();
        if state.consume_dirty() {
            console.show(&view);
        }

        match driver.step(&view) {
            Step::Send(msgs) => {
                for msg in msgs {
                    state = dispatch(state, msg, &mut runner);
                }
                continue;
            }
            Step::Wait => {}
            Step::Finish => {
                console.finish(&view);
                return Ok(());
            }
            Step::Fail(message) => bail!(message),
        }

        if let Some(msg) = runner.next_msg(EVENT_WAIT) {
            state = dispatch(state, msg, &mut runner);
        }
    }
}

fn dispatch(state: AppState, msg: Msg, runner: &mut EffectRunner) -> AppState {
    dt_debug!("Dispatch {:?}", msg);
    let (state, effects) = update(state, msg);
    runner.enqueue(effects);
    state
}

fn init_logging(cli: &Cli) {
    let path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    if cli.verbose {
        datatrans_logging::initialize(LogDestination::Both(path), LevelFilter::Debug);
    } else {
        datatrans_logging::initialize(LogDestination::File(path), LevelFilter::Info);
    }
}

/// Prints the parts of the view that changed since the last render.
#[derive(Default)]
struct Console {
    upload: Option<String>,
    fields: Vec<String>,
    jobs: Vec<String>,
    tracked: Vec<String>,
    directory_error: Option<String>,
    created: Option<String>,
}

impl Console {
    fn show(&mut self, view: &AppViewModel) {
        if let Some(file) = &view.upload.file {
            if self.upload.as_ref() != Some(&file.file_id) {
                self.upload = Some(file.file_id.clone());
                print_lines(&render::render_upload(file));
            }
        }

        if view.create_pending || view.last_created_job.is_some() {
            let fields = render::render_fields(&view.fields);
            if fields != self.fields {
                println!("Fields:");
                print_lines(&fields);
                self.fields = fields;
            }
        }

        if view.last_created_job != self.created {
            if let Some(job_id) = &view.last_created_job {
                println!("Created job {job_id}");
            }
            self.created = view.last_created_job.clone();
        }

        if view.directory_error != self.directory_error {
            if let Some(err) = &view.directory_error {
                println!("Job list unavailable: {err}");
            }
            self.directory_error = view.directory_error.clone();
        }

        if view.directory_loaded {
            let jobs = render::render_jobs(&view.jobs);
            if jobs != self.jobs {
                println!("Jobs:");
                print_lines(&jobs);
                self.jobs = jobs;
            }
        }

        let tracked = view
            .tracked
            .as_ref()
            .map(render::render_tracked)
            .unwrap_or_default();
        if tracked != self.tracked {
            print_lines(&tracked);
            self.tracked = tracked;
        }
    }

    fn finish(&mut self, view: &AppViewModel) {
        self.show(view);
        if let Some(path) = &view.download.saved_path {
            println!("Saved export to {path}");
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
