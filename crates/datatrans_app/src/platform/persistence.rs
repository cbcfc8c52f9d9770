use std::fs;
use std::path::{Path, PathBuf};

use datatrans_engine::FileStore;
use datatrans_logging::{dt_error, dt_info, dt_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".datatrans_state.ron";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct PersistedState {
    last_job_id: Option<String>,
    session_cookie: Option<String>,
}

/// Last viewed job and backend session cookie, kept across runs.
///
/// Every operation is best effort: unreadable state reads as empty and
/// failed writes are logged and otherwise ignored.
pub(crate) struct SelectionStore {
    dir: PathBuf,
    state: PersistedState,
}

impl SelectionStore {
    pub(crate) fn open(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            state: load_state(dir),
        }
    }

    pub(crate) fn last_job_id(&self) -> Option<String> {
        self.state.last_job_id.clone().filter(|id| !id.is_empty())
    }

    pub(crate) fn session_cookie(&self) -> Option<String> {
        self.state.session_cookie.clone()
    }

    pub(crate) fn set_last_job_id(&mut self, job_id: &str) {
        if self.state.last_job_id.as_deref() == Some(job_id) {
            return;
        }
        self.state.last_job_id = Some(job_id.to_string());
        self.save();
    }

    pub(crate) fn set_session_cookie(&mut self, cookie: Option<String>) {
        if cookie.is_none() || self.state.session_cookie == cookie {
            return;
        }
        self.state.session_cookie = cookie;
        self.save();
    }

    fn save(&self) {
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(&self.state, pretty) {
            Ok(text) => text,
            Err(err) => {
                dt_error!("Failed to serialize persisted state: {}", err);
                return;
            }
        };

        let written = FileStore::open(&self.dir)
            .and_then(|store| store.replace(STATE_FILENAME, content.as_bytes()));
        if let Err(err) = written {
            dt_warn!("Failed to write persisted state: {}", err);
        }
    }
}

fn load_state(dir: &Path) -> PersistedState {
    let path = dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PersistedState::default();
        }
        Err(err) => {
            dt_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return PersistedState::default();
        }
    };

    match ron::from_str(&content) {
        Ok(state) => {
            dt_info!("Loaded persisted state from {:?}", path);
            state
        }
        Err(err) => {
            dt_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            PersistedState::default()
        }
    }
}
