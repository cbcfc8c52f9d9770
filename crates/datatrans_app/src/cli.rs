use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use datatrans_core::ExportMode;

#[derive(Debug, Parser)]
#[command(name = "datatrans")]
#[command(about = "Upload data files, start translation jobs and follow their progress")]
pub struct Cli {
    /// Base URL of the translation backend
    #[arg(long, env = "DATATRANS_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    /// Directory holding the last viewed job and the session cookie
    #[arg(long, env = "DATATRANS_STATE_DIR", default_value = ".datatrans")]
    pub state_dir: PathBuf,

    /// Log file (defaults to ./datatrans.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Also log debug output to the terminal
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List the jobs of this session
    Jobs,
    /// Follow a job until it finishes
    Watch {
        /// Job to follow instead of the last viewed one
        #[arg(long)]
        job: Option<String>,
    },
    /// Upload a file and translate the selected fields
    Translate(TranslateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TranslateArgs {
    /// JSON, JSONL, CSV or XLSX file
    pub file: PathBuf,

    /// Field or column to translate (repeatable); defaults to the first candidate
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Extra field path not offered by the server (repeatable)
    #[arg(long = "custom-field")]
    pub custom_fields: Vec<String>,

    /// Translate every offered field
    #[arg(long, conflicts_with = "fields")]
    pub all_fields: bool,

    /// Number of rows to translate, clamped to 1..=5000
    #[arg(long, allow_negative_numbers = true)]
    pub row_limit: Option<i64>,

    #[arg(long, value_enum, default_value_t = ModeArg::AddColumns)]
    pub mode: ModeArg,

    /// Target language code
    #[arg(long)]
    pub target_lang: Option<String>,

    /// Save the finished export into this directory
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Keep source values and add translated columns
    AddColumns,
    /// Replace source values with translations
    Overwrite,
}

impl From<ModeArg> for ExportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::AddColumns => ExportMode::AddColumns,
            ModeArg::Overwrite => ExportMode::Overwrite,
        }
    }
}
