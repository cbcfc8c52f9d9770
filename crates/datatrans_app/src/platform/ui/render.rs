use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use datatrans_core::{
    FieldRowView, JobRowView, PollPhase, Preview, TrackedJobView, UploadedFileView,
};
use serde_json::Value;

const PREVIEW_COLUMNS: usize = 8;
const PREVIEW_ROWS: usize = 10;
const MAX_CELL_CHARS: usize = 40;
const MAX_RAW_PREVIEW: usize = 4096;
const TRUNCATED_MARKER: &str = "\n.[truncated]";

pub fn render_upload(file: &UploadedFileView) -> Vec<String> {
    let mut lines = vec![format!(
        "Uploaded file {} (format: {})",
        file.file_id,
        file.detected_format.as_str()
    )];
    lines.extend(render_preview(&file.preview));
    lines
}

fn render_preview(preview: &Preview) -> Vec<String> {
    match preview {
        Preview::Table { columns, rows } => {
            let columns: Vec<&String> = columns.iter().take(PREVIEW_COLUMNS).collect();
            let mut lines = vec![columns
                .iter()
                .map(|c| truncate_cell(c))
                .collect::<Vec<_>>()
                .join(" | ")];
            for row in rows.iter().take(PREVIEW_ROWS) {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| truncate_cell(&cell_text(row.get(c.as_str()))))
                    .collect();
                lines.push(cells.join(" | "));
            }
            lines
        }
        Preview::Raw { value } => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            truncate_raw(&pretty).lines().map(str::to_string).collect()
        }
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncate_cell(text: &str) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= MAX_CELL_CHARS {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(MAX_CELL_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

fn truncate_raw(text: &str) -> String {
    if text.len() <= MAX_RAW_PREVIEW {
        return text.to_string();
    }
    let mut end = MAX_RAW_PREVIEW;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATED_MARKER}", &text[..end])
}

pub fn render_fields(fields: &[FieldRowView]) -> Vec<String> {
    fields
        .iter()
        .map(|field| {
            let mark = if field.checked { "x" } else { " " };
            if field.custom {
                format!("[{mark}] {} (custom)", field.path)
            } else {
                format!("[{mark}] {}", field.path)
            }
        })
        .collect()
}

pub fn render_jobs(jobs: &[JobRowView]) -> Vec<String> {
    if jobs.is_empty() {
        return vec!["No jobs yet. Jobs you create will show up here.".to_string()];
    }
    jobs.iter().map(format_job_row).collect()
}

fn format_job_row(job: &JobRowView) -> String {
    let marker = if job.active { '*' } else { ' ' };
    let mut row = format!("{marker} {}  {:<9}", job.job_id, job.status.as_str());
    if !job.progress_text.is_empty() {
        row.push_str(&format!("  {}", job.progress_text));
    }
    if !job.filename.is_empty() {
        row.push_str(&format!("  file: {}", job.filename));
    }
    if !job.created_at.is_empty() {
        row.push_str(&format!("  {}", format_time(&job.created_at)));
    }
    row
}

pub fn render_tracked(job: &TrackedJobView) -> Vec<String> {
    let mut lines = Vec::new();
    let headline = match job.status {
        None => format!("Job {}: loading", job.job_id),
        Some(status) => {
            let mut line = format!(
                "Job {}: {} {}% ({}/{})",
                job.job_id,
                status.as_str(),
                job.progress_pct,
                job.done,
                job.total
            );
            if job.failed > 0 {
                line.push_str(&format!(", {} failed", job.failed));
            }
            line
        }
    };
    lines.push(headline);
    if let Some(message) = &job.error_message {
        lines.push(format!("  error: {message}"));
    }
    if let Some(message) = &job.fetch_error {
        lines.push(format!("  fetch failed: {message}"));
    }
    if job.phase == PollPhase::Terminal {
        if let Some(url) = &job.download_url {
            lines.push(format!("  download: {url}"));
        }
    }
    lines
}

/// Backend timestamp in local time; unparseable input is shown as is.
pub fn format_time(raw: &str) -> String {
    format_time_in(raw, &Local)
}

fn format_time_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        });
    match parsed {
        Ok(utc) => utc
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}
