use crate::JobSummary;

/// Pick the job to watch from the directory and the persisted selection.
///
/// An explicit earlier choice wins while the directory still lists it; then
/// the first pending/running job; then the first job. The directory order is
/// the server's (most recent first) and is never re-sorted here.
pub fn resolve(persisted_id: Option<&str>, directory: &[JobSummary]) -> Option<String> {
    let first = directory.first()?;

    if let Some(id) = persisted_id.filter(|id| !id.is_empty()) {
        if directory.iter().any(|job| job.job_id() == id) {
            return Some(id.to_string());
        }
    }

    let in_flight = directory.iter().find(|job| job.status().is_active());
    Some(in_flight.unwrap_or(first).job_id().to_string())
}
