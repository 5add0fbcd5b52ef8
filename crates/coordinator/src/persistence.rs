use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use microjob_core::enums::RegistryEvent;
use microjob_core::job::Job;
use registry::JobRegistry;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::interval;

/// Load jobs from the snapshot file. Returns an empty list if the file
/// doesn't exist (first run).
pub fn load_jobs(path: &Path) -> std::io::Result<Vec<Job>> {
    let data = match std::fs::read_to_string(path) {
        Ok(d) if !d.trim().is_empty() => d,
        Ok(_) => return Ok(Vec::new()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(?path, "no snapshot found, starting with empty registry");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    // A corrupt snapshot is fatal: starting empty would hand out ids again.
    let jobs: Vec<Job> = serde_json::from_str(&data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    tracing::info!(?path, count = jobs.len(), "loaded job snapshot");
    Ok(jobs)
}

/// Persist every job as a JSON array.
pub fn save_jobs(path: &Path, registry: &JobRegistry) -> std::io::Result<()> {
    let data = serde_json::to_string_pretty(&registry.snapshot())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    // Write to a temp file then rename for atomicity.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Spawn a background task that snapshots the registry whenever a job is
/// created and at a fixed interval.
///
/// Creations are written out immediately so a restart never hands out an id
/// that was already issued. Other transitions ride on the interval: a crash
/// loses at most `period` worth of applies, submissions, votes, claims and
/// cancellations, and those jobs come back in their last saved state.
pub fn spawn_snapshot_task(registry: Arc<JobRegistry>, path: PathBuf, period: Duration) {
    let mut rx = registry.subscribe();
    tokio::spawn(async move {
        let mut tick = interval(period);
        tick.tick().await;
        loop {
            tokio::select! {
                _ = tick.tick() => {}
                event = rx.recv() => match event {
                    Ok(RegistryEvent::JobCreated { .. }) => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "snapshot task lagged behind events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
            if let Err(e) = save_jobs(&path, &registry) {
                tracing::warn!(error = %e, "failed to persist job snapshot");
            } else {
                tracing::debug!(count = registry.len(), "job snapshot written");
            }
        }
    });
}
