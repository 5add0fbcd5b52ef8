use microjob_core::enums::RegistryEvent;
use tokio::sync::broadcast;

/// Drains the registry event feed into the log.
pub async fn run_event_logger(mut rx: broadcast::Receiver<RegistryEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => log_event(&event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(missed = n, "event logger lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                break;
            }
        }
    }
}

fn log_event(event: &RegistryEvent) {
    match event {
        RegistryEvent::RewardReleased {
            job_id,
            worker,
            reward,
        } => {
            // Payout itself belongs to the wallet side.
            tracing::info!(%job_id, %worker, reward, "reward ready for payout");
        }
        RegistryEvent::ReviewResolved { job_id, status } => {
            tracing::info!(%job_id, %status, "review closed");
        }
        other => {
            tracing::debug!(job_id = %other.job_id(), event = ?other, "registry event");
        }
    }
}
