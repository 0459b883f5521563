use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether storage is reachable, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage = state.config().storage.backend.as_str();
    match state.persistence().await {
        Some(persistence) => {
            if let Err(err) = persistence.health_check().await {
                warn!(error = %err, "storage health check failed");
                return HealthResponse::degraded(storage);
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded(storage)
    } else {
        HealthResponse::ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    #[tokio::test]
    async fn reports_degraded_without_storage() {
        let state = test_support::state();
        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.storage, "file");
    }

    #[tokio::test]
    async fn reports_ok_with_storage() {
        let state = test_support::memory_state().await;
        assert_eq!(health_status(&state).await.status, "ok");
    }
}
