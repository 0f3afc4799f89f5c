use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;

const CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Background task that compacts the WAL once enough events pile up.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        if compact_if_needed(&engine, threshold).await {
            info!("WAL compacted (threshold {threshold})");
        }
    }
}

/// Returns true if a compaction ran and succeeded.
pub async fn compact_if_needed(engine: &Engine, threshold: u64) -> bool {
    let appends = engine.wal_appends_since_snapshot().await;
    if appends < threshold {
        return false;
    }
    match engine.compact_wal().await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("WAL compaction after {appends} appends failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NewHotel;
    use crate::notify::NotifyHub;
    use crate::payment::InMemoryPaymentGateway;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("hotelbook_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let path = test_wal_path("threshold.wal");
        let engine = Engine::new(
            path,
            Arc::new(InMemoryPaymentGateway::new(true)),
            Arc::new(NotifyHub::new()),
        )
        .unwrap();

        for i in 0..3 {
            engine
                .create_hotel(
                    "owner",
                    NewHotel {
                        name: format!("Hotel {i}"),
                        city: "Chiang Mai".into(),
                        country: "Thailand".into(),
                    },
                )
                .await
                .unwrap();
        }

        assert!(!compact_if_needed(&engine, 10).await);
        assert_eq!(engine.wal_appends_since_snapshot().await, 3);

        assert!(compact_if_needed(&engine, 3).await);
        assert_eq!(engine.wal_appends_since_snapshot().await, 0);
    }
}
