use std::future::Future;

/// Resolves on the first SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("received SIGINT"),
        _ = terminate => log::info!("received SIGTERM"),
    }
}

/// Runs `work` unless `shutdown` fires first, in which case `work` is
/// dropped and `None` is returned.
pub async fn until_shutdown<T>(
    work: impl Future<Output = T>,
    shutdown: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        out = work => Some(out),
        _ = shutdown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::CrawlerConfig;
    use crate::crawler::CrawlerPool;

    #[tokio::test]
    async fn test_work_finishing_first_is_returned() {
        let out = until_shutdown(async { 42 }, std::future::pending()).await;
        assert_eq!(out, Some(42));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_pending_work() {
        let out = until_shutdown(
            tokio::time::sleep(Duration::from_secs(60)),
            tokio::time::sleep(Duration::from_millis(10)),
        )
        .await;
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn test_pool_is_closed_after_interrupted_work() {
        let pool = CrawlerPool::new(&CrawlerConfig::default()).unwrap();
        let out = until_shutdown(std::future::pending::<()>(), async {}).await;
        assert!(out.is_none());
        pool.close();
        assert!(pool.is_closed());
    }
}
