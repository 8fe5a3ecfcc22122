use super::Orchestrator;
use crate::store::KvStore;
use core::time::Duration;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const LOG_TARGET: &str = " scheduler";

/// Runs a refresh cycle on a fixed period until stopped.
///
/// A cycle that is already running when [`Scheduler::stop`] is called finishes before `stop`
/// returns. Cycles never overlap: a tick that comes due while a cycle runs is delayed.
#[derive(Debug)]
pub struct Scheduler {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Runs the startup cycle, then starts the periodic timer.
    ///
    /// The startup cycle completes before this returns, so callers can serve reads right after.
    pub async fn start<S: KvStore>(orchestrator: Arc<Orchestrator<S>>, period: Duration, preload: bool) -> Self {
        let _ = orchestrator.warm_up(preload).await;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_timer(orchestrator, period, shutdown_rx));

        log::info!(target: LOG_TARGET, "Refresh timer started with period {}ms", period.as_millis());
        Self { shutdown, handle }
    }

    /// Stops the timer, waiting for an in-flight cycle to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            log::warn!(target: LOG_TARGET, "Refresh timer ended abnormally: {e}");
        }
        log::info!(target: LOG_TARGET, "Refresh timer stopped");
    }
}

async fn run_timer<S: KvStore>(orchestrator: Arc<Orchestrator<S>>, period: Duration, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        log::debug!(target: LOG_TARGET, "Refresh timer fired");
        let _ = orchestrator.run_cycle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sources::{Format, SourceDescriptor, SourceId, SourceKind, SourceRegistry};
    use crate::store::MemoryStore;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_stop_returns_promptly_when_idle() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), &Config::default(), SourceRegistry::from_descriptors([]), None).unwrap();
        let scheduler = Scheduler::start(Arc::new(orchestrator), Duration::from_secs(3600), false).await;

        tokio::time::timeout(Duration::from_secs(5), scheduler.stop()).await.unwrap();
    }

    #[tokio::test]
    async fn test_timer_refreshes_cleared_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/badges.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"1": [{"tooltip": "Donor", "badge": "/d.png"}]})))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/badges.json", server.uri())).unwrap();
        let registry = SourceRegistry::from_descriptors([SourceDescriptor::new(
            SourceId::ReviewDb,
            SourceKind::HttpJson { url, format: Format::Direct },
        )]);
        let orchestrator = Arc::new(Orchestrator::new(MemoryStore::new(), &Config::default(), registry, None).unwrap());

        let scheduler = Scheduler::start(Arc::clone(&orchestrator), Duration::from_millis(20), false).await;
        assert!(orchestrator.query().get_one(SourceId::ReviewDb).await.is_some());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);

        let _ = orchestrator.clear(None).await.unwrap();

        let refreshed = tokio::time::timeout(Duration::from_secs(5), async {
            while orchestrator.query().get_one(SourceId::ReviewDb).await.is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(refreshed.is_ok(), "timer did not rewrite the cache");
        assert!(server.received_requests().await.unwrap().len() >= 2);

        tokio::time::timeout(Duration::from_secs(5), scheduler.stop()).await.unwrap();
    }
}
