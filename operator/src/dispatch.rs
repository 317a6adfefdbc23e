use crate::{DEFAULT_PEBBLE_BIN, DeferredStore, Error, HookTools, PebbleClient, Result, STATE_FILE};
use async_trait::async_trait;
use clap::Args;
use common::{
    CONTAINER_NAME, Disposition, Event, PeerRelationView, RawConfig, Reconciler, RoutePublisher, StatusReporter,
    ValidationPolicy, Workload, reconciler::PassInput, routing,
};
use std::path::PathBuf;

/// Everything the harness needs from the orchestrator besides the workload
#[async_trait]
pub trait Host: StatusReporter + RoutePublisher {
    fn app_name(&self) -> &str;
    async fn read_config(&self) -> Result<RawConfig>;
    async fn peer_view(&self) -> Result<PeerRelationView>;
    /// Publishes the static scrape job, if a scraper is related
    async fn register_metrics(&self) -> Result<()>;
}

/// One dispatch: wiring, deferred events oldest first, then `event`.
/// The caller persists `store` only when this succeeds.
pub async fn dispatch<H: Host>(
    event: &Event,
    host: &H,
    workload: &dyn Workload,
    store: &mut DeferredStore,
    policy: ValidationPolicy,
) -> Result<()> {
    let input = PassInput {
        config: host.read_config().await?,
        app_name: host.app_name().to_string(),
        peer: host.peer_view().await?,
    };
    let target = routing::resolve(&input.app_name, input.config.external_hostname(), &input.peer);
    host.publish_route(&target).await?;
    host.register_metrics().await?;

    let reco = Reconciler::new(workload, host, host, policy);
    for mut deferred in store.take() {
        tracing::info!(
            "re-emitting deferred {} (deferred {} times since {})",
            deferred.event,
            deferred.attempts + 1,
            deferred.deferred_at
        );
        if reco.handle(&deferred.event, &input).await? == Disposition::Defer {
            deferred.attempts += 1;
            store.requeue(deferred);
        }
    }
    tracing::debug!("handling {event}");
    if reco.handle(event, &input).await? == Disposition::Defer {
        tracing::info!("deferring {event}");
        store.defer(event, 0);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct Parameters {
    /// Hook to run, defaults to the basename of JUJU_DISPATCH_PATH
    #[arg(long = "hook", env = "JUJU_DISPATCH_PATH", value_name = "HOOK")]
    hook: Option<String>,
    /// Directory holding the deferred events
    #[arg(
        short = 's',
        long = "state-dir",
        env = "STATE_DIR",
        value_name = "STATE_DIR",
        default_value = "."
    )]
    state_dir: PathBuf,
    /// Where the Juju hook tools live, defaults to PATH lookup
    #[arg(long = "tools-dir", env = "JUJU_TOOLS_DIR", value_name = "TOOLS_DIR")]
    tools_dir: Option<PathBuf>,
    /// Pebble CLI binary
    #[arg(long = "pebble-bin", env = "PEBBLE_BIN", value_name = "PEBBLE_BIN", default_value = DEFAULT_PEBBLE_BIN)]
    pebble_bin: String,
    /// Pebble socket of the workload container
    #[arg(long = "pebble-socket", env = "PEBBLE_SOCKET", value_name = "PEBBLE_SOCKET")]
    pebble_socket: Option<PathBuf>,
    /// Which options must be set before the workload is configured
    #[arg(
        long = "validation-policy",
        env = "VALIDATION_POLICY",
        value_name = "POLICY",
        default_value = "all-required"
    )]
    validation_policy: ValidationPolicy,
}

pub async fn run(args: &Parameters) -> Result<()> {
    let hook = args
        .hook
        .clone()
        .ok_or_else(|| Error::MissingEnv("JUJU_DISPATCH_PATH".to_string()))?;
    let event = Event::from_dispatch_path(&hook);
    let tools = HookTools::from_env(args.tools_dir.clone())?;
    let socket = args
        .pebble_socket
        .clone()
        .unwrap_or_else(|| PebbleClient::default_socket(CONTAINER_NAME));
    let pebble = PebbleClient::new(&args.pebble_bin, &socket);
    let mut store = DeferredStore::load(&args.state_dir.join(STATE_FILE)).await?;
    tracing::info!(
        "dispatching {event} for {} ({} deferred)",
        tools.unit_name(),
        store.events().len()
    );
    dispatch(&event, &tools, &pebble, &mut store, args.validation_policy).await?;
    store.save().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{
        ReconciliationStatus, RouteTarget,
        workloadmock::{RouteMock, StatusMock, WorkloadMock},
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct HostMock {
        config: RawConfig,
        peer: PeerRelationView,
        status: StatusMock,
        routes: RouteMock,
        metrics: Mutex<u32>,
    }

    impl HostMock {
        fn with_config(webhook: &str, api: &str, org: &str) -> Self {
            Self {
                config: RawConfig {
                    github_webhook_token: Some(webhook.to_string()),
                    github_api_token: Some(api.to_string()),
                    github_org: Some(org.to_string()),
                    external_hostname: None,
                },
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl StatusReporter for HostMock {
        async fn set_status(&self, status: &ReconciliationStatus) -> Result<()> {
            self.status.set_status(status).await
        }

        async fn set_workload_version(&self, version: &str) -> Result<()> {
            self.status.set_workload_version(version).await
        }
    }

    #[async_trait]
    impl RoutePublisher for HostMock {
        async fn publish_route(&self, target: &RouteTarget) -> Result<()> {
            self.routes.publish_route(target).await
        }
    }

    #[async_trait]
    impl Host for HostMock {
        fn app_name(&self) -> &str {
            "gh-exporter"
        }

        async fn read_config(&self) -> Result<RawConfig> {
            Ok(self.config.clone())
        }

        async fn peer_view(&self) -> Result<PeerRelationView> {
            Ok(self.peer.clone())
        }

        async fn register_metrics(&self) -> Result<()> {
            *self.metrics.lock().unwrap() += 1;
            Ok(())
        }
    }

    async fn store() -> (tempfile::TempDir, DeferredStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DeferredStore::load(&dir.path().join(STATE_FILE)).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_wiring_publishes_route_and_metrics() {
        let host = HostMock::with_config("foo", "bar", "baz");
        let workload = WorkloadMock::connected();
        let (_dir, mut store) = store().await;
        let event = Event::from_hook_name("ingress-relation-joined");
        dispatch(&event, &host, &workload, &mut store, ValidationPolicy::AllRequired)
            .await
            .unwrap();
        assert_eq!(host.routes.published().len(), 1);
        assert_eq!(*host.metrics.lock().unwrap(), 1);
        assert!(host.status.history().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_config_is_deferred() {
        let host = HostMock::with_config("", "", "");
        let workload = WorkloadMock::connected();
        let (_dir, mut store) = store().await;
        dispatch(
            &Event::ConfigChanged,
            &host,
            &workload,
            &mut store,
            ValidationPolicy::AllRequired,
        )
        .await
        .unwrap();
        assert_eq!(host.status.current().unwrap().level(), "blocked");
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.events()[0].event, Event::ConfigChanged);
        assert!(workload.plans().is_empty());
    }

    #[tokio::test]
    async fn test_deferred_config_change_completes_after_pebble_ready() {
        let host = HostMock::with_config("foo", "bar", "baz");
        let workload = WorkloadMock::disconnected();
        let (_dir, mut store) = store().await;
        dispatch(
            &Event::ConfigChanged,
            &host,
            &workload,
            &mut store,
            ValidationPolicy::AllRequired,
        )
        .await
        .unwrap();
        assert_eq!(
            host.status.current(),
            Some(ReconciliationStatus::Waiting("Waiting for pebble".to_string()))
        );
        assert_eq!(store.events().len(), 1);

        workload.set_connected(true);
        let ready = Event::from_hook_name("github-actions-exporter-pebble-ready");
        dispatch(&ready, &host, &workload, &mut store, ValidationPolicy::AllRequired)
            .await
            .unwrap();
        assert!(store.is_empty());
        assert_eq!(host.status.current(), Some(ReconciliationStatus::Active));
        assert_eq!(workload.plans().len(), 2);
    }

    #[tokio::test]
    async fn test_redeferred_event_counts_attempts() {
        let host = HostMock::with_config("foo", "bar", "baz");
        let workload = WorkloadMock::disconnected();
        let (_dir, mut store) = store().await;
        for _ in 0..3 {
            dispatch(
                &Event::from_hook_name("update-status"),
                &host,
                &workload,
                &mut store,
                ValidationPolicy::AllRequired,
            )
            .await
            .unwrap();
        }
        assert!(store.is_empty());
        dispatch(
            &Event::ConfigChanged,
            &host,
            &workload,
            &mut store,
            ValidationPolicy::AllRequired,
        )
        .await
        .unwrap();
        for _ in 0..2 {
            dispatch(
                &Event::from_hook_name("update-status"),
                &host,
                &workload,
                &mut store,
                ValidationPolicy::AllRequired,
            )
            .await
            .unwrap();
        }
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.events()[0].attempts, 2);
    }

    #[tokio::test]
    async fn test_failed_pass_keeps_persisted_queue() {
        let host = HostMock::with_config("foo", "bar", "baz");
        let (dir, mut store) = store().await;
        store.defer(&Event::ConfigChanged, 0);
        store.save().await.unwrap();

        let workload = WorkloadMock::connected().failing_apply();
        assert!(
            dispatch(
                &Event::from_hook_name("update-status"),
                &host,
                &workload,
                &mut store,
                ValidationPolicy::AllRequired,
            )
            .await
            .is_err()
        );
        let reloaded = DeferredStore::load(&dir.path().join(STATE_FILE)).await.unwrap();
        assert_eq!(reloaded.events().len(), 1);
    }
}
