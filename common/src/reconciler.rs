use crate::{
    CONTAINER_NAME, ConfigurationSnapshot, Event, PeerRelationView, RawConfig, ReconciliationStatus, Result,
    RoutePublisher, StatusReporter, SupervisorPlan, ValidationPolicy, routing, version,
};
use async_trait::async_trait;

/// Runs commands inside the workload container
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs `command` as `user` and returns its standard output
    async fn exec(&self, command: &[String], user: &str) -> Result<String>;
}

/// The process supervisor of the workload container
#[async_trait]
pub trait Workload: Executor {
    async fn can_connect(&self) -> bool;
    /// Overwrites the layer with `plan` and restarts whatever changed
    async fn replace_plan(&self, plan: &SupervisorPlan) -> Result<()>;
}

/// What the harness must do with the event once a pass is over
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Done,
    Defer,
}

/// State read by the harness for one reconciliation pass
#[derive(Clone, Debug, Default)]
pub struct PassInput {
    pub config: RawConfig,
    pub app_name: String,
    pub peer: PeerRelationView,
}

pub struct Reconciler<'a> {
    workload: &'a dyn Workload,
    status: &'a dyn StatusReporter,
    routes: &'a dyn RoutePublisher,
    policy: ValidationPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        workload: &'a dyn Workload,
        status: &'a dyn StatusReporter,
        routes: &'a dyn RoutePublisher,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            workload,
            status,
            routes,
            policy,
        }
    }

    pub async fn handle(&self, event: &Event, input: &PassInput) -> Result<Disposition> {
        match event {
            Event::WorkloadReady { container } if container == CONTAINER_NAME => {
                self.on_workload_ready(input).await
            }
            Event::ConfigChanged => self.on_config_changed(input).await,
            other => {
                tracing::debug!("nothing to reconcile for {other}");
                Ok(Disposition::Done)
            }
        }
    }

    async fn on_workload_ready(&self, input: &PassInput) -> Result<Disposition> {
        let snap = match ConfigurationSnapshot::load(&input.config, self.policy) {
            Ok(snap) => snap,
            Err(e) => {
                tracing::warn!("not starting {CONTAINER_NAME}: {e}");
                self.status.set_status(&ReconciliationStatus::Blocked(e.to_string())).await?;
                return Ok(Disposition::Done);
            }
        };
        self.status
            .set_status(&ReconciliationStatus::Maintenance(format!(
                "Adding {CONTAINER_NAME} layer to pebble"
            )))
            .await?;
        self.apply(&snap).await?;
        self.status.set_status(&ReconciliationStatus::Active).await?;
        let version = version::probe(self.workload).await;
        tracing::info!("workload version is `{version}`");
        self.status.set_workload_version(&version).await?;
        Ok(Disposition::Done)
    }

    async fn on_config_changed(&self, input: &PassInput) -> Result<Disposition> {
        let snap = match ConfigurationSnapshot::load(&input.config, self.policy) {
            Ok(snap) => snap,
            Err(e) => {
                tracing::warn!("{e}");
                self.status.set_status(&ReconciliationStatus::Blocked(e.to_string())).await?;
                return Ok(Disposition::Defer);
            }
        };
        if !self.workload.can_connect().await {
            tracing::info!("{}", crate::Error::WorkloadUnreachable);
            self.status
                .set_status(&ReconciliationStatus::Waiting("Waiting for pebble".to_string()))
                .await?;
            return Ok(Disposition::Defer);
        }
        tracing::info!("Configuration has changed");
        self.status
            .set_status(&ReconciliationStatus::Maintenance("Configuring pod".to_string()))
            .await?;
        self.apply(&snap).await?;
        let target = routing::resolve(&input.app_name, input.config.external_hostname(), &input.peer);
        self.routes.publish_route(&target).await?;
        self.status.set_status(&ReconciliationStatus::Active).await?;
        Ok(Disposition::Done)
    }

    async fn apply(&self, snap: &ConfigurationSnapshot) -> Result<()> {
        let plan = SupervisorPlan::from_snapshot(snap);
        tracing::debug!("applying plan for {:?}", snap);
        self.workload.replace_plan(&plan).await
    }
}
