use crate::{
    Error, Executor, ReconciliationStatus, Result, RoutePublisher, RouteTarget, StatusReporter, SupervisorPlan,
    Workload,
};
use async_trait::async_trait;
use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

/// In-memory supervisor: records every applied plan and every exec
#[derive(Default)]
pub struct WorkloadMock {
    connected: AtomicBool,
    fail_apply: bool,
    version_output: Option<String>,
    plans: Mutex<Vec<SupervisorPlan>>,
    execs: Mutex<Vec<(Vec<String>, String)>>,
}

impl WorkloadMock {
    pub fn connected() -> Self {
        let mock = Self::default();
        mock.set_connected(true);
        mock
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn with_version_output(mut self, output: &str) -> Self {
        self.version_output = Some(output.to_string());
        self
    }

    pub fn failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Every plan applied so far, oldest first
    pub fn plans(&self) -> Vec<SupervisorPlan> {
        self.plans.lock().unwrap().clone()
    }

    /// The plan in effect: each apply replaces the previous one
    pub fn current_plan(&self) -> Option<SupervisorPlan> {
        self.plans.lock().unwrap().last().cloned()
    }

    pub fn execs(&self) -> Vec<(Vec<String>, String)> {
        self.execs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for WorkloadMock {
    async fn exec(&self, command: &[String], user: &str) -> Result<String> {
        self.execs.lock().unwrap().push((command.to_vec(), user.to_string()));
        self.version_output
            .clone()
            .ok_or_else(|| Error::CommandFailed(command.join(" "), 1, "no such file".to_string()))
    }
}

#[async_trait]
impl Workload for WorkloadMock {
    async fn can_connect(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn replace_plan(&self, plan: &SupervisorPlan) -> Result<()> {
        if self.fail_apply {
            return Err(Error::Other("pebble refused the layer".to_string()));
        }
        self.plans.lock().unwrap().push(plan.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct StatusMock {
    history: Mutex<Vec<ReconciliationStatus>>,
    version: Mutex<Option<String>>,
}

impl StatusMock {
    pub fn history(&self) -> Vec<ReconciliationStatus> {
        self.history.lock().unwrap().clone()
    }

    pub fn current(&self) -> Option<ReconciliationStatus> {
        self.history.lock().unwrap().last().cloned()
    }

    pub fn workload_version(&self) -> Option<String> {
        self.version.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusReporter for StatusMock {
    async fn set_status(&self, status: &ReconciliationStatus) -> Result<()> {
        self.history.lock().unwrap().push(status.clone());
        Ok(())
    }

    async fn set_workload_version(&self, version: &str) -> Result<()> {
        *self.version.lock().unwrap() = Some(version.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RouteMock {
    published: Mutex<Vec<RouteTarget>>,
}

impl RouteMock {
    pub fn published(&self) -> Vec<RouteTarget> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutePublisher for RouteMock {
    async fn publish_route(&self, target: &RouteTarget) -> Result<()> {
        self.published.lock().unwrap().push(target.clone());
        Ok(())
    }
}
