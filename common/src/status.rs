use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit status as surfaced to the orchestrator
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum ReconciliationStatus {
    Blocked(String),
    Waiting(String),
    Maintenance(String),
    Active,
}

impl ReconciliationStatus {
    /// Level name understood by `status-set`
    pub fn level(&self) -> &'static str {
        match self {
            ReconciliationStatus::Blocked(_) => "blocked",
            ReconciliationStatus::Waiting(_) => "waiting",
            ReconciliationStatus::Maintenance(_) => "maintenance",
            ReconciliationStatus::Active => "active",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ReconciliationStatus::Blocked(m)
            | ReconciliationStatus::Waiting(m)
            | ReconciliationStatus::Maintenance(m) => m,
            ReconciliationStatus::Active => "",
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.level())
        } else {
            write!(f, "{}: {}", self.level(), self.message())
        }
    }
}

#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn set_status(&self, status: &ReconciliationStatus) -> Result<()>;
    async fn set_workload_version(&self, version: &str) -> Result<()>;
}
