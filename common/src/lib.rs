use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration is not valid: {0}")]
    ConfigInvalid(String),

    #[error("Workload container is not reachable yet")]
    WorkloadUnreachable,

    #[error("Version probe failed: {0}")]
    VersionProbeFailed(String),

    #[error("SerializationError: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YamlError: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("UTF8 error {0}")]
    UTF8(#[from] std::string::FromUtf8Error),

    #[error("Stdio error {0}")]
    Stdio(#[from] std::io::Error),

    #[error("{0} failed, rc={1}: {2}")]
    CommandFailed(String, i32, String),

    #[error("Missing environment variable {0}")]
    MissingEnv(String),

    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub static CONTAINER_NAME: &str = "github-actions-exporter";
pub static SERVICE_NAME: &str = "github-actions-exporter";
pub static RUN_AS_USER: &str = "gh_exporter";
pub static COMMAND_PATH: &str = "/srv/gh_exporter/github-actions-exporter";
pub static WEBHOOK_PORT: u16 = 8065;
pub static METRICS_PORT: u16 = 9101;
pub static INGRESS_RELATION: &str = "ingress";
pub static METRICS_RELATION: &str = "metrics-endpoint";
pub static VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod events;
pub mod plan;
pub mod reconciler;
pub mod routing;
pub mod scrape;
pub mod shellhandler;
pub mod status;
pub mod version;
pub mod workloadmock;

pub use config::{ConfigurationSnapshot, RawConfig, ValidationPolicy};
pub use events::Event;
pub use plan::SupervisorPlan;
pub use reconciler::{Disposition, Executor, PassInput, Reconciler, Workload};
pub use routing::{PeerRelationView, RoutePublisher, RouteTarget};
pub use status::{ReconciliationStatus, StatusReporter};
