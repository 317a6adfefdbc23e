use crate::{Result, WEBHOOK_PORT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SVC_HOSTNAME: &str = "service-hostname";
pub const SVC_NAME: &str = "service-name";
pub const SVC_PORT: &str = "service-port";
pub const SVC_NAMESPACE: &str = "service-namespace";

/// Externally visible routing for the webhook endpoint
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RouteTarget {
    pub hostname: String,
    pub service_name: String,
    pub port: u16,
}

impl RouteTarget {
    /// Application data published on the ingress relation
    pub fn relation_data(&self, namespace: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (SVC_HOSTNAME.to_string(), self.hostname.clone()),
            (SVC_NAME.to_string(), self.service_name.clone()),
            (SVC_PORT.to_string(), self.port.to_string()),
            (SVC_NAMESPACE.to_string(), namespace.to_string()),
        ])
    }
}

/// What the ingress relation currently exposes for our application
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PeerRelationView {
    #[default]
    Absent,
    NoAppData,
    AppData(BTreeMap<String, String>),
}

impl PeerRelationView {
    fn complete_data(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            PeerRelationView::AppData(data)
                if [SVC_HOSTNAME, SVC_NAME, SVC_PORT].iter().all(|k| data.contains_key(*k)) =>
            {
                Some(data)
            }
            _ => None,
        }
    }
}

/// Sink for the resolved route. Write-only: nothing is read back.
#[async_trait]
pub trait RoutePublisher: Send + Sync {
    async fn publish_route(&self, target: &RouteTarget) -> Result<()>;
}

pub fn resolve(local_app: &str, external_hostname: Option<&str>, peer: &PeerRelationView) -> RouteTarget {
    let hostname = external_hostname
        .filter(|h| !h.is_empty())
        .unwrap_or(local_app)
        .to_string();
    let default = RouteTarget {
        hostname,
        service_name: local_app.to_string(),
        port: WEBHOOK_PORT,
    };
    let Some(data) = peer.complete_data() else {
        return default;
    };
    match data[SVC_PORT].parse::<u16>() {
        Ok(port) => RouteTarget {
            service_name: data[SVC_NAME].clone(),
            port,
            ..default
        },
        Err(e) => {
            tracing::debug!("ignoring ingress data with invalid {SVC_PORT} `{}`: {e}", data[SVC_PORT]);
            default
        }
    }
}
