use crate::{ConfigurationSnapshot, Error, Result, SERVICE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Copy, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Override {
    Merge,
    #[default]
    Replace,
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Copy, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Startup {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Copy, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    Alive,
    #[default]
    Ready,
}

/// A supervised process
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
pub struct Service {
    #[serde(rename = "override")]
    pub override_: Override,
    pub summary: String,
    pub startup: Startup,
    pub user: String,
    pub command: String,
    pub environment: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
pub struct TcpCheck {
    pub port: u16,
}

/// A health check run by the supervisor
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
pub struct Check {
    #[serde(rename = "override")]
    pub override_: Override,
    pub level: CheckLevel,
    pub tcp: TcpCheck,
}

/// Desired supervisor layer for the workload container
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
pub struct SupervisorPlan {
    pub summary: String,
    pub description: String,
    pub services: BTreeMap<String, Service>,
    pub checks: BTreeMap<String, Check>,
}

impl SupervisorPlan {
    pub fn from_snapshot(snap: &ConfigurationSnapshot) -> Self {
        let environment = BTreeMap::from([
            ("GITHUB_WEBHOOK_TOKEN".to_string(), snap.webhook_token().to_string()),
            ("GITHUB_API_TOKEN".to_string(), snap.api_token().to_string()),
            ("GITHUB_ORG".to_string(), snap.organization().to_string()),
        ]);
        let service = Service {
            override_: Override::Replace,
            summary: SERVICE_NAME.to_string(),
            startup: Startup::Enabled,
            user: snap.user_name().to_string(),
            command: snap.command_path().to_string(),
            environment,
        };
        let check = Check {
            override_: Override::Replace,
            level: CheckLevel::Ready,
            tcp: TcpCheck {
                port: snap.metrics_port(),
            },
        };
        Self {
            summary: "GitHub Actions Exporter layer".to_string(),
            description: "pebble config layer for GitHub Actions Exporter".to_string(),
            services: BTreeMap::from([(SERVICE_NAME.to_string(), service)]),
            checks: BTreeMap::from([(format!("{SERVICE_NAME}-ready"), check)]),
        }
    }

    /// Label under which the layer is registered with the supervisor
    pub fn label(&self) -> &'static str {
        SERVICE_NAME
    }

    pub fn service(&self) -> Option<&Service> {
        self.services.get(SERVICE_NAME)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::YamlError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawConfig, ValidationPolicy};

    fn snapshot(webhook: &str, api: &str, org: &str) -> ConfigurationSnapshot {
        let raw = RawConfig {
            github_webhook_token: Some(webhook.to_string()),
            github_api_token: Some(api.to_string()),
            github_org: Some(org.to_string()),
            external_hostname: None,
        };
        ConfigurationSnapshot::load(&raw, ValidationPolicy::AllRequired).unwrap()
    }

    #[test]
    fn test_environment_mirrors_config() {
        let plan = SupervisorPlan::from_snapshot(&snapshot("foo", "bar", "baz"));
        let svc = plan.service().unwrap();
        assert_eq!(
            svc.environment,
            BTreeMap::from([
                ("GITHUB_API_TOKEN".to_string(), "bar".to_string()),
                ("GITHUB_ORG".to_string(), "baz".to_string()),
                ("GITHUB_WEBHOOK_TOKEN".to_string(), "foo".to_string()),
            ])
        );
        assert_eq!(svc.user, "gh_exporter");
        assert_eq!(svc.command, "/srv/gh_exporter/github-actions-exporter");
        assert_eq!(svc.startup, Startup::Enabled);
        assert_eq!(svc.override_, Override::Replace);
    }

    #[test]
    fn test_single_tcp_ready_check_on_metrics_port() {
        let plan = SupervisorPlan::from_snapshot(&snapshot("foo", "bar", "baz"));
        assert_eq!(plan.checks.len(), 1);
        let check = &plan.checks["github-actions-exporter-ready"];
        assert_eq!(check.level, CheckLevel::Ready);
        assert_eq!(check.tcp.port, 9101);
    }

    #[test]
    fn test_same_snapshot_gives_identical_plan() {
        let snap = snapshot("foo", "bar", "baz");
        let first = SupervisorPlan::from_snapshot(&snap);
        let second = SupervisorPlan::from_snapshot(&snap);
        assert_eq!(first, second);
        assert_eq!(first.to_yaml().unwrap(), second.to_yaml().unwrap());
    }

    #[test]
    fn test_yaml_layer_shape() {
        let yaml = SupervisorPlan::from_snapshot(&snapshot("foo", "bar", "baz"))
            .to_yaml()
            .unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let svc = &doc["services"]["github-actions-exporter"];
        assert_eq!(svc["override"].as_str(), Some("replace"));
        assert_eq!(svc["startup"].as_str(), Some("enabled"));
        assert_eq!(svc["environment"]["GITHUB_ORG"].as_str(), Some("baz"));
        let check = &doc["checks"]["github-actions-exporter-ready"];
        assert_eq!(check["level"].as_str(), Some("ready"));
        assert_eq!(check["tcp"]["port"].as_u64(), Some(9101));
    }
}
