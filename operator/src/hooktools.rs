use crate::{Error, Result, dispatch::Host};
use async_trait::async_trait;
use common::{
    INGRESS_RELATION, METRICS_RELATION, PeerRelationView, RawConfig, ReconciliationStatus, RoutePublisher,
    RouteTarget, StatusReporter, scrape, shellhandler,
};
use std::{collections::BTreeMap, path::PathBuf};

/// Thin client over the Juju hook tools available to a running hook
#[derive(Clone, Debug)]
pub struct HookTools {
    tools_dir: Option<PathBuf>,
    unit_name: String,
    app_name: String,
    model_name: String,
    model_uuid: String,
}

fn env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::MissingEnv(name.to_string()))
}

pub fn app_from_unit(unit_name: &str) -> &str {
    unit_name.split('/').next().unwrap_or(unit_name)
}

/// `network-get --format=json` yields either one address or a list of them
pub fn parse_address(output: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(output).map_err(Error::SerializationError)?;
    let address = match &value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(list) => list.iter().find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    };
    address.ok_or_else(|| Error::Other(format!("no ingress address in `{}`", output.trim())))
}

/// `relation-get --format=json` prints `null` or a string map
pub fn parse_relation_data(output: &str) -> Result<BTreeMap<String, String>> {
    let data: Option<BTreeMap<String, String>> =
        serde_json::from_str(output).map_err(Error::SerializationError)?;
    Ok(data.unwrap_or_default())
}

impl HookTools {
    pub fn new(tools_dir: Option<PathBuf>, unit_name: &str, model_name: &str, model_uuid: &str) -> Self {
        Self {
            tools_dir,
            unit_name: unit_name.to_string(),
            app_name: app_from_unit(unit_name).to_string(),
            model_name: model_name.to_string(),
            model_uuid: model_uuid.to_string(),
        }
    }

    pub fn from_env(tools_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self::new(
            tools_dir,
            &env("JUJU_UNIT_NAME")?,
            &env("JUJU_MODEL_NAME")?,
            &env("JUJU_MODEL_UUID").unwrap_or_default(),
        ))
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    fn program(&self, tool: &str) -> String {
        match &self.tools_dir {
            Some(dir) => dir.join(tool).to_string_lossy().to_string(),
            None => tool.to_string(),
        }
    }

    async fn call(&self, tool: &str, args: &[String]) -> Result<String> {
        shellhandler::get_stdout(&self.program(tool), args, &[]).await
    }

    pub async fn config_get(&self) -> Result<RawConfig> {
        let out = self.call("config-get", &["--all".to_string(), "--format=json".to_string()]).await?;
        RawConfig::from_json(&out)
    }

    pub async fn status_set(&self, status: &ReconciliationStatus) -> Result<()> {
        self.call(
            "status-set",
            &[status.level().to_string(), status.message().to_string()],
        )
        .await
        .map(|_| ())
    }

    pub async fn application_version_set(&self, version: &str) -> Result<()> {
        self.call("application-version-set", &[version.to_string()]).await.map(|_| ())
    }

    pub async fn is_leader(&self) -> Result<bool> {
        let out = self.call("is-leader", &["--format=json".to_string()]).await?;
        serde_json::from_str(&out).map_err(Error::SerializationError)
    }

    pub async fn relation_ids(&self, relation: &str) -> Result<Vec<String>> {
        let out = self
            .call("relation-ids", &[relation.to_string(), "--format=json".to_string()])
            .await?;
        let ids: Option<Vec<String>> = serde_json::from_str(&out).map_err(Error::SerializationError)?;
        Ok(ids.unwrap_or_default())
    }

    /// Our own application databag on relation `id`
    pub async fn relation_get_app(&self, id: &str) -> Result<BTreeMap<String, String>> {
        let args = [
            "-r".to_string(),
            id.to_string(),
            "--app".to_string(),
            "--format=json".to_string(),
            "-".to_string(),
            self.app_name.clone(),
        ];
        parse_relation_data(&self.call("relation-get", &args).await?)
    }

    /// Writes `data` to the application (leader only) or unit databag
    pub async fn relation_set(&self, id: &str, data: &BTreeMap<String, String>, app: bool) -> Result<()> {
        let mut args = vec!["-r".to_string(), id.to_string()];
        if app {
            args.push("--app".to_string());
        }
        args.extend(["--file".to_string(), "-".to_string()]);
        let input = serde_yaml::to_string(data).map_err(Error::YamlError)?;
        let program = self.program("relation-set");
        let out = shellhandler::run_with_input(&program, &args, &[], &input).await?;
        shellhandler::check(&program, &args, out).map(|_| ())
    }

    pub async fn ingress_address(&self, relation: &str) -> Result<String> {
        let args = [
            relation.to_string(),
            "--ingress-address".to_string(),
            "--format=json".to_string(),
        ];
        parse_address(&self.call("network-get", &args).await?)
    }
}

#[async_trait]
impl StatusReporter for HookTools {
    async fn set_status(&self, status: &ReconciliationStatus) -> Result<()> {
        tracing::info!("unit status: {status}");
        self.status_set(status).await
    }

    async fn set_workload_version(&self, version: &str) -> Result<()> {
        self.application_version_set(version).await
    }
}

#[async_trait]
impl RoutePublisher for HookTools {
    async fn publish_route(&self, target: &RouteTarget) -> Result<()> {
        let ids = self.relation_ids(INGRESS_RELATION).await?;
        if ids.is_empty() {
            return Ok(());
        }
        if !self.is_leader().await? {
            tracing::debug!("not leader, leaving {INGRESS_RELATION} data untouched");
            return Ok(());
        }
        let data = target.relation_data(&self.model_name);
        for id in ids {
            tracing::info!(
                "publishing route {}:{} ({}) on {id}",
                target.hostname,
                target.port,
                target.service_name
            );
            self.relation_set(&id, &data, true).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Host for HookTools {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    async fn read_config(&self) -> Result<RawConfig> {
        self.config_get().await
    }

    async fn peer_view(&self) -> Result<PeerRelationView> {
        let ids = self.relation_ids(INGRESS_RELATION).await?;
        let Some(id) = ids.first() else {
            return Ok(PeerRelationView::Absent);
        };
        // Juju only lets the leader read its own application databag
        if !self.is_leader().await? {
            return Ok(PeerRelationView::NoAppData);
        }
        let data = self.relation_get_app(id).await?;
        if data.is_empty() {
            Ok(PeerRelationView::NoAppData)
        } else {
            Ok(PeerRelationView::AppData(data))
        }
    }

    async fn register_metrics(&self) -> Result<()> {
        let ids = self.relation_ids(METRICS_RELATION).await?;
        if ids.is_empty() {
            return Ok(());
        }
        let leader = self.is_leader().await?;
        let metadata = scrape::ScrapeMetadata {
            model: self.model_name.clone(),
            model_uuid: self.model_uuid.clone(),
            application: self.app_name.clone(),
            charm_name: common::CONTAINER_NAME.to_string(),
        };
        let app_data = scrape::app_data(&metadata)?;
        let address = self.ingress_address(METRICS_RELATION).await?;
        let unit_data = scrape::unit_data(&self.unit_name, &address);
        for id in ids {
            if leader {
                self.relation_set(&id, &app_data, true).await?;
            }
            self.relation_set(&id, &unit_data, false).await?;
        }
        Ok(())
    }
}
