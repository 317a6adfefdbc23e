use crate::Result;
use async_trait::async_trait;
use common::{Executor, SupervisorPlan, Workload, shellhandler};
use std::path::{Path, PathBuf};

/// Layers carry the workload secrets, they only ever travel through a pipe
const LAYER_FROM_STDIN: &str = "/dev/stdin";

/// Drives the workload container's Pebble through its CLI
#[derive(Clone, Debug)]
pub struct PebbleClient {
    bin: String,
    socket: PathBuf,
}

impl PebbleClient {
    pub fn new(bin: &str, socket: &Path) -> Self {
        Self {
            bin: bin.to_string(),
            socket: socket.to_path_buf(),
        }
    }

    /// Socket Juju mounts into the charm container for `container`
    pub fn default_socket(container: &str) -> PathBuf {
        PathBuf::from(format!("/charm/containers/{container}/pebble.socket"))
    }

    fn env(&self) -> Vec<(String, String)> {
        vec![("PEBBLE_SOCKET".to_string(), self.socket.to_string_lossy().to_string())]
    }

    async fn call(&self, args: &[String]) -> Result<String> {
        shellhandler::get_stdout(&self.bin, args, &self.env()).await
    }

    pub fn add_args(label: &str) -> Vec<String> {
        vec![
            "add".to_string(),
            "--combine".to_string(),
            label.to_string(),
            LAYER_FROM_STDIN.to_string(),
        ]
    }

    pub fn exec_args(command: &[String], user: &str) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "--user".to_string(),
            user.to_string(),
            "--".to_string(),
        ];
        args.extend(command.iter().cloned());
        args
    }
}

#[async_trait]
impl Executor for PebbleClient {
    async fn exec(&self, command: &[String], user: &str) -> Result<String> {
        self.call(&Self::exec_args(command, user)).await
    }
}

#[async_trait]
impl Workload for PebbleClient {
    async fn can_connect(&self) -> bool {
        match self.call(&["version".to_string()]).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("pebble at {} is not reachable: {e}", self.socket.display());
                false
            }
        }
    }

    async fn replace_plan(&self, plan: &SupervisorPlan) -> Result<()> {
        let args = Self::add_args(plan.label());
        let out = shellhandler::run_with_input(&self.bin, &args, &self.env(), &plan.to_yaml()?).await?;
        shellhandler::check(&self.bin, &args, out)?;
        self.call(&["replan".to_string()]).await?;
        tracing::info!("pebble layer `{}` replaced and replanned", plan.label());
        Ok(())
    }
}
