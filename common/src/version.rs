use crate::{COMMAND_PATH, Executor, RUN_AS_USER};
use regex::Regex;

lazy_static::lazy_static! {
    static ref COMMIT_RE: Regex = Regex::new("[0-9a-f]{5,40}").expect("valid commit pattern");
}

/// Short commit hash found in the exporter `--version` output
pub fn extract(output: &str) -> String {
    COMMIT_RE
        .find(output)
        .map(|m| m.as_str().chars().take(7).collect())
        .unwrap_or_default()
}

/// Best-effort: any exec failure yields an empty version.
pub async fn probe<E: Executor + ?Sized>(executor: &E) -> String {
    let command = vec![COMMAND_PATH.to_string(), "--version".to_string()];
    match executor.exec(&command, RUN_AS_USER).await {
        Ok(output) => extract(&output),
        Err(e) => {
            tracing::debug!("{}", crate::Error::VersionProbeFailed(e.to_string()));
            String::new()
        }
    }
}
