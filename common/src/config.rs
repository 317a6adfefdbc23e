use crate::{COMMAND_PATH, CONTAINER_NAME, Error, METRICS_PORT, RUN_AS_USER, Result, WEBHOOK_PORT};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub const WEBHOOK_TOKEN_KEY: &str = "github_webhook_token";
pub const API_TOKEN_KEY: &str = "github_api_token";
pub const ORG_KEY: &str = "github_org";
pub const EXTERNAL_HOSTNAME_KEY: &str = "external_hostname";

/// Options as returned by `config-get --all`. Only the known keys are kept.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RawConfig {
    pub github_webhook_token: Option<String>,
    pub github_api_token: Option<String>,
    pub github_org: Option<String>,
    pub external_hostname: Option<String>,
}

impl RawConfig {
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(Error::SerializationError)
    }

    /// The configured external hostname, `None` when unset or empty
    pub fn external_hostname(&self) -> Option<&str> {
        self.external_hostname.as_deref().filter(|h| !h.is_empty())
    }
}

/// Which options must be non-empty for a snapshot to be complete
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPolicy {
    #[default]
    AllRequired,
    WebhookTokenOnly,
}

impl FromStr for ValidationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all-required" => Ok(ValidationPolicy::AllRequired),
            "webhook-token-only" => Ok(ValidationPolicy::WebhookTokenOnly),
            other => Err(Error::Other(format!("unknown validation policy `{other}`"))),
        }
    }
}

impl ValidationPolicy {
    fn required(&self) -> &'static [&'static str] {
        match self {
            ValidationPolicy::AllRequired => &[WEBHOOK_TOKEN_KEY, API_TOKEN_KEY, ORG_KEY],
            ValidationPolicy::WebhookTokenOnly => &[WEBHOOK_TOKEN_KEY],
        }
    }
}

/// Validated settings for a single reconciliation pass
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigurationSnapshot {
    webhook_token: String,
    api_token: String,
    organization: String,
}

impl ConfigurationSnapshot {
    pub fn load(raw: &RawConfig, policy: ValidationPolicy) -> Result<Self> {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        let fields = [
            (WEBHOOK_TOKEN_KEY, value(&raw.github_webhook_token)),
            (API_TOKEN_KEY, value(&raw.github_api_token)),
            (ORG_KEY, value(&raw.github_org)),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(key, val)| val.is_empty() && policy.required().contains(key))
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(Error::ConfigInvalid(missing.join(" ")));
        }
        let [(_, webhook_token), (_, api_token), (_, organization)] = fields;
        Ok(Self {
            webhook_token,
            api_token,
            organization,
        })
    }

    pub fn webhook_token(&self) -> &str {
        &self.webhook_token
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn container_name(&self) -> &'static str {
        CONTAINER_NAME
    }

    pub fn user_name(&self) -> &'static str {
        RUN_AS_USER
    }

    pub fn command_path(&self) -> &'static str {
        COMMAND_PATH
    }

    pub fn webhook_port(&self) -> u16 {
        WEBHOOK_PORT
    }

    pub fn metrics_port(&self) -> u16 {
        METRICS_PORT
    }
}

impl fmt::Debug for ConfigurationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationSnapshot")
            .field("webhook_token", &"<redacted>")
            .field("api_token", &"<redacted>")
            .field("organization", &self.organization)
            .finish()
    }
}

/// One entry of the charm `config.yaml`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OptionDefinition {
    #[serde(rename = "type")]
    pub option_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConfigOptions {
    pub options: BTreeMap<String, OptionDefinition>,
}

pub fn options() -> ConfigOptions {
    let string = |description: &str, default: Option<&str>| OptionDefinition {
        option_type: "string".to_string(),
        description: description.to_string(),
        default: default.map(str::to_string),
    };
    let mut options = BTreeMap::new();
    options.insert(
        WEBHOOK_TOKEN_KEY.to_string(),
        string("Secret shared with GitHub to sign webhook deliveries. Required.", None),
    );
    options.insert(
        API_TOKEN_KEY.to_string(),
        string("GitHub API token used by the exporter to query workflow data.", None),
    );
    options.insert(
        ORG_KEY.to_string(),
        string("GitHub organization whose workflows are exported.", None),
    );
    options.insert(
        EXTERNAL_HOSTNAME_KEY.to_string(),
        string(
            "Hostname published to the ingress relation. Defaults to the application name.",
            Some(""),
        ),
    );
    ConfigOptions { options }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(webhook: &str, api: &str, org: &str) -> RawConfig {
        RawConfig {
            github_webhook_token: Some(webhook.to_string()),
            github_api_token: Some(api.to_string()),
            github_org: Some(org.to_string()),
            external_hostname: None,
        }
    }

    #[test]
    fn test_load_complete_config() {
        let snap = ConfigurationSnapshot::load(&raw("foo", "bar", "baz"), ValidationPolicy::AllRequired).unwrap();
        assert_eq!(snap.webhook_token(), "foo");
        assert_eq!(snap.api_token(), "bar");
        assert_eq!(snap.organization(), "baz");
        assert_eq!(snap.container_name(), "github-actions-exporter");
        assert_eq!(snap.metrics_port(), 9101);
    }

    #[test]
    fn test_load_reports_every_missing_field_in_order() {
        let err = ConfigurationSnapshot::load(&raw("", "bar", ""), ValidationPolicy::AllRequired).unwrap_err();
        match err {
            Error::ConfigInvalid(fields) => assert_eq!(fields, "github_webhook_token github_org"),
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_load_treats_absent_as_empty() {
        let err = ConfigurationSnapshot::load(&RawConfig::default(), ValidationPolicy::AllRequired).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration is not valid: github_webhook_token github_api_token github_org"
        );
    }

    #[test]
    fn test_webhook_only_policy_defaults_optional_fields() {
        let cfg = RawConfig {
            github_webhook_token: Some("foo".to_string()),
            ..Default::default()
        };
        let snap = ConfigurationSnapshot::load(&cfg, ValidationPolicy::WebhookTokenOnly).unwrap();
        assert_eq!(snap.api_token(), "");
        assert_eq!(snap.organization(), "");
        assert!(ConfigurationSnapshot::load(&RawConfig::default(), ValidationPolicy::WebhookTokenOnly).is_err());
    }

    #[test]
    fn test_from_json_ignores_unknown_keys() {
        let cfg = RawConfig::from_json(
            r#"{"github_webhook_token":"foo","github_org":"baz","log_level":"debug","external_hostname":""}"#,
        )
        .unwrap();
        assert_eq!(cfg.github_webhook_token.as_deref(), Some("foo"));
        assert_eq!(cfg.github_api_token, None);
        assert_eq!(cfg.external_hostname(), None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let snap = ConfigurationSnapshot::load(&raw("s3cret", "t0ken", "baz"), ValidationPolicy::AllRequired).unwrap();
        let dbg = format!("{snap:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(!dbg.contains("t0ken"));
        assert!(dbg.contains("baz"));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("all-required".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::AllRequired);
        assert_eq!(
            "webhook-token-only".parse::<ValidationPolicy>().unwrap(),
            ValidationPolicy::WebhookTokenOnly
        );
        assert!("strict".parse::<ValidationPolicy>().is_err());
    }

    #[test]
    fn test_options_list_known_keys() {
        let opts = options();
        let keys: Vec<&String> = opts.options.keys().collect();
        assert_eq!(
            keys,
            vec!["external_hostname", "github_api_token", "github_org", "github_webhook_token"]
        );
    }
}
