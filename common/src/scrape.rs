use crate::{Error, METRICS_PORT, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
pub struct StaticConfig {
    pub targets: Vec<String>,
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
pub struct ScrapeJob {
    pub static_configs: Vec<StaticConfig>,
}

/// Topology sent alongside the jobs so the scraper can label them
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
pub struct ScrapeMetadata {
    pub model: String,
    pub model_uuid: String,
    pub application: String,
    pub charm_name: String,
}

/// The exporter listens on the same port on every unit.
pub fn jobs() -> Vec<ScrapeJob> {
    vec![ScrapeJob {
        static_configs: vec![StaticConfig {
            targets: vec![format!("*:{METRICS_PORT}")],
        }],
    }]
}

pub fn app_data(metadata: &ScrapeMetadata) -> Result<BTreeMap<String, String>> {
    Ok(BTreeMap::from([
        (
            "scrape_jobs".to_string(),
            serde_json::to_string(&jobs()).map_err(Error::SerializationError)?,
        ),
        (
            "scrape_metadata".to_string(),
            serde_json::to_string(metadata).map_err(Error::SerializationError)?,
        ),
    ]))
}

pub fn unit_data(unit_name: &str, address: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("prometheus_scrape_unit_name".to_string(), unit_name.to_string()),
        ("prometheus_scrape_unit_address".to_string(), address.to_string()),
    ])
}
