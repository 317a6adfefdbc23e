use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum RelationEventKind {
    Created,
    Joined,
    Changed,
    Departed,
    Broken,
}

impl RelationEventKind {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "created" => Some(RelationEventKind::Created),
            "joined" => Some(RelationEventKind::Joined),
            "changed" => Some(RelationEventKind::Changed),
            "departed" => Some(RelationEventKind::Departed),
            "broken" => Some(RelationEventKind::Broken),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            RelationEventKind::Created => "created",
            RelationEventKind::Joined => "joined",
            RelationEventKind::Changed => "changed",
            RelationEventKind::Departed => "departed",
            RelationEventKind::Broken => "broken",
        }
    }
}

/// A triggering event, as delivered by the orchestrator
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Event {
    WorkloadReady { container: String },
    ConfigChanged,
    Relation { relation: String, event: RelationEventKind },
    Other { name: String },
}

impl Event {
    pub fn from_hook_name(name: &str) -> Self {
        if name == "config-changed" {
            return Event::ConfigChanged;
        }
        if let Some(container) = name.strip_suffix("-pebble-ready") {
            return Event::WorkloadReady {
                container: container.to_string(),
            };
        }
        if let Some((relation, suffix)) = name.rsplit_once("-relation-") {
            if let Some(event) = RelationEventKind::from_suffix(suffix) {
                return Event::Relation {
                    relation: relation.to_string(),
                    event,
                };
            }
        }
        Event::Other { name: name.to_string() }
    }

    /// `JUJU_DISPATCH_PATH` looks like `hooks/config-changed`
    pub fn from_dispatch_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        Self::from_hook_name(name)
    }

    pub fn hook_name(&self) -> String {
        match self {
            Event::WorkloadReady { container } => format!("{container}-pebble-ready"),
            Event::ConfigChanged => "config-changed".to_string(),
            Event::Relation { relation, event } => format!("{relation}-relation-{}", event.as_str()),
            Event::Other { name } => name.clone(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hook_name())
    }
}
