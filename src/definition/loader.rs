use anyhow::{Result, Context as AnyhowContext, anyhow, bail};
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::fs;

use crate::definition::{Activity, BehaviorKind, EventKind, ProcessDefinition};

/// Raw file representation of a definition, before tree validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDefinition {
    pub id: String,
    pub activities: Vec<RawActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivity {
    pub id: String,
    /// Activity type name, e.g. "userTask", "subProcess", "boundaryEvent".
    pub kind: String,
    #[serde(default)]
    pub scope: bool,
    pub parent: Option<String>,
    pub host: Option<String>,
    pub event: Option<String>,
}

pub fn load_definition_from_yaml(file_path: &str) -> Result<ProcessDefinition> {
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read YAML file from {}", file_path))?;

    let raw: RawDefinition = serde_yaml::from_str(&yaml_content)
        .with_context(|| format!("Failed to deserialize YAML content from {}", file_path))?;

    build_definition(raw)
}

pub fn build_definition(raw: RawDefinition) -> Result<ProcessDefinition> {
    let mut activities: HashMap<String, Activity> = HashMap::new();
    let mut roots = Vec::new();
    let mut child_lists: HashMap<String, Vec<String>> = HashMap::new();
    let kinds: HashMap<String, String> = raw
        .activities
        .iter()
        .map(|a| (a.id.clone(), a.kind.clone()))
        .collect();

    for raw_activity in raw.activities {
        if activities.contains_key(&raw_activity.id) {
            bail!("Duplicate activity ID: {}", raw_activity.id);
        }

        if let Some(parent) = &raw_activity.parent {
            if !kinds.contains_key(parent) {
                bail!(
                    "Activity '{}' references unknown parent '{}'",
                    raw_activity.id,
                    parent
                );
            }
            child_lists
                .entry(parent.clone())
                .or_default()
                .push(raw_activity.id.clone());
        } else {
            roots.push(raw_activity.id.clone());
        }

        if let Some(host) = &raw_activity.host {
            if !kinds.contains_key(host) {
                bail!(
                    "Boundary event '{}' references unknown host '{}'",
                    raw_activity.id,
                    host
                );
            }
            // Covers self-references too; the hosting activity must be a
            // task or subprocess, never another event.
            if kinds.get(host).map(String::as_str) == Some("boundaryEvent") {
                bail!(
                    "Boundary event '{}' cannot attach to another boundary event '{}'",
                    raw_activity.id,
                    host
                );
            }
        }

        let behavior = parse_behavior(&raw_activity)?;
        let is_scope = raw_activity.scope || default_scope(&behavior);

        activities.insert(raw_activity.id.clone(), Activity {
            id: raw_activity.id,
            behavior,
            is_scope,
            parent: raw_activity.parent,
            host_activity: raw_activity.host,
            children: Vec::new(),
        });
    }

    for (parent, children) in child_lists {
        if let Some(activity) = activities.get_mut(&parent) {
            activity.children = children;
        }
    }

    Ok(ProcessDefinition::from_parts(raw.id, activities, roots))
}

fn parse_behavior(raw: &RawActivity) -> Result<BehaviorKind> {
    let behavior = match raw.kind.as_str() {
        "userTask" => BehaviorKind::UserTask,
        "subProcess" => BehaviorKind::SubProcess,
        "receiveTask" => BehaviorKind::ReceiveTask,
        "parallelMultiInstance" => BehaviorKind::ParallelMultiInstance,
        "sequentialMultiInstance" => BehaviorKind::SequentialMultiInstance,
        "boundaryEvent" => BehaviorKind::BoundaryEvent { event: parse_event(raw)? },
        "intermediateCatchEvent" => {
            BehaviorKind::IntermediateCatchEvent { event: parse_event(raw)? }
        }
        other => BehaviorKind::Other { type_name: other.to_string() },
    };
    Ok(behavior)
}

fn parse_event(raw: &RawActivity) -> Result<EventKind> {
    let name = raw
        .event
        .as_deref()
        .ok_or_else(|| anyhow!("Event activity '{}' is missing its event kind", raw.id))?;

    match name {
        "message" => Ok(EventKind::Message),
        "signal" => Ok(EventKind::Signal),
        "timer" => Ok(EventKind::Timer),
        "error" => Ok(EventKind::Error),
        "escalation" => Ok(EventKind::Escalation),
        other => Err(anyhow!(
            "Unknown event kind '{}' on activity '{}'",
            other,
            raw.id
        )),
    }
}

/// Subprocesses and multi-instance bodies are always scopes, whatever the
/// file says.
fn default_scope(behavior: &BehaviorKind) -> bool {
    matches!(
        behavior,
        BehaviorKind::SubProcess
            | BehaviorKind::ParallelMultiInstance
            | BehaviorKind::SequentialMultiInstance
    )
}
