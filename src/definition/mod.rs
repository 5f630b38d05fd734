pub mod builder;
pub mod loader;

use std::collections::HashMap;
use serde::{Serialize, Deserialize};

/// Event definition kinds carried by boundary and intermediate catch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Message,
    Signal,
    Timer,
    Error,
    Escalation,
}

/// Behavior of an activity. Closed set; matching and support checks are
/// exhaustive matches over this enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BehaviorKind {
    UserTask,
    SubProcess,
    BoundaryEvent { event: EventKind },
    ParallelMultiInstance,
    SequentialMultiInstance,
    ReceiveTask,
    IntermediateCatchEvent { event: EventKind },
    Other { type_name: String },
}

/// Discriminant of [`BehaviorKind`], ignoring event kinds and type names.
/// Two activities are behavior-compatible iff their classes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorClass {
    UserTask,
    SubProcess,
    BoundaryEvent,
    ParallelMultiInstance,
    SequentialMultiInstance,
    ReceiveTask,
    IntermediateCatchEvent,
    Other,
}

impl BehaviorKind {
    pub fn class(&self) -> BehaviorClass {
        match self {
            BehaviorKind::UserTask => BehaviorClass::UserTask,
            BehaviorKind::SubProcess => BehaviorClass::SubProcess,
            BehaviorKind::BoundaryEvent { .. } => BehaviorClass::BoundaryEvent,
            BehaviorKind::ParallelMultiInstance => BehaviorClass::ParallelMultiInstance,
            BehaviorKind::SequentialMultiInstance => BehaviorClass::SequentialMultiInstance,
            BehaviorKind::ReceiveTask => BehaviorClass::ReceiveTask,
            BehaviorKind::IntermediateCatchEvent { .. } => BehaviorClass::IntermediateCatchEvent,
            BehaviorKind::Other { .. } => BehaviorClass::Other,
        }
    }

    /// The event definition kind, for event-bearing activities.
    pub fn event_kind(&self) -> Option<EventKind> {
        match self {
            BehaviorKind::BoundaryEvent { event } => Some(*event),
            BehaviorKind::IntermediateCatchEvent { event } => Some(*event),
            _ => None,
        }
    }

    pub fn is_multi_instance(&self) -> bool {
        matches!(
            self,
            BehaviorKind::ParallelMultiInstance | BehaviorKind::SequentialMultiInstance
        )
    }
}

/// A node of the process definition tree. Immutable once the definition is
/// built. The implicit process root is not an activity; top-level activities
/// have `parent == None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub behavior: BehaviorKind,
    /// Whether this activity establishes a nesting boundary for variables
    /// and concurrency at runtime.
    pub is_scope: bool,
    pub parent: Option<String>,
    /// Set only for boundary events: the activity the event attaches to.
    pub host_activity: Option<String>,
    /// Child activities in declaration order.
    pub children: Vec<String>,
}

/// A parsed process definition: an activity tree keyed by activity id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: String,
    activities: HashMap<String, Activity>,
    /// Top-level activities in declaration order.
    roots: Vec<String>,
}

impl ProcessDefinition {
    pub(crate) fn from_parts(
        id: String,
        activities: HashMap<String, Activity>,
        roots: Vec<String>,
    ) -> Self {
        Self { id, activities, roots }
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.get(id)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// The flow-scope chain of an activity: ids of its ancestor scope
    /// activities, outermost first. The implicit root and the activity
    /// itself are excluded.
    pub fn flow_scope_chain(&self, activity_id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = self
            .activities
            .get(activity_id)
            .and_then(|a| a.parent.as_deref());

        while let Some(parent_id) = cursor {
            let Some(parent) = self.activities.get(parent_id) else {
                break;
            };
            if parent.is_scope {
                chain.push(parent.id.clone());
            }
            cursor = parent.parent.as_deref();
        }

        chain.reverse();
        chain
    }

    /// Deterministic pre-order traversal of the activity tree, following
    /// declaration order at every level.
    pub fn preorder(&self) -> Vec<&Activity> {
        let mut out = Vec::with_capacity(self.activities.len());
        for root in &self.roots {
            self.collect_preorder(root, &mut out);
        }
        out
    }

    fn collect_preorder<'a>(&'a self, id: &str, out: &mut Vec<&'a Activity>) {
        if let Some(activity) = self.activities.get(id) {
            out.push(activity);
            for child in &activity.children {
                self.collect_preorder(child, out);
            }
        }
    }
}
