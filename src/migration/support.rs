use std::collections::HashSet;
use crate::definition::{Activity, BehaviorClass, BehaviorKind, EventKind};

/// The activity support gate. *Supported* refers to whether an execution at
/// an activity of this kind can be migrated at all; activities failing the
/// gate are invisible to instruction generation, neither as source nor as
/// target.
///
/// An immutable value injected into the generator and the plan validator, so
/// tests can run in parallel against differently configured gates.
#[derive(Debug, Clone)]
pub struct SupportRules {
    behaviors: HashSet<BehaviorClass>,
    /// Message intermediate catch events are allowed by type, independently
    /// of the behavior allow-list.
    message_intermediate_events: bool,
}

impl Default for SupportRules {
    fn default() -> Self {
        let mut behaviors = HashSet::new();
        behaviors.insert(BehaviorClass::SubProcess);
        behaviors.insert(BehaviorClass::UserTask);
        behaviors.insert(BehaviorClass::BoundaryEvent);
        behaviors.insert(BehaviorClass::ParallelMultiInstance);
        behaviors.insert(BehaviorClass::SequentialMultiInstance);
        behaviors.insert(BehaviorClass::ReceiveTask);

        Self {
            behaviors,
            message_intermediate_events: true,
        }
    }
}

impl SupportRules {
    pub fn is_supported(&self, activity: &Activity) -> bool {
        if self.behaviors.contains(&activity.behavior.class()) {
            return true;
        }

        self.message_intermediate_events
            && matches!(
                activity.behavior,
                BehaviorKind::IntermediateCatchEvent { event: EventKind::Message }
            )
    }
}

/// Verdict provider for event definition kinds, applied on top of the
/// support gate for event-bearing activities. The engine treats the concrete
/// rules as an external collaborator; [`DefaultEventKindFilter`] mirrors the
/// stock rule set (message, signal and timer migrate; error and escalation
/// do not).
pub trait EventKindFilter: Send + Sync {
    fn accepts(&self, event: EventKind) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEventKindFilter;

impl EventKindFilter for DefaultEventKindFilter {
    fn accepts(&self, event: EventKind) -> bool {
        match event {
            EventKind::Message | EventKind::Signal | EventKind::Timer => true,
            EventKind::Error | EventKind::Escalation => false,
        }
    }
}

/// Convenience for the gate plus event filter applied together.
pub fn admits(rules: &SupportRules, filter: &dyn EventKindFilter, activity: &Activity) -> bool {
    if !rules.is_supported(activity) {
        return false;
    }
    match activity.behavior.event_kind() {
        Some(event) => filter.accepts(event),
        None => true,
    }
}
