use crate::definition::{BehaviorClass, ProcessDefinition};

/// Pure structural equality between an activity in the source tree and its
/// same-id counterpart in the target tree.
///
/// Two activities are equal iff their ids are equal, their behavior classes
/// are compatible, and their flow-scope chains are elementwise equal. Every
/// intervening named scope matters: renaming, inserting or removing an
/// ancestor scope anywhere along the path breaks the match even when the
/// leaf ids coincide. Whether an activity is itself a scope is deliberately
/// ignored; a task may gain or lose scope-ness across versions.
pub struct ScopeChainMatcher<'a> {
    source: &'a ProcessDefinition,
    target: &'a ProcessDefinition,
}

impl<'a> ScopeChainMatcher<'a> {
    pub fn new(source: &'a ProcessDefinition, target: &'a ProcessDefinition) -> Self {
        Self { source, target }
    }

    /// Checks whether the activity with the given id matches its target
    /// counterpart. Boundary events additionally require their hosts to
    /// match independently: an event whose host does not migrate cannot
    /// migrate either.
    pub fn matches(&self, activity_id: &str) -> bool {
        let (Some(source_activity), Some(target_activity)) = (
            self.source.activity(activity_id),
            self.target.activity(activity_id),
        ) else {
            return false;
        };

        if source_activity.behavior.class() != target_activity.behavior.class() {
            return false;
        }

        if self.source.flow_scope_chain(activity_id) != self.target.flow_scope_chain(activity_id) {
            return false;
        }

        if source_activity.behavior.class() == BehaviorClass::BoundaryEvent {
            return self.hosts_match(
                source_activity.host_activity.as_deref(),
                target_activity.host_activity.as_deref(),
            );
        }

        true
    }

    fn hosts_match(&self, source_host: Option<&str>, target_host: Option<&str>) -> bool {
        let (Some(source_host), Some(target_host)) = (source_host, target_host) else {
            return false;
        };
        if source_host != target_host {
            return false;
        }
        // A boundary event cannot host another boundary event; refusing the
        // host here also bounds the recursion on malformed definitions.
        let host_is_event = self
            .source
            .activity(source_host)
            .map(|a| a.behavior.class() == BehaviorClass::BoundaryEvent)
            .unwrap_or(true);
        !host_is_event && self.matches(source_host)
    }
}
