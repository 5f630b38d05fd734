use std::collections::HashSet;
use std::sync::Arc;

use crate::definition::{Activity, BehaviorClass, ProcessDefinition};
use crate::migration::matcher::ScopeChainMatcher;
use crate::migration::plan::{MigrationInstruction, MigrationPlan};
use crate::migration::support::{admits, DefaultEventKindFilter, EventKindFilter, SupportRules};

/// Generates a migration plan by mapping equal activities between two
/// process definitions. Pure; never fails. Absence of matches yields an
/// empty plan.
pub struct InstructionGenerator {
    rules: SupportRules,
    event_filter: Arc<dyn EventKindFilter>,
}

impl Default for InstructionGenerator {
    fn default() -> Self {
        Self::new(SupportRules::default(), Arc::new(DefaultEventKindFilter))
    }
}

impl InstructionGenerator {
    pub fn new(rules: SupportRules, event_filter: Arc<dyn EventKindFilter>) -> Self {
        Self { rules, event_filter }
    }

    pub fn generate(&self, source: &ProcessDefinition, target: &ProcessDefinition) -> MigrationPlan {
        let matcher = ScopeChainMatcher::new(source, target);
        let mut instructions = Vec::new();
        let mut seen = HashSet::new();

        // Pre-order over the source tree keeps the output deterministic.
        for activity in source.preorder() {
            if !self.admissible(activity) {
                continue;
            }

            // Multi-instance scopes have runtime cardinality a 1:1 scope
            // match cannot represent; generation defers them to explicit
            // manual instructions.
            if activity.behavior.is_multi_instance() {
                continue;
            }

            let Some(target_activity) = target.activity(&activity.id) else {
                continue;
            };
            if !self.admissible(target_activity) {
                continue;
            }

            if !matcher.matches(&activity.id) {
                continue;
            }

            if activity.behavior.class() == BehaviorClass::BoundaryEvent
                && !self.host_admissible(activity, source, target, &matcher)
            {
                continue;
            }

            if seen.insert(activity.id.clone()) {
                instructions.push(MigrationInstruction::new(&activity.id, &activity.id));
            }
        }

        MigrationPlan::from_instructions(
            source.id.clone(),
            target.id.clone(),
            instructions,
        )
    }

    fn admissible(&self, activity: &Activity) -> bool {
        admits(&self.rules, self.event_filter.as_ref(), activity)
    }

    /// A boundary event migrates only if its host migrates: same host id on
    /// both sides, host supported, host chains aligned.
    fn host_admissible(
        &self,
        event: &Activity,
        source: &ProcessDefinition,
        target: &ProcessDefinition,
        matcher: &ScopeChainMatcher<'_>,
    ) -> bool {
        let Some(host_id) = event.host_activity.as_deref() else {
            return false;
        };
        let (Some(source_host), Some(target_host)) =
            (source.activity(host_id), target.activity(host_id))
        else {
            return false;
        };

        self.admissible(source_host) && self.admissible(target_host) && matcher.matches(host_id)
    }
}
