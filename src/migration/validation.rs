use std::sync::Arc;

use crate::definition::ProcessDefinition;
use crate::migration::error::MigrationError;
use crate::migration::plan::MigrationPlan;
use crate::migration::support::{DefaultEventKindFilter, EventKindFilter, SupportRules};

/// Validation of manually assembled migration plans. Generated plans are
/// valid by construction and never pass through here.
///
/// Multi-instance activities are accepted: the generator refuses to propose
/// them, but explicit instructions referencing them are legitimate.
pub struct PlanValidator {
    rules: SupportRules,
    event_filter: Arc<dyn EventKindFilter>,
}

impl Default for PlanValidator {
    fn default() -> Self {
        Self::new(SupportRules::default(), Arc::new(DefaultEventKindFilter))
    }
}

impl PlanValidator {
    pub fn new(rules: SupportRules, event_filter: Arc<dyn EventKindFilter>) -> Self {
        Self { rules, event_filter }
    }

    pub fn validate(
        &self,
        plan: &MigrationPlan,
        source: &ProcessDefinition,
        target: &ProcessDefinition,
    ) -> Result<(), MigrationError> {
        for instruction in plan.instructions() {
            let source_activity = source
                .activity(&instruction.source_activity_id)
                .ok_or_else(|| MigrationError::UnknownActivity {
                    activity_id: instruction.source_activity_id.clone(),
                    definition_id: source.id.clone(),
                })?;
            let target_activity = target
                .activity(&instruction.target_activity_id)
                .ok_or_else(|| MigrationError::UnknownActivity {
                    activity_id: instruction.target_activity_id.clone(),
                    definition_id: target.id.clone(),
                })?;

            for activity in [source_activity, target_activity] {
                if !self.rules.is_supported(activity) {
                    return Err(MigrationError::UnsupportedActivity {
                        activity_id: activity.id.clone(),
                    });
                }
                if let Some(event) = activity.behavior.event_kind() {
                    if !self.event_filter.accepts(event) {
                        return Err(MigrationError::EventKindUnsupported {
                            activity_id: activity.id.clone(),
                            event,
                        });
                    }
                }
            }

            // Manual instructions may rename the activity, so id equality is
            // not required; chain alignment is.
            let source_chain = source.flow_scope_chain(&instruction.source_activity_id);
            let target_chain = target.flow_scope_chain(&instruction.target_activity_id);
            if !self.chains_mapped(plan, &source_chain, &target_chain) {
                return Err(MigrationError::ScopeMismatch {
                    source_activity_id: instruction.source_activity_id.clone(),
                    target_activity_id: instruction.target_activity_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// A manual instruction may legitimately add or remove ancestor scopes.
    /// The chains are considered aligned when every scope that is mapped by
    /// the plan keeps its relative order; unmapped scopes are the ones being
    /// created or removed by the migration.
    fn chains_mapped(
        &self,
        plan: &MigrationPlan,
        source_chain: &[String],
        target_chain: &[String],
    ) -> bool {
        let mapped: Vec<&str> = source_chain
            .iter()
            .filter_map(|s| plan.target_for(s))
            .collect();

        let retained: Vec<&str> = target_chain
            .iter()
            .map(|t| t.as_str())
            .filter(|t| mapped.contains(t))
            .collect();

        mapped == retained
    }
}
