use serde::{Serialize, Deserialize};
use std::collections::HashSet;

use crate::migration::error::{InstructionRole, MigrationError};

/// A proposed mapping of one source activity onto one target activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MigrationInstruction {
    pub source_activity_id: String,
    pub target_activity_id: String,
}

impl MigrationInstruction {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source_activity_id: source.to_string(),
            target_activity_id: target.to_string(),
        }
    }
}

/// An ordered, deduplicated set of migration instructions between two
/// process definitions. Immutable once built; the sole artifact crossing the
/// generator/executor boundary.
///
/// Invariant: no source and no target activity id appears in more than one
/// instruction; the mapping is partially injective both ways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub source_definition_id: String,
    pub target_definition_id: String,
    instructions: Vec<MigrationInstruction>,
}

impl MigrationPlan {
    /// Starts a manually assembled plan. Generated plans come out of
    /// [`crate::migration::generator::InstructionGenerator`] instead.
    pub fn builder(source_definition_id: &str, target_definition_id: &str) -> MigrationPlanBuilder {
        MigrationPlanBuilder {
            source_definition_id: source_definition_id.to_string(),
            target_definition_id: target_definition_id.to_string(),
            instructions: Vec::new(),
        }
    }

    pub(crate) fn from_instructions(
        source_definition_id: String,
        target_definition_id: String,
        instructions: Vec<MigrationInstruction>,
    ) -> Self {
        Self {
            source_definition_id,
            target_definition_id,
            instructions,
        }
    }

    pub fn instructions(&self) -> &[MigrationInstruction] {
        &self.instructions
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The target mapped to a source activity, if any.
    pub fn target_for(&self, source_activity_id: &str) -> Option<&str> {
        self.instructions
            .iter()
            .find(|i| i.source_activity_id == source_activity_id)
            .map(|i| i.target_activity_id.as_str())
    }
}

pub struct MigrationPlanBuilder {
    source_definition_id: String,
    target_definition_id: String,
    instructions: Vec<MigrationInstruction>,
}

impl MigrationPlanBuilder {
    pub fn map_activities(mut self, source: &str, target: &str) -> Self {
        self.instructions.push(MigrationInstruction::new(source, target));
        self
    }

    /// Enforces the injectivity invariant; everything beyond that (support,
    /// chain alignment) is the plan validator's business.
    pub fn build(self) -> Result<MigrationPlan, MigrationError> {
        let mut sources = HashSet::new();
        let mut targets = HashSet::new();

        for instruction in &self.instructions {
            if !sources.insert(instruction.source_activity_id.clone()) {
                return Err(MigrationError::DuplicateInstruction {
                    activity_id: instruction.source_activity_id.clone(),
                    role: InstructionRole::Source,
                });
            }
            if !targets.insert(instruction.target_activity_id.clone()) {
                return Err(MigrationError::DuplicateInstruction {
                    activity_id: instruction.target_activity_id.clone(),
                    role: InstructionRole::Target,
                });
            }
        }

        Ok(MigrationPlan {
            source_definition_id: self.source_definition_id,
            target_definition_id: self.target_definition_id,
            instructions: self.instructions,
        })
    }
}
