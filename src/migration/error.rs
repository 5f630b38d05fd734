use thiserror::Error;
use uuid::Uuid;
use crate::definition::EventKind;

/// Structured failures of plan construction, validation and execution.
/// Automatic generation never returns any of these; absence of a match is
/// reflected as plan emptiness.
#[derive(Debug, Error, PartialEq)]
pub enum MigrationError {
    #[error("Activity '{activity_id}' is not supported for migration")]
    UnsupportedActivity { activity_id: String },

    #[error("Activity '{activity_id}' does not exist in process definition '{definition_id}'")]
    UnknownActivity {
        activity_id: String,
        definition_id: String,
    },

    #[error(
        "Flow scope chains of source activity '{source_activity_id}' and target activity \
         '{target_activity_id}' do not align"
    )]
    ScopeMismatch {
        source_activity_id: String,
        target_activity_id: String,
    },

    #[error("Event kind {event:?} of activity '{activity_id}' cannot be migrated")]
    EventKindUnsupported {
        activity_id: String,
        event: EventKind,
    },

    #[error("Activity '{activity_id}' appears in more than one instruction as {role}")]
    DuplicateInstruction {
        activity_id: String,
        role: InstructionRole,
    },

    #[error(
        "The variable '{name}' exists in both, the scope execution {scope_execution} and \
         concurrent local in the parent execution {parent_execution}. Migrating to a non-scope \
         activity would overwrite one of them"
    )]
    VariableConflict {
        name: String,
        scope_execution: Uuid,
        parent_execution: Uuid,
    },

    #[error("Execution tree of instance {instance_id} does not line up with the source definition: {details}")]
    InconsistentTree { instance_id: Uuid, details: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionRole {
    Source,
    Target,
}

impl std::fmt::Display for InstructionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructionRole::Source => write!(f, "source"),
            InstructionRole::Target => write!(f, "target"),
        }
    }
}
