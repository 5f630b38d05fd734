use flowmig::definition::builder::ProcessDefinitionBuilder;
use flowmig::definition::EventKind;
use flowmig::migration::error::InstructionRole;
use flowmig::migration::validation::PlanValidator;
use flowmig::migration::{MigrationError, MigrationPlan};

#[test]
fn test_builder_rejects_duplicate_source() {
    let result = MigrationPlan::builder("source", "target")
        .map_activities("userTask", "userTask1")
        .map_activities("userTask", "userTask2")
        .build();

    assert_eq!(result.unwrap_err(), MigrationError::DuplicateInstruction {
        activity_id: "userTask".to_string(),
        role: InstructionRole::Source,
    });
}

#[test]
fn test_builder_rejects_duplicate_target() {
    let result = MigrationPlan::builder("source", "target")
        .map_activities("userTask1", "userTask")
        .map_activities("userTask2", "userTask")
        .build();

    assert_eq!(result.unwrap_err(), MigrationError::DuplicateInstruction {
        activity_id: "userTask".to_string(),
        role: InstructionRole::Target,
    });
}

#[test]
fn test_builder_keeps_instruction_order() {
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("b", "b")
        .map_activities("a", "a")
        .build()
        .unwrap();

    assert_eq!(plan.target_for("b"), Some("b"));
    assert_eq!(plan.target_for("a"), Some("a"));
    assert_eq!(plan.target_for("c"), None);
    assert_eq!(plan.instructions().len(), 2);
}

#[test]
fn test_validator_rejects_unknown_source_activity() {
    let source = ProcessDefinitionBuilder::new("source").user_task("userTask").build();
    let target = ProcessDefinitionBuilder::new("target").user_task("userTask").build();
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("ghostTask", "userTask")
        .build()
        .unwrap();

    let error = PlanValidator::default().validate(&plan, &source, &target).unwrap_err();

    assert_eq!(error, MigrationError::UnknownActivity {
        activity_id: "ghostTask".to_string(),
        definition_id: "source".to_string(),
    });
}

#[test]
fn test_validator_rejects_unknown_target_activity() {
    let source = ProcessDefinitionBuilder::new("source").user_task("userTask").build();
    let target = ProcessDefinitionBuilder::new("target").user_task("userTask").build();
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("userTask", "ghostTask")
        .build()
        .unwrap();

    let error = PlanValidator::default().validate(&plan, &source, &target).unwrap_err();

    assert_eq!(error, MigrationError::UnknownActivity {
        activity_id: "ghostTask".to_string(),
        definition_id: "target".to_string(),
    });
}

#[test]
fn test_validator_rejects_unsupported_activity() {
    let build = |id: &str| {
        ProcessDefinitionBuilder::new(id)
            .unsupported("serviceTask", "serviceTask")
            .build()
    };
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("serviceTask", "serviceTask")
        .build()
        .unwrap();

    let error = PlanValidator::default()
        .validate(&plan, &build("source"), &build("target"))
        .unwrap_err();

    assert_eq!(error, MigrationError::UnsupportedActivity {
        activity_id: "serviceTask".to_string(),
    });
}

#[test]
fn test_validator_rejects_error_boundary_event() {
    let build = |id: &str| {
        ProcessDefinitionBuilder::new(id)
            .user_task("userTask")
            .boundary_event("errorEvent", "userTask", EventKind::Error)
            .build()
    };
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("errorEvent", "errorEvent")
        .build()
        .unwrap();

    let error = PlanValidator::default()
        .validate(&plan, &build("source"), &build("target"))
        .unwrap_err();

    assert_eq!(error, MigrationError::EventKindUnsupported {
        activity_id: "errorEvent".to_string(),
        event: EventKind::Error,
    });
}

#[test]
fn test_validator_rejects_misaligned_scope_chains() {
    // Both subprocesses are mapped, but the target nests them the other way
    // around; the mapped scopes no longer keep their relative order.
    let source = ProcessDefinitionBuilder::new("source")
        .sub_process("outerSubProcess")
            .sub_process("innerSubProcess")
                .user_task("userTask")
            .done()
        .done()
        .build();
    let target = ProcessDefinitionBuilder::new("target")
        .sub_process("innerSubProcess")
            .sub_process("outerSubProcess")
                .user_task("userTask")
            .done()
        .done()
        .build();
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("outerSubProcess", "outerSubProcess")
        .map_activities("innerSubProcess", "innerSubProcess")
        .map_activities("userTask", "userTask")
        .build()
        .unwrap();

    let error = PlanValidator::default().validate(&plan, &source, &target).unwrap_err();

    assert_eq!(error, MigrationError::ScopeMismatch {
        source_activity_id: "innerSubProcess".to_string(),
        target_activity_id: "innerSubProcess".to_string(),
    });
}

#[test]
fn test_validator_accepts_added_unmapped_scope() {
    // Migrating into a new subprocess is legal when that subprocess is not
    // itself part of the plan.
    let source = ProcessDefinitionBuilder::new("source")
        .user_task("userTask")
        .build();
    let target = ProcessDefinitionBuilder::new("target")
        .sub_process("subProcess")
            .user_task("userTask")
        .done()
        .build();
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("userTask", "userTask")
        .build()
        .unwrap();

    assert!(PlanValidator::default().validate(&plan, &source, &target).is_ok());
}

#[test]
fn test_validator_accepts_removed_unmapped_scope() {
    let source = ProcessDefinitionBuilder::new("source")
        .sub_process("subProcess")
            .user_task("userTask")
        .done()
        .build();
    let target = ProcessDefinitionBuilder::new("target")
        .user_task("userTask")
        .build();
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("userTask", "userTask")
        .build()
        .unwrap();

    assert!(PlanValidator::default().validate(&plan, &source, &target).is_ok());
}

#[test]
fn test_validator_accepts_renaming_instruction() {
    let source = ProcessDefinitionBuilder::new("source")
        .user_task("userTask")
        .build();
    let target = ProcessDefinitionBuilder::new("target")
        .user_task("renamedTask")
        .build();
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("userTask", "renamedTask")
        .build()
        .unwrap();

    assert!(PlanValidator::default().validate(&plan, &source, &target).is_ok());
}

#[test]
fn test_validator_accepts_explicit_multi_instance_instruction() {
    // The generator never proposes multi-instance activities, but a manual
    // instruction naming one passes validation.
    let build = |id: &str| {
        ProcessDefinitionBuilder::new(id)
            .parallel_multi_instance("miTask")
            .build()
    };
    let plan = MigrationPlan::builder("source", "target")
        .map_activities("miTask", "miTask")
        .build()
        .unwrap();

    assert!(PlanValidator::default()
        .validate(&plan, &build("source"), &build("target"))
        .is_ok());
}
