use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use flowmig::definition::builder::ProcessDefinitionBuilder;
use flowmig::definition::ProcessDefinition;
use flowmig::runtime::builder::ExecutionTreeBuilder;
use flowmig::runtime::repository::{ExecutionRepository, InMemoryExecutionRepository};
use flowmig::service::MigrationService;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn one_task_process(id: &str) -> ProcessDefinition {
    ProcessDefinitionBuilder::new(id)
        .user_task("userTask")
        .build()
}

fn service_with(definitions: Vec<ProcessDefinition>) -> (MigrationService, Arc<InMemoryExecutionRepository>) {
    let repository = Arc::new(InMemoryExecutionRepository::default());
    let service = MigrationService::new(repository.clone());
    for definition in definitions {
        service.register_definition(definition);
    }
    (service, repository)
}

#[tokio::test]
async fn test_generate_and_migrate_single_task_instance() {
    init_tracing();
    let (service, repository) = service_with(vec![
        one_task_process("source"),
        one_task_process("target"),
    ]);

    let tree = ExecutionTreeBuilder::new("source")
        .root_leaf("userTask")
        .with_variable("foo", json!(42))
        .build();
    let instance_id = tree.instance_id;
    repository.commit(tree).await.unwrap();

    let plan = service.generate_plan("source", "target").unwrap();
    let report = service.migrate(&plan, instance_id).await.unwrap();

    assert_eq!(report.instance_id, instance_id);

    let migrated = repository.load(instance_id).await.unwrap().unwrap();
    assert_eq!(migrated.definition_id, "target");
    assert_eq!(migrated.leaves_at("userTask").len(), 1);
    assert_eq!(migrated.variables_named("foo").len(), 1);
}

#[tokio::test]
async fn test_migrate_into_subprocess_with_manual_plan() {
    init_tracing();
    let target = ProcessDefinitionBuilder::new("target")
        .sub_process("subProcess")
            .user_task("userTask")
        .done()
        .build();
    let (service, repository) = service_with(vec![one_task_process("source"), target]);

    let tree = ExecutionTreeBuilder::new("source")
        .root_leaf("userTask")
        .build();
    let instance_id = tree.instance_id;
    repository.commit(tree).await.unwrap();

    let plan = flowmig::migration::MigrationPlan::builder("source", "target")
        .map_activities("userTask", "userTask")
        .build()
        .unwrap();
    service.validate_plan(&plan).unwrap();
    service.migrate(&plan, instance_id).await.unwrap();

    let migrated = repository.load(instance_id).await.unwrap().unwrap();
    assert_eq!(migrated.len(), 2);
    assert!(migrated.scope_execution_for("subProcess").is_some());
}

#[tokio::test]
async fn test_migrate_unknown_instance_fails() {
    init_tracing();
    let (service, _) = service_with(vec![
        one_task_process("source"),
        one_task_process("target"),
    ]);

    let plan = service.generate_plan("source", "target").unwrap();
    let error = service.migrate(&plan, Uuid::new_v4()).await.unwrap_err();

    assert!(error.to_string().contains("Process instance not found"));
}

#[tokio::test]
async fn test_migrate_rejects_instance_of_other_definition() {
    init_tracing();
    let (service, repository) = service_with(vec![
        one_task_process("source"),
        one_task_process("target"),
        one_task_process("unrelated"),
    ]);

    let tree = ExecutionTreeBuilder::new("unrelated")
        .root_leaf("userTask")
        .build();
    let instance_id = tree.instance_id;
    repository.commit(tree).await.unwrap();

    let plan = service.generate_plan("source", "target").unwrap();
    let error = service.migrate(&plan, instance_id).await.unwrap_err();

    assert!(error.to_string().contains("runs definition 'unrelated'"));

    // The stored tree is untouched.
    let stored = repository.load(instance_id).await.unwrap().unwrap();
    assert_eq!(stored.definition_id, "unrelated");
}

#[tokio::test]
async fn test_failed_migration_leaves_stored_tree_unchanged() {
    init_tracing();
    let source = ProcessDefinitionBuilder::new("source")
        .scope_user_task("userTask1")
        .scope_user_task("userTask2")
        .build();
    let target = ProcessDefinitionBuilder::new("target")
        .user_task("userTask1")
        .user_task("userTask2")
        .build();
    let (service, repository) = service_with(vec![source, target]);

    // The conflicting variable pair makes the rewrite fail after validation.
    let tree = ExecutionTreeBuilder::new("source")
        .concurrent()
        .with_variable("foo", json!("parentValue"))
            .scope_leaf("userTask1")
            .with_variable("foo", json!("scopeValue"))
        .up()
        .concurrent()
            .scope_leaf("userTask2")
        .up()
        .build();
    let instance_id = tree.instance_id;
    let executions_before = tree.len();
    repository.commit(tree).await.unwrap();

    let plan = service.generate_plan("source", "target").unwrap();
    let error = service.migrate(&plan, instance_id).await.unwrap_err();
    assert!(error.to_string().contains("exists in both"));

    let stored = repository.load(instance_id).await.unwrap().unwrap();
    assert_eq!(stored.definition_id, "source");
    assert_eq!(stored.len(), executions_before);
    assert_eq!(stored.variables_named("foo").len(), 2);
}

#[tokio::test]
async fn test_generate_plan_requires_registered_definitions() {
    init_tracing();
    let (service, _) = service_with(vec![one_task_process("source")]);

    let error = service.generate_plan("source", "missing").unwrap_err();
    assert!(error.to_string().contains("Process definition not found"));
}

#[tokio::test]
async fn test_concurrent_migrations_of_different_instances() {
    init_tracing();
    let (service, repository) = service_with(vec![
        one_task_process("source"),
        one_task_process("target"),
    ]);
    let service = Arc::new(service);

    let mut instance_ids = Vec::new();
    for _ in 0..8 {
        let tree = ExecutionTreeBuilder::new("source")
            .root_leaf("userTask")
            .build();
        instance_ids.push(tree.instance_id);
        repository.commit(tree).await.unwrap();
    }

    let plan = Arc::new(service.generate_plan("source", "target").unwrap());
    let mut handles = Vec::new();
    for instance_id in instance_ids.clone() {
        let service = service.clone();
        let plan = plan.clone();
        handles.push(tokio::spawn(async move {
            service.migrate(&plan, instance_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for instance_id in instance_ids {
        let migrated = repository.load(instance_id).await.unwrap().unwrap();
        assert_eq!(migrated.definition_id, "target");
    }
}
