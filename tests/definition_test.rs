use flowmig::definition::builder::ProcessDefinitionBuilder;
use flowmig::definition::{BehaviorClass, BehaviorKind, EventKind};

#[test]
fn test_flow_scope_chain_excludes_root_and_self() {
    let def = ProcessDefinitionBuilder::new("proc")
        .sub_process("outer")
            .sub_process("inner")
                .user_task("userTask")
            .done()
        .done()
        .build();

    assert_eq!(def.flow_scope_chain("userTask"), vec!["outer", "inner"]);
    assert_eq!(def.flow_scope_chain("inner"), vec!["outer"]);
    assert!(def.flow_scope_chain("outer").is_empty());
}

#[test]
fn test_chain_skips_non_scope_parents() {
    // A boundary event host chain: the event sits in the host's flow scope.
    let def = ProcessDefinitionBuilder::new("proc")
        .sub_process("subProcess")
            .user_task("userTask")
            .boundary_event("message", "userTask", EventKind::Message)
        .done()
        .build();

    assert_eq!(def.flow_scope_chain("message"), vec!["subProcess"]);
    let event = def.activity("message").unwrap();
    assert_eq!(event.host_activity.as_deref(), Some("userTask"));
    assert_eq!(event.behavior.class(), BehaviorClass::BoundaryEvent);
}

#[test]
fn test_preorder_follows_declaration_order() {
    let def = ProcessDefinitionBuilder::new("proc")
        .user_task("a")
        .sub_process("sub")
            .user_task("b")
            .user_task("c")
        .done()
        .user_task("d")
        .build();

    let order: Vec<&str> = def.preorder().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(order, vec!["a", "sub", "b", "c", "d"]);
}

#[test]
fn test_multi_instance_activities_are_scopes() {
    let def = ProcessDefinitionBuilder::new("proc")
        .parallel_multi_instance("miTask")
        .build();

    let activity = def.activity("miTask").unwrap();
    assert!(activity.is_scope);
    assert!(activity.behavior.is_multi_instance());
    assert_eq!(activity.behavior, BehaviorKind::ParallelMultiInstance);
}
