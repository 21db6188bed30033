use form_core::{CoreError, ErrorKind, FormFlowService, InMemoryStore, NewWorkflow, TransitionPolicy, WorkflowPatch};
use form_domain::{Action, ActionType, Conditional, ConditionalOperator, SubmissionMetadata, TriggerType, WorkflowStatus};
use serde_json::json;
use uuid::Uuid;

fn service() -> FormFlowService<InMemoryStore> {
    FormFlowService::new(InMemoryStore::new())
}

fn new_workflow(name: &str, owner: Uuid) -> NewWorkflow {
    NewWorkflow { name: name.to_string(),
                  description: Some("d".into()),
                  owner_id: owner,
                  schema_id: None,
                  trigger: None,
                  actions: vec![] }
}

#[test]
fn test_create_forces_draft_and_manual_trigger() {
    let svc = service();
    let ctx = svc.new_context();
    let wf = svc.create_workflow(&ctx, new_workflow("NPS", Uuid::new_v4())).unwrap();
    assert_eq!(wf.status, WorkflowStatus::Draft);
    assert_eq!(wf.trigger.trigger_type, TriggerType::Manual);

    let err = svc.create_workflow(&ctx, new_workflow("", Uuid::new_v4())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_draft_update_keeps_unspecified_fields() {
    let svc = service();
    let ctx = svc.new_context();
    let wf = svc.create_workflow(&ctx, new_workflow("orig", Uuid::new_v4())).unwrap();
    let actions = vec![Action::new(ActionType::SendEmail, Some(json!({"to": "ops@example.com"})))];
    let patch = WorkflowPatch { actions: Some(actions.clone()),
                                ..Default::default() };
    let updated = svc.update_workflow(&ctx, &wf.id.to_string(), &patch).unwrap();
    assert_eq!(updated.name, "orig");
    assert_eq!(updated.description.as_deref(), Some("d"));
    assert_eq!(updated.actions, actions);
    assert_eq!(svc.get_workflow(&ctx, &wf.id.to_string()).unwrap(), updated);
}

#[test]
fn test_update_after_activation_is_not_editable() {
    let svc = service();
    let ctx = svc.new_context();
    let wf = svc.create_workflow(&ctx, new_workflow("orig", Uuid::new_v4())).unwrap();
    let id = wf.id.to_string();

    for status in ["active", "paused", "stopped", "archived"] {
        svc.update_workflow_status(&ctx, &id, status).unwrap();
        let patch = WorkflowPatch { name: Some("changed".into()),
                                    ..Default::default() };
        let err = svc.update_workflow(&ctx, &id, &patch).unwrap_err();
        assert!(matches!(err, CoreError::NotEditable { .. }), "status {status}: {err:?}");
        assert_eq!(err.http_status(), 409);
    }
    // todo o nada: nada cambió
    assert_eq!(svc.get_workflow(&ctx, &id).unwrap().name, "orig");
}

#[test]
fn test_permissive_status_accepts_every_value_and_rejects_others() {
    let svc = service();
    let ctx = svc.new_context();
    let id = svc.create_workflow(&ctx, new_workflow("wf", Uuid::new_v4())).unwrap().id.to_string();
    for status in ["archived", "draft", "stopped", "active", "paused", "draft"] {
        let wf = svc.update_workflow_status(&ctx, &id, status).unwrap();
        assert_eq!(wf.status.as_str(), status);
    }
    for bad in ["deleted", "ACTIVE", ""] {
        let err = svc.update_workflow_status(&ctx, &id, bad).unwrap_err();
        assert_eq!(err, CoreError::InvalidStatus(bad.to_string()));
    }
    assert_eq!(svc.get_workflow(&ctx, &id).unwrap().status, WorkflowStatus::Draft);
}

#[test]
fn test_strict_policy_rejects_unlisted_edges() {
    let svc = service().with_policy(TransitionPolicy::Strict);
    let ctx = svc.new_context();
    let id = svc.create_workflow(&ctx, new_workflow("wf", Uuid::new_v4())).unwrap().id.to_string();
    svc.update_workflow_status(&ctx, &id, "active").unwrap();
    let err = svc.update_workflow_status(&ctx, &id, "draft").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidStatus);
    assert_eq!(svc.get_workflow(&ctx, &id).unwrap().status, WorkflowStatus::Active);
}

#[test]
fn test_delete_gate_and_subsequent_not_found() {
    let svc = service();
    let ctx = svc.new_context();
    let id = svc.create_workflow(&ctx, new_workflow("wf", Uuid::new_v4())).unwrap().id.to_string();
    svc.update_workflow_status(&ctx, &id, "active").unwrap();
    let sub = svc.submit(&ctx, &id, json!({"any": 1}), SubmissionMetadata::default()).unwrap();

    let err = svc.delete_workflow(&ctx, &id).unwrap_err();
    assert!(matches!(err, CoreError::HasDependents { count: 1, .. }));

    svc.delete_submission(&ctx, &sub.id.to_string()).unwrap();
    svc.delete_workflow(&ctx, &id).unwrap();
    assert_eq!(svc.get_workflow(&ctx, &id).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(svc.delete_workflow(&ctx, &id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_malformed_ids_are_invalid_input() {
    let svc = service();
    let ctx = svc.new_context();
    assert_eq!(svc.get_workflow(&ctx, "not-a-uuid").unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(svc.delete_workflow(&ctx, "42").unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(svc.list_workflows(&ctx, "").unwrap_err().kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_list_workflows_is_scoped_by_owner() {
    let svc = service();
    let ctx = svc.new_context();
    let (ana, bob) = (Uuid::new_v4(), Uuid::new_v4());
    svc.create_workflow(&ctx, new_workflow("a1", ana)).unwrap();
    svc.create_workflow(&ctx, new_workflow("b1", bob)).unwrap();
    svc.create_workflow(&ctx, new_workflow("a2", ana)).unwrap();
    let names: Vec<String> = svc.list_workflows(&ctx, &ana.to_string()).unwrap().into_iter().map(|w| w.name).collect();
    assert_eq!(names, vec!["a1", "a2"]);
}

#[test]
fn test_action_references_are_advisory() {
    let svc = service();
    let ctx = svc.new_context();
    let mut guarded = Action::new(ActionType::Notification, None);
    guarded.conditional = Some(Conditional::new("score", ConditionalOperator::Less, json!(7)));
    let mut req = new_workflow("wf", Uuid::new_v4());
    req.actions = vec![Action::new(ActionType::CallWebhook, None), guarded.clone()];
    let wf = svc.create_workflow(&ctx, req).unwrap();

    let dangling = svc.check_action_references(&ctx, &wf.id.to_string()).unwrap();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].action_id, guarded.id);
    assert_eq!(dangling[0].field_id, "score");
}
