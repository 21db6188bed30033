mod test_support;

use form_core::{CallContext, CoreError, ErrorKind, FormFlowService, NewForm, NewWorkflow, WorkflowPatch};
use form_core::{StoreError, SubmissionStore, WorkflowStore};
use form_domain::{Conditional, ConditionalOperator, Field, FieldType, SubmissionMetadata, SubmissionStatus, WorkflowStatus};
use serde_json::json;
use std::time::{Duration, Instant};
use test_support::with_store;
use uuid::Uuid;

fn new_workflow(owner: Uuid, schema_id: Option<Uuid>) -> NewWorkflow {
    NewWorkflow { name: "pg flow".into(),
                  description: None,
                  owner_id: owner,
                  schema_id,
                  trigger: None,
                  actions: vec![] }
}

#[test]
fn test_full_lifecycle_against_postgres() {
    with_store(|store| {
        let svc = FormFlowService::new(store);
        let ctx = svc.new_context();
        let owner = Uuid::new_v4();
        let fields = vec![Field::new("age", FieldType::Number, "Age").required(),
                          Field::new("guardianName", FieldType::Text, "Guardian").required()
                                                                            .with_conditional(Conditional::new("age",
                                                                                                               ConditionalOperator::Less,
                                                                                                               json!(18)))];
        let form = svc.create_form(&ctx,
                                   NewForm { name: "signup".into(),
                                             description: None,
                                             owner_id: owner,
                                             fields })
                      .unwrap();
        assert_eq!(svc.get_form(&ctx, &form.id.to_string()).unwrap().fields, form.fields);

        let wf = svc.create_workflow(&ctx, new_workflow(owner, Some(form.id))).unwrap();
        let id = wf.id.to_string();
        let renamed = svc.update_workflow(&ctx,
                                          &id,
                                          &WorkflowPatch { name: Some("renamed".into()),
                                                           ..Default::default() })
                         .unwrap();
        assert_eq!(svc.get_workflow(&ctx, &id).unwrap().name, renamed.name);

        let err = svc.submit(&ctx, &id, json!({"age": 30}), SubmissionMetadata::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAccepting);

        svc.update_workflow_status(&ctx, &id, "active").unwrap();
        let err = svc.update_workflow(&ctx, &id, &WorkflowPatch::default()).unwrap_err();
        assert!(matches!(err, CoreError::NotEditable { status: WorkflowStatus::Active, .. }));

        let minor = svc.submit(&ctx, &id, json!({"age": 12}), SubmissionMetadata::default()).unwrap_err();
        assert_eq!(minor.kind(), ErrorKind::ValidationFailed);
        let sub = svc.submit(&ctx, &id, json!({"age": 30}), SubmissionMetadata::default()).unwrap();
        assert_eq!(sub.status, SubmissionStatus::Pending);
        assert_eq!(svc.list_submissions_by_owner(&ctx, &owner.to_string()).unwrap().len(), 1);

        let processed = svc.update_submission_status(&ctx, &sub.id.to_string(), "completed").unwrap();
        assert_eq!(processed.status, SubmissionStatus::Completed);
        assert_eq!(processed.data, sub.data);

        assert_eq!(svc.delete_workflow(&ctx, &id).unwrap_err().kind(), ErrorKind::HasDependents);
        svc.delete_submission(&ctx, &sub.id.to_string()).unwrap();
        svc.delete_workflow(&ctx, &id).unwrap();
        assert_eq!(svc.get_workflow(&ctx, &id).unwrap_err().kind(), ErrorKind::NotFound);
        svc.delete_form(&ctx, &form.id.to_string()).unwrap();
    });
}

#[test]
fn test_guarded_operations_report_store_errors() {
    with_store(|store| {
        let svc = FormFlowService::new(store);
        let ctx = CallContext::background();
        let wf = svc.create_workflow(&ctx, new_workflow(Uuid::new_v4(), None)).unwrap();
        let store = svc.store();

        assert_eq!(store.delete_workflow_if_unreferenced(&ctx, Uuid::new_v4()), Err(StoreError::NotFound));
        let sub = form_domain::Submission::new_pending(wf.id, None, Default::default(), SubmissionMetadata::default(), None);
        assert_eq!(store.insert_submission_if_accepting(&ctx, &sub),
                   Err(StoreError::StatusMismatch(WorkflowStatus::Draft)));
        assert_eq!(store.count_submissions(&ctx, wf.id).unwrap(), 0);
        svc.delete_workflow(&ctx, &wf.id.to_string()).unwrap();
    });
}

#[test]
fn test_expired_context_never_reaches_the_database() {
    with_store(|store| {
        let expired = CallContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(store.get_workflow(&expired, Uuid::new_v4()), Err(StoreError::DeadlineExceeded));
        let cancelled = CallContext::background();
        cancelled.cancel();
        assert_eq!(store.count_submissions(&cancelled, Uuid::new_v4()), Err(StoreError::Cancelled));
    });
}

#[test]
fn test_cancel_during_transaction_rolls_back() {
    with_store(|store| {
        let svc = FormFlowService::new(store);
        let ctx = CallContext::background();
        let wf = svc.create_workflow(&ctx, new_workflow(Uuid::new_v4(), None)).unwrap();
        let store = svc.store();

        let call = CallContext::with_timeout(Duration::from_secs(5));
        let cancel_midway = |_: WorkflowStatus| {
            call.cancel();
            true
        };
        let res = store.transition_workflow_status(&call, wf.id, WorkflowStatus::Active, &cancel_midway, chrono::Utc::now());
        assert_eq!(res.unwrap_err(), StoreError::Cancelled);
        assert_eq!(store.get_workflow(&ctx, wf.id).unwrap().unwrap().status, WorkflowStatus::Draft);
        svc.delete_workflow(&ctx, &wf.id.to_string()).unwrap();
    });
}
