mod utils;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use deck_core::{Approval, Discrepancy, FolderRef};
use deck_engine::{AttemptFailure, Event, Outcome, PublisherSettings, Stage};
use deck_storage::RecordStore;
use utils::*;

#[tokio::test]
async fn test_clean_batch_is_delivered_once() {
    let harness = Harness::new(UploadScript::default());
    let folder = FolderRef::new("19102026_1430_UTC_morning_routine");

    let report = harness
        .publisher(settings())
        .run(plan(5), folder.clone())
        .await
        .unwrap();

    assert!(report.is_delivered(), "{:?}", report.outcome);
    assert_eq!(report.attempts(), 1);
    assert!(report.history().is_empty());
    assert_eq!(harness.notifier.call_count(), 1);
    assert_eq!(report.notify_count(), 1);
    assert_notify_gated(report.trace());
    assert_eq!(
        &report.trace()[report.trace().len() - 2..],
        &[Event::NotifyRequested, Event::Notified { ok: true }]
    );

    let calls = harness.notifier.calls.lock().unwrap();
    let (recipients, subject, body) = &calls[0];
    assert_eq!(recipients, &vec!["admin@example.com".to_string()]);
    assert!(subject.contains("Morning routine"));
    assert!(body.contains(&format!("mem://{}", folder)));

    assert_eq!(
        harness.drive.names(&folder),
        vec![
            "manifest.json",
            "slide_1.png",
            "slide_2.png",
            "slide_3.png",
            "slide_4.png",
            "slide_5.png"
        ]
    );
}

#[tokio::test]
async fn test_missing_ordinal_retries_with_feedback() {
    let script = UploadScript {
        drop_ordinals: HashMap::from([(1, vec![3])]),
        ..UploadScript::default()
    };
    let harness = Harness::new(script);

    let report = harness
        .publisher(settings())
        .run(plan(5), FolderRef::new("deck"))
        .await
        .unwrap();

    assert!(report.is_delivered());
    assert_eq!(report.attempts(), 2);
    assert_eq!(harness.uploader.upload_calls(), 2);

    let feedback = harness.uploader.feedback.lock().unwrap();
    assert!(feedback[0].is_empty());
    assert_eq!(feedback[1], vec![Discrepancy::MissingOrdinal { ordinal: 3 }]);

    assert!(matches!(
        report.history(),
        [AttemptFailure::Verify1 { attempt: 1, .. }]
    ));
    assert_eq!(harness.notifier.call_count(), 1);
    assert_notify_gated(report.trace());
}

#[tokio::test]
async fn test_missing_manifest_exhausts_budget() {
    let script = UploadScript {
        skip_manifest: true,
        ..UploadScript::default()
    };
    let harness = Harness::new(script);

    let report = harness
        .publisher(settings())
        .run(plan(3), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert_eq!(
        report.outcome,
        Outcome::Failed {
            reason: "delivery not verified after 3 attempts".to_string()
        }
    );
    assert_eq!(harness.uploader.upload_calls(), 3);
    assert_eq!(report.history().len(), 3);
    assert!(
        report
            .history()
            .iter()
            .all(|f| f.discrepancies() == [Discrepancy::ManifestMissing])
    );
    assert_eq!(harness.notifier.call_count(), 0);
    assert_eq!(report.notify_count(), 0);
}

#[tokio::test]
async fn test_custom_ceiling_is_exact() {
    let script = UploadScript {
        skip_manifest: true,
        ..UploadScript::default()
    };
    let harness = Harness::new(script);
    let settings = PublisherSettings {
        max_attempts: 5,
        ..settings()
    };

    let report = harness
        .publisher(settings)
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert_eq!(harness.uploader.upload_calls(), 5);
    assert_eq!(report.attempts(), 5);
}

#[tokio::test]
async fn test_single_attempt_budget_never_retries() {
    let script = UploadScript {
        drop_ordinals: HashMap::from([(1, vec![1])]),
        ..UploadScript::default()
    };
    let harness = Harness::new(script);
    let settings = PublisherSettings {
        max_attempts: 1,
        ..settings()
    };

    let report = harness
        .publisher(settings)
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert_eq!(harness.uploader.upload_calls(), 1);
    assert!(matches!(&report.outcome, Outcome::Failed { reason } if reason.ends_with("1 attempt")));
}

#[tokio::test]
async fn test_independent_check_catches_what_uploader_missed() {
    let script = UploadScript {
        tamper_after_check: HashSet::from([1]),
        ..UploadScript::default()
    };
    let harness = Harness::new(script);

    let report = harness
        .publisher(settings())
        .run(plan(4), FolderRef::new("deck"))
        .await
        .unwrap();

    assert!(report.is_delivered());
    assert_eq!(report.attempts(), 2);
    assert!(matches!(
        report.history(),
        [AttemptFailure::Verify2 { attempt: 1, .. }]
    ));

    // The second attempt is told what the independent pass saw
    let feedback = harness.uploader.feedback.lock().unwrap();
    assert_eq!(feedback[1], vec![Discrepancy::MissingOrdinal { ordinal: 1 }]);

    let trace = report.trace();
    assert!(trace.contains(&Event::Verify1 { attempt: 1, ok: true }));
    assert!(trace.contains(&Event::Verify2 { attempt: 1, ok: false }));
    assert_notify_gated(trace);
    assert_eq!(harness.notifier.call_count(), 1);
}

#[tokio::test]
async fn test_transport_error_consumes_an_attempt() {
    let script = UploadScript {
        transport_errors: HashSet::from([1]),
        ..UploadScript::default()
    };
    let harness = Harness::new(script);

    let report = harness
        .publisher(settings())
        .run(plan(3), FolderRef::new("deck"))
        .await
        .unwrap();

    assert!(report.is_delivered());
    assert_eq!(report.attempts(), 2);
    assert!(matches!(
        report.history(),
        [AttemptFailure::Transport { attempt: 1, .. }]
    ));
    assert!(report.trace().contains(&Event::UploadFailed { attempt: 1 }));

    // Transport failures carry no discrepancies to hand back
    assert!(harness.uploader.feedback.lock().unwrap()[1].is_empty());
}

#[tokio::test]
async fn test_render_failure_stops_before_upload() {
    let harness = Harness::new(UploadScript::default()).with_renderer(FakeRenderer {
        fail_on: Some(2),
        ..FakeRenderer::default()
    });

    let report = harness
        .publisher(settings())
        .run(plan(4), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert!(matches!(&report.outcome, Outcome::Failed { reason } if reason.contains("slide 2")));
    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.uploader.upload_calls(), 0);
    assert_eq!(report.attempts(), 0);
    assert!(report.trace().contains(&Event::RenderFailed { ordinal: 2 }));
    assert_eq!(harness.notifier.call_count(), 0);
}

#[tokio::test]
async fn test_notify_failure_keeps_delivery() {
    let harness = Harness::new(UploadScript::default()).with_notifier(RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    });

    let report = harness
        .publisher(settings())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Done);
    match &report.outcome {
        Outcome::Delivered {
            notify_warning: Some(warning),
            ..
        } => assert!(warning.contains("554")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(harness.notifier.call_count(), 1);
    assert!(report.trace().contains(&Event::Notified { ok: false }));
}

#[tokio::test]
async fn test_no_recipients_skips_notification() {
    let harness = Harness::new(UploadScript::default());

    let report = harness
        .publisher(PublisherSettings::default())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert!(report.is_delivered());
    assert!(report.record.notify_warning.is_some());
    assert_eq!(harness.notifier.call_count(), 0);
}

#[tokio::test]
async fn test_unreachable_folder_is_access_failure() {
    let harness = Harness::new(UploadScript::default());
    harness.drive.set_unreachable(true);

    let report = harness
        .publisher(settings())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert_eq!(report.history().len(), 3);
    assert!(report.history().iter().all(|f| f.is_access_failure()));
    assert_eq!(harness.notifier.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_plan_is_rejected_up_front() {
    let harness = Harness::new(UploadScript::default());
    let mut bad = plan(3);
    bad.units.remove(1);

    let result = harness
        .publisher(settings())
        .run(bad, FolderRef::new("deck"))
        .await;

    assert!(result.is_err());
    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_gate_approval_runs_pipeline() {
    let harness = Harness::new(UploadScript::default());
    let gate = Arc::new(ScriptedGate::new(Approval::Approved));
    let settings = PublisherSettings {
        require_approval: true,
        ..settings()
    };

    let report = harness
        .publisher(settings)
        .with_gate(gate.clone())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert!(report.is_delivered());
    assert_eq!(gate.requests.load(Ordering::SeqCst), 1);
    assert_eq!(
        &report.trace()[..2],
        &[Event::ApprovalRequested, Event::Approved]
    );
}

#[tokio::test]
async fn test_gate_rejection_stops_before_render() {
    let harness = Harness::new(UploadScript::default());
    let gate = Arc::new(ScriptedGate::new(Approval::Rejected {
        reason: "hook is too long".to_string(),
    }));
    let settings = PublisherSettings {
        require_approval: true,
        ..settings()
    };

    let report = harness
        .publisher(settings)
        .with_gate(gate)
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Rejected {
            reason: "hook is too long".to_string()
        }
    );
    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.uploader.upload_calls(), 0);
}

#[tokio::test]
async fn test_pause_for_review_then_resume_from_store() {
    let temp = tempfile::tempdir().unwrap();
    let records = Arc::new(RecordStore::new(temp.path()).unwrap());
    let harness = Harness::new(UploadScript::default());
    let settings = PublisherSettings {
        require_approval: true,
        ..settings()
    };
    let publisher = harness.publisher(settings).with_records(records.clone());

    let paused = publisher
        .run(plan(3), FolderRef::new("deck"))
        .await
        .unwrap();
    assert_eq!(paused.outcome, Outcome::AwaitingApproval);
    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 0);

    let stored: deck_engine::BatchRecord = records.load("batch-3").await.unwrap();
    assert_eq!(stored.stage, Stage::AwaitingApproval);

    let approved = publisher.apply_approval(stored, Approval::Approved);
    let report = publisher.resume(approved).await;
    assert!(report.is_delivered());

    let persisted: deck_engine::BatchRecord = records.load("batch-3").await.unwrap();
    assert_eq!(persisted.stage, Stage::Done);
    assert_eq!(persisted.trace, report.record.trace);
}

#[tokio::test]
async fn test_resume_at_notify_verifies_again() {
    let harness = Harness::new(UploadScript::default());
    let publisher = harness.publisher(settings());
    let folder = FolderRef::new("deck");

    let mut record = publisher.prepare(plan(2), folder.clone()).unwrap();
    record.stage = Stage::Notify;
    record.link = Some(deck_core::FolderLink("mem://deck".to_string()));

    // Nothing was ever uploaded, so the re-check must fail and retry
    harness.drive.put(&folder, Vec::new());
    let report = publisher.resume(record).await;

    assert!(matches!(
        report.history().first(),
        Some(AttemptFailure::Verify2 { .. })
    ));
    assert!(report.is_delivered());
    assert_notify_gated(report.trace());
}

#[tokio::test]
async fn test_approval_ignored_outside_review() {
    let harness = Harness::new(UploadScript::default());
    let publisher = harness.publisher(settings());

    let record = publisher.prepare(plan(1), FolderRef::new("deck")).unwrap();
    let unchanged = publisher.apply_approval(
        record.clone(),
        Approval::Rejected {
            reason: "late".into(),
        },
    );
    assert_eq!(unchanged, record);
}

#[tokio::test]
async fn test_render_timeout_fails_batch() {
    let harness = Harness::new(UploadScript::default()).with_renderer(FakeRenderer {
        hang: true,
        ..FakeRenderer::default()
    });

    let report = harness
        .publisher(impatient_settings())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert!(matches!(&report.outcome, Outcome::Failed { reason } if reason.contains("timed out")));
    assert_eq!(harness.uploader.upload_calls(), 0);
}

#[tokio::test]
async fn test_upload_timeout_is_transport_failure() {
    let script = UploadScript {
        hang: true,
        ..UploadScript::default()
    };
    let harness = Harness::new(script);

    let report = harness
        .publisher(impatient_settings())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert_eq!(harness.uploader.upload_calls(), 3);
    assert_eq!(report.history().len(), 3);
    for failure in report.history() {
        match failure {
            AttemptFailure::Transport { error, .. } => assert!(error.0.contains("timed out")),
            other => panic!("expected transport failure, got {other}"),
        }
    }
    assert_eq!(harness.notifier.call_count(), 0);
}

#[tokio::test]
async fn test_verification_timeout_is_access_failure() {
    let harness = Harness::new(UploadScript::default());
    harness.drive.set_stalled(true);

    let report = harness
        .publisher(impatient_settings())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Failed);
    assert_eq!(report.history().len(), 3);
    assert!(report.history().iter().all(|f| f.is_access_failure()));
    assert!(report.history()[0].to_string().contains("timed out"));
    assert_eq!(harness.notifier.call_count(), 0);
}

#[tokio::test]
async fn test_notify_timeout_keeps_delivery() {
    let harness = Harness::new(UploadScript::default()).with_notifier(RecordingNotifier {
        hang: true,
        ..RecordingNotifier::default()
    });

    let report = harness
        .publisher(impatient_settings())
        .run(plan(2), FolderRef::new("deck"))
        .await
        .unwrap();

    assert_eq!(report.record.stage, Stage::Done);
    match &report.outcome {
        Outcome::Delivered {
            notify_warning: Some(warning),
            ..
        } => assert!(warning.contains("timed out")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(report.trace().contains(&Event::Notified { ok: false }));
}

#[tokio::test]
async fn test_interrupted_notify_is_not_repeated() {
    let harness = Harness::new(UploadScript::default());
    let publisher = harness.publisher(settings());

    let mut record = publisher.prepare(plan(2), FolderRef::new("deck")).unwrap();
    record.stage = Stage::Notify;
    record.link = Some(deck_core::FolderLink("mem://deck".to_string()));
    record.trace.push(Event::Verify2 { attempt: 1, ok: true });
    record.trace.push(Event::NotifyRequested);

    let report = publisher.resume(record).await;

    assert_eq!(report.record.stage, Stage::Done);
    assert!(report.record.notify_warning.is_some());
    assert_eq!(harness.notifier.call_count(), 0);
    assert_eq!(harness.uploader.upload_calls(), 0);
}

#[tokio::test]
async fn test_folder_owned_by_another_batch_is_refused() {
    let temp = tempfile::tempdir().unwrap();
    let records = Arc::new(RecordStore::new(temp.path()).unwrap());
    let harness = Harness::new(UploadScript::default());
    let shared = FolderRef::new("shared");

    let reviewed = harness
        .publisher(PublisherSettings {
            require_approval: true,
            ..settings()
        })
        .with_records(records.clone());
    let direct = harness.publisher(settings()).with_records(records.clone());

    // Paused batch still owns its folder
    let paused = reviewed.run(plan(2), shared.clone()).await.unwrap();
    assert_eq!(paused.outcome, Outcome::AwaitingApproval);

    let refused = direct.run(plan(3), shared.clone()).await;
    assert!(matches!(refused, Err(deck_core::Error::InvalidBatch(_))));
    assert_eq!(harness.uploader.upload_calls(), 0);

    let stored: deck_engine::BatchRecord = records.load("batch-2").await.unwrap();
    let delivered = reviewed
        .resume(reviewed.apply_approval(stored, Approval::Approved))
        .await;
    assert!(delivered.is_delivered());

    // A delivered batch keeps it
    let refused = direct.run(plan(4), shared.clone()).await;
    assert!(matches!(refused, Err(deck_core::Error::InvalidBatch(_))));
    assert_eq!(harness.drive.names(&shared).len(), 3);

    // Other folders are unaffected
    assert!(direct.run(plan(3), FolderRef::new("other")).await.unwrap().is_delivered());
}
