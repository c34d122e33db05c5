use papermill::domain::TaskStatus;

#[test]
fn given_worker_success_vocabulary_when_mapping_then_status_is_completed() {
    for raw in ["success", "succeeded", "completed", "done", "SUCCESS"] {
        assert_eq!(
            TaskStatus::from_worker_status(raw),
            Some(TaskStatus::Completed),
            "raw status {raw}"
        );
    }
}

#[test]
fn given_worker_running_vocabulary_when_mapping_then_status_is_processing() {
    for raw in ["running", "processing", "started", "queued", "pending"] {
        assert_eq!(
            TaskStatus::from_worker_status(raw),
            Some(TaskStatus::Processing),
            "raw status {raw}"
        );
    }
}

#[test]
fn given_worker_failure_vocabulary_when_mapping_then_status_is_failed() {
    for raw in ["failed", "failure", "error", "cancelled"] {
        assert_eq!(
            TaskStatus::from_worker_status(raw),
            Some(TaskStatus::Failed),
            "raw status {raw}"
        );
    }
}

#[test]
fn given_unknown_worker_status_when_mapping_then_no_status_change() {
    assert_eq!(TaskStatus::from_worker_status("paused"), None);
    assert_eq!(TaskStatus::from_worker_status(""), None);
}

#[test]
fn given_terminal_statuses_when_checking_then_only_completed_and_failed_are_terminal() {
    assert!(TaskStatus::Completed.is_terminal());
    assert!(TaskStatus::Failed.is_terminal());
    assert!(!TaskStatus::Pending.is_terminal());
    assert!(!TaskStatus::Processing.is_terminal());
}

#[test]
fn given_terminal_status_when_transitioning_then_only_self_transition_is_allowed() {
    assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Processing));
    assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Failed));
    assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Pending));
    assert!(TaskStatus::Completed.can_transition_to(TaskStatus::Completed));
}

#[test]
fn given_processing_status_when_transitioning_then_pending_is_not_reachable() {
    assert!(!TaskStatus::Processing.can_transition_to(TaskStatus::Pending));
    assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Completed));
    assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Failed));
    assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Processing));
}

#[test]
fn given_status_when_round_tripping_through_str_then_value_is_preserved() {
    for status in [
        TaskStatus::Pending,
        TaskStatus::Processing,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ] {
        assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
    }
    assert!("bogus".parse::<TaskStatus>().is_err());
}
