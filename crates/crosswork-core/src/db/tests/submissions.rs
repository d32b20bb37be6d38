use serde_json::json;

use crate::db::{NewSubmission, UpdateSubmission};
use crate::error::CoreError;
use crate::model::{SubmissionMode, SubmissionStatus};

use super::{draft_submission, new_assignment, open_test_db, published_assignment};

#[test]
fn test_create_requires_published_assignment() {
    let (_dir, db) = open_test_db();
    let assignment = db.create_assignment(new_assignment(2, SubmissionMode::Phased)).unwrap();

    let result = db.create_submission(NewSubmission {
        assignment_id: assignment.id,
        student_id: 7,
        ..NewSubmission::default()
    });
    assert!(matches!(result, Err(CoreError::InvalidState { .. })));
}

#[test]
fn test_create_rejects_out_of_range_phase() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 2, SubmissionMode::Phased);

    let result = db.create_submission(NewSubmission {
        assignment_id: assignment.id,
        student_id: 7,
        phase_index: 5,
        ..NewSubmission::default()
    });
    assert!(result.is_err());
}

#[test]
fn test_update_only_while_editable() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let edited = db
        .update_submission(
            submission.id,
            UpdateSubmission {
                content: json!({"text": "修改后"}).as_object().cloned(),
                ..UpdateSubmission::default()
            },
        )
        .unwrap();
    assert_eq!(edited.content["text"], json!("修改后"));

    db.submit_submission(submission.id).unwrap();
    let locked = db.update_submission(submission.id, UpdateSubmission::default());
    assert!(matches!(locked, Err(CoreError::InvalidState { .. })));
}

#[test]
fn test_submit_advances_to_next_phase_draft() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 3, SubmissionMode::Phased);
    let submission = draft_submission(&db, assignment.id, 7);

    let outcome = db.submit_submission(submission.id).unwrap();
    assert_eq!(outcome.submission.status, SubmissionStatus::Submitted);
    assert!(outcome.submission.submitted_at.is_some());

    let next_id = outcome.next_submission_id.unwrap();
    let next = db.get_submission(next_id).unwrap();
    assert_eq!(next.phase_index, 1);
    assert_eq!(next.status, SubmissionStatus::Draft);
    assert_eq!(next.student_id, 7);
}

#[test]
fn test_resubmit_reuses_next_phase_draft() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 3, SubmissionMode::Phased);
    let submission = draft_submission(&db, assignment.id, 7);

    let first = db.submit_submission(submission.id).unwrap();
    db.return_submission(submission.id).unwrap();
    let second = db.submit_submission(submission.id).unwrap();

    assert_eq!(first.next_submission_id, second.next_submission_id);
    let drafts = db.list_submissions(Some(assignment.id), Some(7)).unwrap();
    assert_eq!(drafts.len(), 2);
}

#[test]
fn test_submit_final_phase_has_no_next_draft() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 2, SubmissionMode::Phased);
    let last = db
        .create_submission(NewSubmission {
            assignment_id: assignment.id,
            student_id: 7,
            phase_index: 1,
            ..NewSubmission::default()
        })
        .unwrap();

    let outcome = db.submit_submission(last.id).unwrap();
    assert!(outcome.next_submission_id.is_none());
}

#[test]
fn test_single_shot_mode_never_advances() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 3, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let outcome = db.submit_submission(submission.id).unwrap();
    assert!(outcome.next_submission_id.is_none());
}

#[test]
fn test_submit_rejected_after_grading() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    db.submit_submission(submission.id).unwrap();
    db.mark_submission_graded(submission.id).unwrap();
    assert!(db.submit_submission(submission.id).is_err());
}

#[test]
fn test_return_requires_submitted_status() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    assert!(db.return_submission(submission.id).is_err());

    db.submit_submission(submission.id).unwrap();
    let returned = db.return_submission(submission.id).unwrap();
    assert_eq!(returned.status, SubmissionStatus::Returned);
    assert!(returned.status.editable());
}

#[test]
fn test_delete_only_drafts() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let draft = draft_submission(&db, assignment.id, 7);
    let submitted = draft_submission(&db, assignment.id, 8);
    db.submit_submission(submitted.id).unwrap();

    assert!(db.delete_submission(submitted.id).is_err());
    db.delete_submission(draft.id).unwrap();
    assert!(matches!(
        db.get_submission(draft.id),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn test_list_filters_by_assignment_and_student() {
    let (_dir, db) = open_test_db();
    let first = published_assignment(&db, 1, SubmissionMode::Once);
    let second = published_assignment(&db, 1, SubmissionMode::Once);
    draft_submission(&db, first.id, 7);
    draft_submission(&db, first.id, 8);
    draft_submission(&db, second.id, 7);

    assert_eq!(db.list_submissions(None, None).unwrap().len(), 3);
    assert_eq!(db.list_submissions(Some(first.id), None).unwrap().len(), 2);
    assert_eq!(db.list_submissions(None, Some(7)).unwrap().len(), 2);
    assert_eq!(db.list_submissions(Some(first.id), Some(7)).unwrap().len(), 1);
}
