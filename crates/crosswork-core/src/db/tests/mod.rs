mod evaluations;
mod submissions;

use serde_json::json;
use tempfile::TempDir;

use crate::config::Settings;
use crate::db::{Database, NewAssignment, NewSubmission};
use crate::model::{Assignment, AssignmentType, SchoolStage, Submission, SubmissionMode};

pub(crate) fn open_test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path(), &Settings::default()).unwrap();
    (dir, db)
}

pub(crate) fn new_assignment(phase_count: usize, mode: SubmissionMode) -> NewAssignment {
    let phases: Vec<_> = (1..=phase_count)
        .map(|i| json!({"name": format!("阶段{}", i), "order": i}))
        .collect();
    NewAssignment {
        title: "校园节水调查".to_string(),
        topic: Some("节水".to_string()),
        description: "围绕校园用水开展调查".to_string(),
        school_stage: SchoolStage::Primary,
        grade: 5,
        main_subject_id: 1,
        related_subject_ids: vec![2, 4],
        assignment_type: AssignmentType::Inquiry,
        submission_mode: mode,
        duration_weeks: 2,
        created_by: 10,
        content: Some(json!({ "phases": phases })),
    }
}

/// Create and publish an assignment with the given number of phases
pub(crate) fn published_assignment(
    db: &Database,
    phase_count: usize,
    mode: SubmissionMode,
) -> Assignment {
    let assignment = db.create_assignment(new_assignment(phase_count, mode)).unwrap();
    db.publish_assignment(assignment.id).unwrap()
}

pub(crate) fn draft_submission(db: &Database, assignment_id: i64, student_id: i64) -> Submission {
    db.create_submission(NewSubmission {
        assignment_id,
        student_id,
        phase_index: 0,
        content: json!({"text": "初稿"}).as_object().unwrap().clone(),
        ..NewSubmission::default()
    })
    .unwrap()
}
