use serde_json::json;

use crate::db::NewEvaluation;
use crate::error::CoreError;
use crate::model::{EvaluatorRole, Level, SubmissionMode, SubmissionStatus};

use super::{draft_submission, open_test_db, published_assignment};

fn teacher_evaluation(submission_id: i64) -> NewEvaluation {
    NewEvaluation {
        submission_id,
        evaluator_id: 10,
        role: EvaluatorRole::Teacher,
        score_numeric: None,
        score_level: None,
        dimension_scores: serde_json::Map::new(),
        feedback: "继续加油".to_string(),
        ai_generated: false,
    }
}

#[test]
fn test_teacher_numeric_score_grades_submission() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);
    db.submit_submission(submission.id).unwrap();

    let response = db
        .record_evaluation(NewEvaluation {
            score_numeric: Some(4),
            ..teacher_evaluation(submission.id)
        })
        .unwrap();

    assert_eq!(response.evaluation.score_numeric, 4);
    assert_eq!(response.evaluation.score_level, Level::Excellent);
    assert_eq!(response.score_level_label, "优秀");
    // The explicit score also seeds every unsupplied rubric dimension
    assert!(response.evaluation.dimension_scores.values().all(|&s| s == 4));
    assert_eq!(response.evaluation.dimension_scores.len(), 5);

    let graded = db.get_submission(submission.id).unwrap();
    assert_eq!(graded.status, SubmissionStatus::Graded);
}

#[test]
fn test_out_of_range_numeric_is_a_usage_error() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let result = db.record_evaluation(NewEvaluation {
        score_numeric: Some(9),
        ..teacher_evaluation(submission.id)
    });
    assert!(matches!(result, Err(CoreError::InvalidValue { .. })));
}

#[test]
fn test_legacy_level_forms_map_to_canonical() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);

    let from_letter = db
        .record_evaluation(NewEvaluation {
            score_level: Some(json!("A")),
            ..teacher_evaluation(draft_submission(&db, assignment.id, 7).id)
        })
        .unwrap();
    assert_eq!(from_letter.evaluation.score_numeric, 4);
    assert_eq!(from_letter.evaluation.score_level, Level::Excellent);

    let from_percentage = db
        .record_evaluation(NewEvaluation {
            score_level: Some(json!(80)),
            ..teacher_evaluation(draft_submission(&db, assignment.id, 8).id)
        })
        .unwrap();
    assert_eq!(from_percentage.evaluation.score_numeric, 3);
    assert_eq!(from_percentage.evaluation.score_level, Level::Good);
}

#[test]
fn test_explicit_numeric_wins_over_level() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let response = db
        .record_evaluation(NewEvaluation {
            score_numeric: Some(2),
            score_level: Some(json!("A")),
            ..teacher_evaluation(submission.id)
        })
        .unwrap();
    assert_eq!(response.evaluation.score_numeric, 2);
    assert_eq!(response.evaluation.score_level, Level::Pass);
}

#[test]
fn test_aggregate_from_dimension_scores_rounds_half_up() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    // 4+4+3+3+4 = 18 over 5 dimensions: 3.6 rounds to 4
    let dims = json!({
        "问题意识": 4, "方案设计": 4, "探究过程": 3, "结论质量": 3, "反思能力": 4
    });
    let response = db
        .record_evaluation(NewEvaluation {
            dimension_scores: dims.as_object().unwrap().clone(),
            ..teacher_evaluation(submission.id)
        })
        .unwrap();
    assert_eq!(response.evaluation.score_numeric, 4);
    assert_eq!(response.evaluation.score_level, Level::Excellent);
}

#[test]
fn test_dimension_scores_are_clamped_and_backfilled() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let dims = json!({"问题意识": 9, "方案设计": -1, "走神程度": 4});
    let response = db
        .record_evaluation(NewEvaluation {
            dimension_scores: dims.as_object().unwrap().clone(),
            ..teacher_evaluation(submission.id)
        })
        .unwrap();

    let scores = &response.evaluation.dimension_scores;
    assert_eq!(scores["问题意识"], 4);
    assert_eq!(scores["方案设计"], 1);
    // Keys outside the rubric are dropped, rubric dimensions are complete
    assert!(!scores.contains_key("走神程度"));
    assert_eq!(scores.len(), 5);
    assert_eq!(scores["探究过程"], 2);
}

#[test]
fn test_self_evaluation_must_come_from_student() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let stranger = db.record_evaluation(NewEvaluation {
        evaluator_id: 8,
        role: EvaluatorRole::SelfReview,
        score_numeric: Some(3),
        ..teacher_evaluation(submission.id)
    });
    assert!(matches!(stranger, Err(CoreError::InvalidState { .. })));

    db.record_evaluation(NewEvaluation {
        evaluator_id: 7,
        role: EvaluatorRole::SelfReview,
        score_numeric: Some(3),
        ..teacher_evaluation(submission.id)
    })
    .unwrap();

    let duplicate = db.record_evaluation(NewEvaluation {
        evaluator_id: 7,
        role: EvaluatorRole::SelfReview,
        score_numeric: Some(4),
        ..teacher_evaluation(submission.id)
    });
    assert!(matches!(duplicate, Err(CoreError::AlreadyExists { .. })));
}

#[test]
fn test_peer_evaluation_rules() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let own_work = db.record_evaluation(NewEvaluation {
        evaluator_id: 7,
        role: EvaluatorRole::Peer,
        score_numeric: Some(3),
        ..teacher_evaluation(submission.id)
    });
    assert!(matches!(own_work, Err(CoreError::InvalidState { .. })));

    let peer = db
        .record_evaluation(NewEvaluation {
            evaluator_id: 8,
            role: EvaluatorRole::Peer,
            score_numeric: Some(3),
            ..teacher_evaluation(submission.id)
        })
        .unwrap();
    assert!(peer.evaluation.is_anonymous);

    let duplicate = db.record_evaluation(NewEvaluation {
        evaluator_id: 8,
        role: EvaluatorRole::Peer,
        score_numeric: Some(2),
        ..teacher_evaluation(submission.id)
    });
    assert!(matches!(duplicate, Err(CoreError::AlreadyExists { .. })));

    // Peer evaluations do not mark the submission graded
    let status = db.get_submission(submission.id).unwrap().status;
    assert_ne!(status, SubmissionStatus::Graded);
}

#[test]
fn test_teacher_may_evaluate_repeatedly() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    db.record_evaluation(NewEvaluation {
        score_numeric: Some(2),
        ..teacher_evaluation(submission.id)
    })
    .unwrap();
    db.record_evaluation(NewEvaluation {
        score_numeric: Some(3),
        ..teacher_evaluation(submission.id)
    })
    .unwrap();

    assert_eq!(db.list_evaluations(submission.id).unwrap().len(), 2);
}

#[test]
fn test_empty_payload_defaults_to_pass() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    let response = db.record_evaluation(teacher_evaluation(submission.id)).unwrap();
    assert_eq!(response.evaluation.score_numeric, 2);
    assert_eq!(response.evaluation.score_level, Level::Pass);
    assert!(response.evaluation.dimension_scores.values().all(|&s| s == 2));
}

#[test]
fn test_legacy_rows_reread_through_canonical_mapping() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    db.conn
        .execute(
            "INSERT INTO evaluations (submission_id, evaluator_id, role, score_level, \
             feedback, created_at) VALUES (?1, 10, 'teacher', 'B', '', ?2)",
            rusqlite::params![submission.id, "2024-01-01T00:00:00+00:00"],
        )
        .unwrap();

    let evaluation = db.get_evaluation(db.conn.last_insert_rowid()).unwrap();
    assert_eq!(evaluation.score_numeric, 3);
    assert_eq!(evaluation.score_level, Level::Good);
}

#[test]
fn test_list_responses_carry_display_labels() {
    let (_dir, db) = open_test_db();
    let assignment = published_assignment(&db, 1, SubmissionMode::Once);
    let submission = draft_submission(&db, assignment.id, 7);

    db.record_evaluation(NewEvaluation {
        score_numeric: Some(3),
        ..teacher_evaluation(submission.id)
    })
    .unwrap();

    let responses = db.list_evaluations(submission.id).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].score_level_label, "良好");
    assert!(responses[0]
        .dimension_level_labels
        .values()
        .all(|label| *label == "良好"));
}
