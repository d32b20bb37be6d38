//! End-to-end assignment / submission / evaluation flows through the binary

mod common;

use common::{crosswork, init_store, run_json};
use predicates::prelude::*;
use tempfile::tempdir;

fn create_published_assignment(store: &std::path::Path) -> i64 {
    let content = r#"{"phases": [{"name": "选题准备"}, {"name": "实地调查"}, {"name": "成果汇报"}]}"#;
    let assignment = run_json(
        store,
        &[
            "assignment", "create", "校园垃圾分类调查",
            "--grade", "5",
            "--subject", "4",
            "--teacher", "10",
            "--content", content,
        ],
    );
    let id = assignment["id"].as_i64().unwrap();
    run_json(store, &["assignment", "publish", &id.to_string()]);
    id
}

#[test]
fn test_assignment_create_show_list() {
    let dir = tempdir().unwrap();
    let store = dir.path().join(".crosswork");
    init_store(&store);

    let id = create_published_assignment(&store);

    let shown = run_json(&store, &["assignment", "show", &id.to_string()]);
    assert_eq!(shown["title"], "校园垃圾分类调查");
    assert_eq!(shown["topic"], "校园垃圾分类调查");
    assert_eq!(shown["phases"].as_array().unwrap().len(), 3);
    // Untouched payload still yields a complete rubric with level texts
    let dims = shown["rubric"]["dimensions"].as_array().unwrap();
    assert!(!dims.is_empty());
    assert!(dims[0]["levels"]["excellent"].as_str().unwrap().len() > 0);

    crosswork()
        .arg("--store")
        .arg(&store)
        .args(["assignment", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("校园垃圾分类调查"))
        .stdout(predicate::str::contains("published"));
}

#[test]
fn test_submission_phase_advancement_flow() {
    let dir = tempdir().unwrap();
    let store = dir.path().join(".crosswork");
    init_store(&store);
    let assignment = create_published_assignment(&store);

    let draft = run_json(
        &store,
        &[
            "submission", "create",
            "--assignment", &assignment.to_string(),
            "--student", "7",
            "--content", r#"{"text": "我们确定了调查主题"}"#,
        ],
    );
    let draft_id = draft["id"].as_i64().unwrap();
    assert_eq!(draft["status"], "draft");

    let outcome = run_json(&store, &["submission", "submit", &draft_id.to_string()]);
    assert_eq!(outcome["submission"]["status"], "submitted");
    let next_id = outcome["next_submission_id"].as_i64().unwrap();

    let next = run_json(&store, &["submission", "show", &next_id.to_string()]);
    assert_eq!(next["phase_index"], 1);
    assert_eq!(next["status"], "draft");

    // Returned drafts are editable and resubmitting reuses the next draft
    run_json(&store, &["submission", "return", &draft_id.to_string()]);
    run_json(
        &store,
        &[
            "submission", "update", &draft_id.to_string(),
            "--content", r#"{"text": "修改后的调查主题"}"#,
        ],
    );
    let again = run_json(&store, &["submission", "submit", &draft_id.to_string()]);
    assert_eq!(again["next_submission_id"].as_i64().unwrap(), next_id);
}

#[test]
fn test_evaluation_round_trip() {
    let dir = tempdir().unwrap();
    let store = dir.path().join(".crosswork");
    init_store(&store);
    let assignment = create_published_assignment(&store);

    let draft = run_json(
        &store,
        &[
            "submission", "create",
            "--assignment", &assignment.to_string(),
            "--student", "7",
        ],
    );
    let submission = draft["id"].as_i64().unwrap();
    run_json(&store, &["submission", "submit", &submission.to_string()]);

    let recorded = run_json(
        &store,
        &[
            "evaluation", "record",
            "--submission", &submission.to_string(),
            "--evaluator", "10",
            "--score", "4",
            "--feedback", "调查设计完整",
        ],
    );
    assert_eq!(recorded["score_numeric"], 4);
    assert_eq!(recorded["score_level"], "excellent");
    assert_eq!(recorded["score_level_label"], "优秀");

    // A teacher evaluation grades the submission
    let graded = run_json(&store, &["submission", "show", &submission.to_string()]);
    assert_eq!(graded["status"], "graded");

    crosswork()
        .arg("--store")
        .arg(&store)
        .args(["evaluation", "list", "--submission", &submission.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("teacher"))
        .stdout(predicate::str::contains("优秀"));
}

#[test]
fn test_ai_suggestion_is_normalized_before_recording() {
    let dir = tempdir().unwrap();
    let store = dir.path().join(".crosswork");
    init_store(&store);
    let assignment = create_published_assignment(&store);

    let draft = run_json(
        &store,
        &[
            "submission", "create",
            "--assignment", &assignment.to_string(),
            "--student", "7",
        ],
    );
    let submission = draft["id"].as_i64().unwrap();

    // Out-of-range suggested scores must come back clamped into [1,4]
    let payload = r#"{"suggested_level": "B", "dimension_scores": {"问题意识": 9, "方案设计": 0}, "feedback": "有待深入"}"#;
    let recorded = run_json(
        &store,
        &[
            "evaluation", "suggest",
            "--submission", &submission.to_string(),
            "--evaluator", "10",
            "--payload", payload,
        ],
    );

    assert_eq!(recorded["ai_generated"], true);
    assert_eq!(recorded["dimension_scores"]["问题意识"], 4);
    assert_eq!(recorded["dimension_scores"]["方案设计"], 1);
    assert_eq!(recorded["feedback"], "有待深入");
    let score = recorded["score_numeric"].as_i64().unwrap();
    assert!((1..=4).contains(&score));
}

#[test]
fn test_invalid_score_is_a_usage_error() {
    let dir = tempdir().unwrap();
    let store = dir.path().join(".crosswork");
    init_store(&store);
    let assignment = create_published_assignment(&store);

    let draft = run_json(
        &store,
        &[
            "submission", "create",
            "--assignment", &assignment.to_string(),
            "--student", "7",
        ],
    );
    let submission = draft["id"].as_i64().unwrap();

    crosswork()
        .arg("--store")
        .arg(&store)
        .args([
            "evaluation", "record",
            "--submission", &submission.to_string(),
            "--evaluator", "10",
            "--score", "9",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid score_numeric"));
}

#[test]
fn test_unpublished_assignment_rejects_submissions() {
    let dir = tempdir().unwrap();
    let store = dir.path().join(".crosswork");
    init_store(&store);

    let assignment = run_json(
        &store,
        &[
            "assignment", "create", "未发布的作业",
            "--grade", "3",
            "--subject", "1",
            "--teacher", "10",
        ],
    );
    let id = assignment["id"].as_i64().unwrap();

    crosswork()
        .arg("--store")
        .arg(&store)
        .args([
            "submission", "create",
            "--assignment", &id.to_string(),
            "--student", "7",
        ])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not published"));
}
