//! Evaluation recording and listing
//!
//! Teacher, self, and peer evaluations all pass through the scoring
//! pipeline in `crate::scoring`, so persisted rows are always in-range and
//! label-consistent regardless of source (grader UI or AI suggestion).

use std::collections::BTreeMap;

use rusqlite::params;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::model::{Evaluation, EvaluatorRole, Level};
use crate::scoring;

use super::{json_column, now_rfc3339, parse_datetime, to_json_string};

const EVALUATION_COLUMNS: &str = "id, submission_id, evaluator_id, role, score_numeric, \
     score_level, dimension_scores, feedback, ai_generated, is_anonymous, created_at";

/// Fallback dimension score when neither an explicit score nor a level is
/// supplied: the pass level, as a conservative default
const FALLBACK_DIMENSION_SCORE: i64 = 2;

/// Raw evaluation payload as submitted by a grader (or forwarded from a
/// normalized AI suggestion)
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub submission_id: i64,
    pub evaluator_id: i64,
    pub role: EvaluatorRole,
    /// Explicit overall score; must already be in [1,4] if present
    pub score_numeric: Option<i64>,
    /// Overall level in any legacy form (label, letter grade, percentage)
    pub score_level: Option<Value>,
    /// Per-dimension raw scores keyed by rubric dimension name
    pub dimension_scores: serde_json::Map<String, Value>,
    pub feedback: String,
    pub ai_generated: bool,
}

/// Evaluation plus the display labels consuming UIs would otherwise have
/// to hardcode
#[derive(Debug, Clone, serde::Serialize)]
pub struct EvaluationResponse {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub score_level_label: &'static str,
    pub dimension_level_labels: BTreeMap<String, &'static str>,
}

impl From<Evaluation> for EvaluationResponse {
    fn from(evaluation: Evaluation) -> Self {
        let score_level_label = evaluation.score_level.label();
        let dimension_level_labels = scoring::dimension_labels(&evaluation.dimension_scores);
        EvaluationResponse {
            evaluation,
            score_level_label,
            dimension_level_labels,
        }
    }
}

impl super::Database {
    pub fn record_evaluation(&self, new: NewEvaluation) -> Result<EvaluationResponse> {
        let submission = self.get_submission(new.submission_id)?;
        let assignment = self.get_assignment(submission.assignment_id)?;

        match new.role {
            EvaluatorRole::SelfReview => {
                if new.evaluator_id != submission.student_id {
                    return Err(CoreError::invalid_state(
                        "evaluation",
                        "self evaluation must come from the submitting student",
                    ));
                }
                self.reject_duplicate(&new)?;
            }
            EvaluatorRole::Peer => {
                if new.evaluator_id == submission.student_id {
                    return Err(CoreError::invalid_state(
                        "evaluation",
                        "students cannot peer-review their own submission",
                    ));
                }
                self.reject_duplicate(&new)?;
            }
            EvaluatorRole::Teacher => {}
        }

        if let Some(score) = new.score_numeric {
            if !(scoring::MIN_SCORE..=scoring::MAX_SCORE).contains(&score) {
                return Err(CoreError::invalid_value("score_numeric", score));
            }
        }

        // Explicit numeric wins over a supplied level; the final level is
        // always re-derived from the numeric score so the two agree.
        let provisional = new
            .score_numeric
            .or_else(|| new.score_level.as_ref().map(|v| scoring::level_from_legacy(v).score()));

        let dimension_scores = scoring::normalize_dimension_scores(
            &assignment.rubric.dimensions,
            &new.dimension_scores,
            provisional.unwrap_or(FALLBACK_DIMENSION_SCORE),
        );

        let score_numeric = match provisional.or_else(|| scoring::average_score(&dimension_scores))
        {
            Some(score) => score,
            None => {
                return Err(CoreError::UsageError(
                    "score_numeric, score_level, or dimension_scores required".to_string(),
                ))
            }
        };
        let score_level = Level::from_score(score_numeric);

        // Peer evaluations are anonymous by default
        let is_anonymous = new.role == EvaluatorRole::Peer;

        self.conn
            .execute(
                "INSERT INTO evaluations (submission_id, evaluator_id, role, score_numeric, \
                 score_level, dimension_scores, feedback, ai_generated, is_anonymous, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    new.submission_id,
                    new.evaluator_id,
                    new.role.as_str(),
                    score_numeric,
                    score_level.as_str(),
                    to_json_string(&dimension_scores)?,
                    new.feedback,
                    new.ai_generated,
                    is_anonymous,
                    now_rfc3339(),
                ],
            )
            .map_err(|e| CoreError::db_operation("insert evaluation", e))?;

        if new.role == EvaluatorRole::Teacher {
            self.mark_submission_graded(new.submission_id)?;
        }

        let evaluation = self.get_evaluation(self.conn.last_insert_rowid())?;
        Ok(EvaluationResponse::from(evaluation))
    }

    fn reject_duplicate(&self, new: &NewEvaluation) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM evaluations WHERE submission_id = ?1 \
                 AND evaluator_id = ?2 AND role = ?3",
                params![new.submission_id, new.evaluator_id, new.role.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::db_operation("check duplicate evaluation", e))?;
        if count > 0 {
            return Err(CoreError::already_exists(
                "evaluation",
                format!(
                    "{} by evaluator {} for submission {}",
                    new.role.as_str(),
                    new.evaluator_id,
                    new.submission_id
                ),
            ));
        }
        Ok(())
    }

    pub fn get_evaluation(&self, id: i64) -> Result<Evaluation> {
        let sql = format!("SELECT {} FROM evaluations WHERE id = ?1", EVALUATION_COLUMNS);
        self.conn
            .query_row(&sql, params![id], extract_evaluation_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => CoreError::not_found("evaluation", id),
                other => CoreError::db_operation("query evaluation", other),
            })?
            .into_evaluation()
    }

    pub fn list_evaluations(&self, submission_id: i64) -> Result<Vec<EvaluationResponse>> {
        let sql = format!(
            "SELECT {} FROM evaluations WHERE submission_id = ?1 ORDER BY id",
            EVALUATION_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| CoreError::db_operation("prepare evaluation list", e))?;
        let rows = stmt
            .query_map(params![submission_id], extract_evaluation_row)
            .map_err(|e| CoreError::db_operation("list evaluations", e))?;

        let mut evaluations = Vec::new();
        for raw in rows {
            let raw = raw.map_err(|e| CoreError::db_operation("read evaluation row", e))?;
            evaluations.push(EvaluationResponse::from(raw.into_evaluation()?));
        }
        Ok(evaluations)
    }
}

struct ExtractedEvaluationRow {
    id: i64,
    submission_id: i64,
    evaluator_id: i64,
    role: String,
    score_numeric: Option<i64>,
    score_level: Option<String>,
    dimension_scores: String,
    feedback: String,
    ai_generated: bool,
    is_anonymous: bool,
    created_at: String,
}

fn extract_evaluation_row(
    row: &rusqlite::Row,
) -> std::result::Result<ExtractedEvaluationRow, rusqlite::Error> {
    Ok(ExtractedEvaluationRow {
        id: row.get(0)?,
        submission_id: row.get(1)?,
        evaluator_id: row.get(2)?,
        role: row.get(3)?,
        score_numeric: row.get(4)?,
        score_level: row.get(5)?,
        dimension_scores: row.get(6)?,
        feedback: row.get(7)?,
        ai_generated: row.get(8)?,
        is_anonymous: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl ExtractedEvaluationRow {
    fn into_evaluation(self) -> Result<Evaluation> {
        // Legacy rows may hold letter grades or percentages in score_level;
        // re-derive both fields through the canonical mapping on read.
        let score_numeric = match self.score_numeric {
            Some(score) => scoring::clamp_score(score),
            None => self
                .score_level
                .as_deref()
                .map(|s| scoring::level_from_legacy(&Value::String(s.to_string())).score())
                .unwrap_or(scoring::MIN_SCORE),
        };

        Ok(Evaluation {
            id: self.id,
            submission_id: self.submission_id,
            evaluator_id: self.evaluator_id,
            role: self.role.parse()?,
            score_numeric,
            score_level: Level::from_score(score_numeric),
            dimension_scores: json_column(&self.dimension_scores),
            feedback: self.feedback,
            ai_generated: self.ai_generated,
            is_anonymous: self.is_anonymous,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}
