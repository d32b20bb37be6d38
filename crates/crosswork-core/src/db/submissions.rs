//! Submission lifecycle: draft -> submitted -> returned/graded
//!
//! Submitting a non-final phase of a multi-phase, non-single-shot
//! assignment auto-creates (or reuses) the next phase's draft so students
//! always have somewhere to continue working.

use std::collections::BTreeMap;

use rusqlite::params;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::model::{Attachment, Submission, SubmissionMode, SubmissionStatus};

use super::{json_column, now_rfc3339, parse_datetime, parse_datetime_opt, to_json_string};

const SUBMISSION_COLUMNS: &str = "id, assignment_id, student_id, group_id, phase_index, \
     step_index, status, content, attachments, checkpoints, created_at, submitted_at";

/// Input for a new draft submission
#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub student_id: i64,
    pub group_id: Option<i64>,
    pub phase_index: i64,
    pub step_index: Option<i64>,
    pub content: serde_json::Map<String, Value>,
    pub attachments: Vec<Attachment>,
    pub checkpoints: BTreeMap<String, bool>,
}

/// Student edits to a draft or returned submission
#[derive(Debug, Clone, Default)]
pub struct UpdateSubmission {
    pub content: Option<serde_json::Map<String, Value>>,
    pub attachments: Option<Vec<Attachment>>,
    pub checkpoints: Option<BTreeMap<String, bool>>,
}

/// Result of formally submitting: the updated row plus the id of the next
/// phase's draft, when one applies
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub submission: Submission,
    pub next_submission_id: Option<i64>,
}

impl super::Database {
    pub fn create_submission(&self, new: NewSubmission) -> Result<Submission> {
        let assignment = self.get_assignment(new.assignment_id)?;
        if !assignment.is_published {
            return Err(CoreError::invalid_state(
                "assignment",
                "not published yet",
            ));
        }
        if new.phase_index < 0
            || (!assignment.phases.is_empty()
                && new.phase_index >= assignment.phases.len() as i64)
        {
            return Err(CoreError::invalid_value("phase index", new.phase_index));
        }

        self.conn
            .execute(
                "INSERT INTO submissions (assignment_id, student_id, group_id, phase_index, \
                 step_index, status, content, attachments, checkpoints, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, 'draft', ?6, ?7, ?8, ?9)",
                params![
                    new.assignment_id,
                    new.student_id,
                    new.group_id,
                    new.phase_index,
                    new.step_index,
                    to_json_string(&new.content)?,
                    to_json_string(&new.attachments)?,
                    to_json_string(&new.checkpoints)?,
                    now_rfc3339(),
                ],
            )
            .map_err(|e| CoreError::db_operation("insert submission", e))?;

        self.get_submission(self.conn.last_insert_rowid())
    }

    pub fn get_submission(&self, id: i64) -> Result<Submission> {
        let sql = format!("SELECT {} FROM submissions WHERE id = ?1", SUBMISSION_COLUMNS);
        self.conn
            .query_row(&sql, params![id], extract_submission_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => CoreError::not_found("submission", id),
                other => CoreError::db_operation("query submission", other),
            })?
            .into_submission()
    }

    pub fn list_submissions(
        &self,
        assignment_id: Option<i64>,
        student_id: Option<i64>,
    ) -> Result<Vec<Submission>> {
        let mut sql = format!("SELECT {} FROM submissions WHERE 1=1", SUBMISSION_COLUMNS);
        let mut bindings: Vec<i64> = Vec::new();
        if let Some(assignment) = assignment_id {
            bindings.push(assignment);
            sql.push_str(&format!(" AND assignment_id = ?{}", bindings.len()));
        }
        if let Some(student) = student_id {
            bindings.push(student);
            sql.push_str(&format!(" AND student_id = ?{}", bindings.len()));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| CoreError::db_operation("prepare submission list", e))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(bindings), extract_submission_row)
            .map_err(|e| CoreError::db_operation("list submissions", e))?;

        let mut submissions = Vec::new();
        for raw in rows {
            let raw = raw.map_err(|e| CoreError::db_operation("read submission row", e))?;
            submissions.push(raw.into_submission()?);
        }
        Ok(submissions)
    }

    pub fn update_submission(&self, id: i64, update: UpdateSubmission) -> Result<Submission> {
        let current = self.get_submission(id)?;
        if !current.status.editable() {
            return Err(CoreError::invalid_state(
                "submission",
                format!("cannot edit while {}", current.status.as_str()),
            ));
        }

        self.conn
            .execute(
                "UPDATE submissions SET content = ?1, attachments = ?2, checkpoints = ?3 \
                 WHERE id = ?4",
                params![
                    to_json_string(&update.content.unwrap_or(current.content))?,
                    to_json_string(&update.attachments.unwrap_or(current.attachments))?,
                    to_json_string(&update.checkpoints.unwrap_or(current.checkpoints))?,
                    id,
                ],
            )
            .map_err(|e| CoreError::db_operation("update submission", e))?;

        self.get_submission(id)
    }

    /// Formally submit: draft/returned becomes submitted, and for phased
    /// assignments the next phase's draft is created (or reused) so the
    /// returned id is stable across repeat submits
    pub fn submit_submission(&self, id: i64) -> Result<SubmitOutcome> {
        let submission = self.get_submission(id)?;
        if submission.status == SubmissionStatus::Graded {
            return Err(CoreError::invalid_state("submission", "already graded"));
        }
        let assignment = self.get_assignment(submission.assignment_id)?;

        self.conn
            .execute(
                "UPDATE submissions SET status = 'submitted', submitted_at = ?1 WHERE id = ?2",
                params![now_rfc3339(), id],
            )
            .map_err(|e| CoreError::db_operation("submit submission", e))?;

        let mut next_submission_id = None;
        let next_phase_index = submission.phase_index + 1;
        if assignment.submission_mode != SubmissionMode::Once
            && next_phase_index < assignment.phases.len() as i64
        {
            next_submission_id = Some(self.next_phase_draft(&submission, next_phase_index)?);
        }

        Ok(SubmitOutcome {
            submission: self.get_submission(id)?,
            next_submission_id,
        })
    }

    /// Reuse the student's existing row for the next phase, or create a
    /// fresh empty draft
    fn next_phase_draft(&self, submission: &Submission, next_phase_index: i64) -> Result<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM submissions WHERE assignment_id = ?1 AND student_id = ?2 \
                 AND phase_index = ?3 ORDER BY id LIMIT 1",
                params![
                    submission.assignment_id,
                    submission.student_id,
                    next_phase_index
                ],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(CoreError::db_operation("query next phase draft", other)),
            })?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn
            .execute(
                "INSERT INTO submissions (assignment_id, student_id, group_id, phase_index, \
                 status, content, attachments, checkpoints, created_at) \
                 VALUES (?1, ?2, ?3, ?4, 'draft', '{}', '[]', '{}', ?5)",
                params![
                    submission.assignment_id,
                    submission.student_id,
                    submission.group_id,
                    next_phase_index,
                    now_rfc3339(),
                ],
            )
            .map_err(|e| CoreError::db_operation("create next phase draft", e))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Teacher sends the submission back for revision
    pub fn return_submission(&self, id: i64) -> Result<Submission> {
        let current = self.get_submission(id)?;
        if current.status != SubmissionStatus::Submitted {
            return Err(CoreError::invalid_state(
                "submission",
                format!("cannot return while {}", current.status.as_str()),
            ));
        }

        self.conn
            .execute(
                "UPDATE submissions SET status = 'returned' WHERE id = ?1",
                params![id],
            )
            .map_err(|e| CoreError::db_operation("return submission", e))?;
        self.get_submission(id)
    }

    pub fn delete_submission(&self, id: i64) -> Result<()> {
        let current = self.get_submission(id)?;
        if current.status != SubmissionStatus::Draft {
            return Err(CoreError::invalid_state(
                "submission",
                "only drafts can be deleted",
            ));
        }

        self.conn
            .execute("DELETE FROM submissions WHERE id = ?1", params![id])
            .map_err(|e| CoreError::db_operation("delete submission", e))?;
        Ok(())
    }

    pub(crate) fn mark_submission_graded(&self, id: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE submissions SET status = 'graded' WHERE id = ?1",
                params![id],
            )
            .map_err(|e| CoreError::db_operation("mark submission graded", e))?;
        Ok(())
    }
}

struct ExtractedSubmissionRow {
    id: i64,
    assignment_id: i64,
    student_id: i64,
    group_id: Option<i64>,
    phase_index: i64,
    step_index: Option<i64>,
    status: String,
    content: String,
    attachments: String,
    checkpoints: String,
    created_at: String,
    submitted_at: Option<String>,
}

fn extract_submission_row(
    row: &rusqlite::Row,
) -> std::result::Result<ExtractedSubmissionRow, rusqlite::Error> {
    Ok(ExtractedSubmissionRow {
        id: row.get(0)?,
        assignment_id: row.get(1)?,
        student_id: row.get(2)?,
        group_id: row.get(3)?,
        phase_index: row.get(4)?,
        step_index: row.get(5)?,
        status: row.get(6)?,
        content: row.get(7)?,
        attachments: row.get(8)?,
        checkpoints: row.get(9)?,
        created_at: row.get(10)?,
        submitted_at: row.get(11)?,
    })
}

impl ExtractedSubmissionRow {
    fn into_submission(self) -> Result<Submission> {
        Ok(Submission {
            id: self.id,
            assignment_id: self.assignment_id,
            student_id: self.student_id,
            group_id: self.group_id,
            phase_index: self.phase_index,
            step_index: self.step_index,
            status: self.status.parse()?,
            content: json_column(&self.content),
            attachments: json_column(&self.attachments),
            checkpoints: json_column(&self.checkpoints),
            created_at: parse_datetime(&self.created_at)?,
            submitted_at: parse_datetime_opt(self.submitted_at)?,
        })
    }
}
