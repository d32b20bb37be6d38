//! Assignment persistence and design operations

use rusqlite::params;
use serde_json::Value;

use crate::ai;
use crate::error::{CoreError, Result};
use crate::model::{
    Assignment, AssignmentType, Objectives, Phase, Rubric, SchoolStage, Subject,
    SubmissionMode,
};
use crate::rubric::normalize_rubric;

use super::{json_column, now_rfc3339, parse_datetime, parse_datetime_opt, to_json_string};

const ASSIGNMENT_COLUMNS: &str = "id, title, topic, description, school_stage, grade, \
     main_subject_id, related_subject_ids, assignment_type, submission_mode, \
     duration_weeks, objectives, phases, rubric, created_by, is_published, \
     published_at, created_at, updated_at";

/// Input for designing a new assignment. Structured content (objectives,
/// phases, rubric) arrives as one untrusted JSON payload - teacher-authored
/// or AI-generated - and is normalized before persistence.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub topic: Option<String>,
    pub description: String,
    pub school_stage: SchoolStage,
    pub grade: i64,
    pub main_subject_id: i64,
    pub related_subject_ids: Vec<i64>,
    pub assignment_type: AssignmentType,
    pub submission_mode: SubmissionMode,
    pub duration_weeks: i64,
    pub created_by: i64,
    /// Raw `{objectives, phases, rubric}` payload, if any
    pub content: Option<Value>,
}

/// Fields a teacher may change after creation
#[derive(Debug, Clone, Default)]
pub struct UpdateAssignment {
    pub title: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub objectives: Option<Objectives>,
    pub rubric: Option<Value>,
    pub submission_mode: Option<SubmissionMode>,
}

/// Fallback objectives when neither the teacher nor the AI supplied any
fn default_objectives(assignment_type: AssignmentType, topic: &str) -> Objectives {
    match assignment_type {
        AssignmentType::Practical => Objectives {
            knowledge: format!("理解与{}相关的核心概念与实践知识。", topic),
            process: "通过实践体验、过程记录与成果表达完成任务。".to_string(),
            emotion: "培养参与意识、责任感与服务社会的态度。".to_string(),
        },
        AssignmentType::Project => Objectives {
            knowledge: format!("掌握与{}相关的跨学科知识与应用方法。", topic),
            process: "经历项目规划、协作实施与迭代改进的完整过程。".to_string(),
            emotion: "培养合作意识、创新精神与社会责任感。".to_string(),
        },
        AssignmentType::Inquiry => Objectives {
            knowledge: format!("理解与{}相关的核心概念与学科知识。", topic),
            process: "通过资料检索、调查分析与合作探究完成任务。".to_string(),
            emotion: "培养科学探究精神与协作意识。".to_string(),
        },
    }
}

impl super::Database {
    pub fn create_assignment(&self, new: NewAssignment) -> Result<Assignment> {
        if new.title.trim().is_empty() {
            return Err(CoreError::invalid_value("title", "must not be empty"));
        }
        if !(1..=9).contains(&new.grade) {
            return Err(CoreError::invalid_value("grade", new.grade));
        }
        self.get_subject(new.main_subject_id)?;

        let topic = new
            .topic
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| new.title.clone());

        let content = ai::normalize_assignment_output(
            new.content.as_ref().unwrap_or(&Value::Null),
            new.assignment_type,
        );
        let objectives = if content.objectives.knowledge.is_empty() {
            default_objectives(new.assignment_type, &topic)
        } else {
            content.objectives
        };

        let now = now_rfc3339();
        self.conn
            .execute(
                "INSERT INTO assignments (title, topic, description, school_stage, grade, \
                 main_subject_id, related_subject_ids, assignment_type, submission_mode, \
                 duration_weeks, objectives, phases, rubric, created_by, is_published, \
                 created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, ?15, ?15)",
                params![
                    new.title,
                    topic,
                    new.description,
                    new.school_stage.as_str(),
                    new.grade,
                    new.main_subject_id,
                    to_json_string(&new.related_subject_ids)?,
                    new.assignment_type.as_str(),
                    new.submission_mode.as_str(),
                    new.duration_weeks,
                    to_json_string(&objectives)?,
                    to_json_string(&content.phases)?,
                    to_json_string(&content.rubric)?,
                    new.created_by,
                    now,
                ],
            )
            .map_err(|e| CoreError::db_operation("insert assignment", e))?;

        self.get_assignment(self.conn.last_insert_rowid())
    }

    pub fn get_assignment(&self, id: i64) -> Result<Assignment> {
        let sql = format!("SELECT {} FROM assignments WHERE id = ?1", ASSIGNMENT_COLUMNS);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| CoreError::db_operation("prepare assignment query", e))?;
        let mut rows = stmt
            .query_map(params![id], extract_assignment_row)
            .map_err(|e| CoreError::db_operation("query assignment", e))?;

        match rows.next() {
            Some(Ok(raw)) => raw.into_assignment(),
            Some(Err(e)) => Err(CoreError::db_operation("read assignment row", e)),
            None => Err(CoreError::not_found("assignment", id)),
        }
    }

    pub fn list_assignments(&self, created_by: Option<i64>) -> Result<Vec<Assignment>> {
        let sql = match created_by {
            Some(_) => format!(
                "SELECT {} FROM assignments WHERE created_by = ?1 ORDER BY id",
                ASSIGNMENT_COLUMNS
            ),
            None => format!("SELECT {} FROM assignments ORDER BY id", ASSIGNMENT_COLUMNS),
        };
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| CoreError::db_operation("prepare assignment list", e))?;

        let raw_rows = match created_by {
            Some(owner) => stmt.query_map(params![owner], extract_assignment_row),
            None => stmt.query_map([], extract_assignment_row),
        }
        .map_err(|e| CoreError::db_operation("list assignments", e))?;

        let mut assignments = Vec::new();
        for raw in raw_rows {
            let raw = raw.map_err(|e| CoreError::db_operation("read assignment row", e))?;
            assignments.push(raw.into_assignment()?);
        }
        Ok(assignments)
    }

    pub fn update_assignment(&self, id: i64, update: UpdateAssignment) -> Result<Assignment> {
        let current = self.get_assignment(id)?;

        let rubric = match update.rubric {
            Some(raw) => normalize_rubric(&raw, current.assignment_type),
            None => current.rubric,
        };

        self.conn
            .execute(
                "UPDATE assignments SET title = ?1, topic = ?2, description = ?3, \
                 objectives = ?4, rubric = ?5, submission_mode = ?6, updated_at = ?7 \
                 WHERE id = ?8",
                params![
                    update.title.unwrap_or(current.title),
                    update.topic.unwrap_or(current.topic),
                    update.description.unwrap_or(current.description),
                    to_json_string(&update.objectives.unwrap_or(current.objectives))?,
                    to_json_string(&rubric)?,
                    update
                        .submission_mode
                        .unwrap_or(current.submission_mode)
                        .as_str(),
                    now_rfc3339(),
                    id,
                ],
            )
            .map_err(|e| CoreError::db_operation("update assignment", e))?;

        self.get_assignment(id)
    }

    /// Overwrite the phases field wholesale from a raw (AI-regenerated)
    /// payload; the previous phase structure is not merged
    pub fn replace_assignment_phases(&self, id: i64, payload: &Value) -> Result<Assignment> {
        let current = self.get_assignment(id)?;
        let content = ai::normalize_assignment_output(
            &serde_json::json!({ "phases": payload }),
            current.assignment_type,
        );
        if content.phases.is_empty() {
            return Err(CoreError::invalid_value(
                "phases payload",
                "no usable phases found",
            ));
        }

        self.conn
            .execute(
                "UPDATE assignments SET phases = ?1, updated_at = ?2 WHERE id = ?3",
                params![to_json_string(&content.phases)?, now_rfc3339(), id],
            )
            .map_err(|e| CoreError::db_operation("replace assignment phases", e))?;

        self.get_assignment(id)
    }

    pub fn publish_assignment(&self, id: i64) -> Result<Assignment> {
        let current = self.get_assignment(id)?;
        if current.is_published {
            return Ok(current);
        }

        let now = now_rfc3339();
        self.conn
            .execute(
                "UPDATE assignments SET is_published = 1, published_at = ?1, updated_at = ?1 \
                 WHERE id = ?2",
                params![now, id],
            )
            .map_err(|e| CoreError::db_operation("publish assignment", e))?;

        self.get_assignment(id)
    }

    pub fn get_subject(&self, id: i64) -> Result<Subject> {
        self.conn
            .query_row(
                "SELECT id, code, name FROM subjects WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Subject {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => CoreError::not_found("subject", id),
                other => CoreError::db_operation("query subject", other),
            })
    }

    pub fn list_subjects(&self) -> Result<Vec<Subject>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, code, name FROM subjects ORDER BY id")
            .map_err(|e| CoreError::db_operation("prepare subject list", e))?;
        let subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .map_err(|e| CoreError::db_operation("list subjects", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CoreError::db_operation("list subjects", e))?;
        Ok(subjects)
    }
}

struct ExtractedAssignmentRow {
    id: i64,
    title: String,
    topic: Option<String>,
    description: Option<String>,
    school_stage: String,
    grade: i64,
    main_subject_id: i64,
    related_subject_ids: String,
    assignment_type: String,
    submission_mode: String,
    duration_weeks: i64,
    objectives: String,
    phases: String,
    rubric: String,
    created_by: i64,
    is_published: bool,
    published_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn extract_assignment_row(
    row: &rusqlite::Row,
) -> std::result::Result<ExtractedAssignmentRow, rusqlite::Error> {
    Ok(ExtractedAssignmentRow {
        id: row.get(0)?,
        title: row.get(1)?,
        topic: row.get(2)?,
        description: row.get(3)?,
        school_stage: row.get(4)?,
        grade: row.get(5)?,
        main_subject_id: row.get(6)?,
        related_subject_ids: row.get(7)?,
        assignment_type: row.get(8)?,
        submission_mode: row.get(9)?,
        duration_weeks: row.get(10)?,
        objectives: row.get(11)?,
        phases: row.get(12)?,
        rubric: row.get(13)?,
        created_by: row.get(14)?,
        is_published: row.get(15)?,
        published_at: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

impl ExtractedAssignmentRow {
    fn into_assignment(self) -> Result<Assignment> {
        let assignment_type: AssignmentType = self.assignment_type.parse()?;

        // The rubric normalizer runs unconditionally on every read so legacy
        // rows (weighted dimensions, flat lists) surface in canonical shape.
        let rubric_value: Value =
            serde_json::from_str(&self.rubric).unwrap_or(Value::Null);
        let rubric: Rubric = normalize_rubric(&rubric_value, assignment_type);

        let title = self.title;
        Ok(Assignment {
            id: self.id,
            topic: self
                .topic
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| title.clone()),
            title,
            description: self.description.unwrap_or_default(),
            school_stage: self.school_stage.parse()?,
            grade: self.grade,
            main_subject_id: self.main_subject_id,
            related_subject_ids: json_column(&self.related_subject_ids),
            assignment_type,
            submission_mode: self.submission_mode.parse()?,
            duration_weeks: self.duration_weeks,
            objectives: json_column(&self.objectives),
            phases: json_column::<Vec<Phase>>(&self.phases),
            rubric,
            created_by: self.created_by,
            is_published: self.is_published,
            published_at: parse_datetime_opt(self.published_at)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}
