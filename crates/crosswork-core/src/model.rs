//! Domain types for assignments, submissions, and evaluations
//!
//! Every JSON-shaped column in the store maps to an explicit struct here;
//! arbitrary `serde_json::Value` payloads are normalized at the service
//! boundary (see `rubric` and `ai`) before they reach these types.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Assignment type (practical / inquiry / project)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    Practical,
    Inquiry,
    Project,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::Practical => "practical",
            AssignmentType::Inquiry => "inquiry",
            AssignmentType::Project => "project",
        }
    }
}

impl FromStr for AssignmentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practical" => Ok(AssignmentType::Practical),
            "inquiry" => Ok(AssignmentType::Inquiry),
            "project" => Ok(AssignmentType::Project),
            other => Err(CoreError::invalid_value("assignment type", other)),
        }
    }
}

/// School stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolStage {
    Primary,
    Middle,
}

impl SchoolStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolStage::Primary => "primary",
            SchoolStage::Middle => "middle",
        }
    }
}

impl FromStr for SchoolStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(SchoolStage::Primary),
            "middle" => Ok(SchoolStage::Middle),
            other => Err(CoreError::invalid_value("school stage", other)),
        }
    }
}

/// Submission mode for an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// One draft/submit cycle per phase
    Phased,
    /// Single-shot: one submission for the whole assignment
    Once,
    /// Phased with a final consolidated submission
    Mixed,
}

impl SubmissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionMode::Phased => "phased",
            SubmissionMode::Once => "once",
            SubmissionMode::Mixed => "mixed",
        }
    }
}

impl FromStr for SubmissionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phased" => Ok(SubmissionMode::Phased),
            "once" => Ok(SubmissionMode::Once),
            "mixed" => Ok(SubmissionMode::Mixed),
            other => Err(CoreError::invalid_value("submission mode", other)),
        }
    }
}

/// Submission lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    Returned,
    Graded,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Returned => "returned",
            SubmissionStatus::Graded => "graded",
        }
    }

    /// Whether a student may still edit the submission content
    pub fn editable(&self) -> bool {
        matches!(self, SubmissionStatus::Draft | SubmissionStatus::Returned)
    }
}

impl FromStr for SubmissionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SubmissionStatus::Draft),
            "submitted" => Ok(SubmissionStatus::Submitted),
            "returned" => Ok(SubmissionStatus::Returned),
            "graded" => Ok(SubmissionStatus::Graded),
            other => Err(CoreError::invalid_value("submission status", other)),
        }
    }
}

/// Who produced an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorRole {
    Teacher,
    #[serde(rename = "self")]
    SelfReview,
    Peer,
}

impl EvaluatorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorRole::Teacher => "teacher",
            EvaluatorRole::SelfReview => "self",
            EvaluatorRole::Peer => "peer",
        }
    }
}

impl FromStr for EvaluatorRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher" => Ok(EvaluatorRole::Teacher),
            "self" => Ok(EvaluatorRole::SelfReview),
            "peer" => Ok(EvaluatorRole::Peer),
            other => Err(CoreError::invalid_value("evaluator role", other)),
        }
    }
}

/// Canonical four-level ordinal scale used for all evaluation scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Improve,
    Pass,
    Good,
    Excellent,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Excellent, Level::Good, Level::Pass, Level::Improve];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Excellent => "excellent",
            Level::Good => "good",
            Level::Pass => "pass",
            Level::Improve => "improve",
        }
    }

    /// Numeric score under the canonical mapping (excellent=4 .. improve=1)
    pub fn score(&self) -> i64 {
        match self {
            Level::Excellent => 4,
            Level::Good => 3,
            Level::Pass => 2,
            Level::Improve => 1,
        }
    }

    /// Level for a numeric score; out-of-range input is clamped first
    pub fn from_score(score: i64) -> Level {
        match score.clamp(1, 4) {
            4 => Level::Excellent,
            3 => Level::Good,
            2 => Level::Pass,
            _ => Level::Improve,
        }
    }

    /// Fixed Chinese display string for the level
    pub fn label(&self) -> &'static str {
        match self {
            Level::Excellent => "优秀",
            Level::Good => "良好",
            Level::Pass => "合格",
            Level::Improve => "需改进",
        }
    }
}

impl FromStr for Level {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(Level::Excellent),
            "good" => Ok(Level::Good),
            "pass" => Ok(Level::Pass),
            "improve" => Ok(Level::Improve),
            other => Err(CoreError::invalid_value("evaluation level", other)),
        }
    }
}

/// Descriptive text for each of the four canonical levels of a dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTexts {
    #[serde(default)]
    pub excellent: String,
    #[serde(default)]
    pub good: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default)]
    pub improve: String,
}

impl LevelTexts {
    pub fn get(&self, level: Level) -> &str {
        match level {
            Level::Excellent => &self.excellent,
            Level::Good => &self.good,
            Level::Pass => &self.pass,
            Level::Improve => &self.improve,
        }
    }

    pub fn set(&mut self, level: Level, text: String) {
        match level {
            Level::Excellent => self.excellent = text,
            Level::Good => self.good = text,
            Level::Pass => self.pass = text,
            Level::Improve => self.improve = text,
        }
    }
}

/// One evaluation dimension with its four-level criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub levels: LevelTexts,
}

/// Canonical rubric shape: ordered dimensions, four-level criteria,
/// no numeric weights
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

impl Rubric {
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Assignment objectives (knowledge / process / emotion)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objectives {
    #[serde(default)]
    pub knowledge: String,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub emotion: String,
}

/// Evidence a checkpoint asks the student to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub content: String,
    #[serde(default = "default_evidence_type")]
    pub evidence_type: String,
}

fn default_evidence_type() -> String {
    "text".to_string()
}

/// One guided step within a phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

/// One ordered stage of a multi-stage assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A subject in the catalogue (e.g. science, language arts)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// A cross-disciplinary assignment designed by a teacher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub topic: String,
    #[serde(default)]
    pub description: String,
    pub school_stage: SchoolStage,
    pub grade: i64,
    pub main_subject_id: i64,
    #[serde(default)]
    pub related_subject_ids: Vec<i64>,
    pub assignment_type: AssignmentType,
    pub submission_mode: SubmissionMode,
    #[serde(default)]
    pub duration_weeks: i64,
    #[serde(default)]
    pub objectives: Objectives,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub rubric: Rubric,
    pub created_by: i64,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File attachment on a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    #[serde(default = "default_evidence_type", rename = "type")]
    pub kind: String,
}

/// A student's phased work against an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub group_id: Option<i64>,
    pub phase_index: i64,
    pub step_index: Option<i64>,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub content: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub checkpoints: BTreeMap<String, bool>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A recorded evaluation of a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,
    pub submission_id: i64,
    pub evaluator_id: i64,
    pub role: EvaluatorRole,
    pub score_numeric: i64,
    pub score_level: Level,
    #[serde(default)]
    pub dimension_scores: BTreeMap<String, i64>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}
