//! CLI argument parsing for crosswork
//!
//! Global flags: --store, --format, --quiet, --verbose, --log-level,
//! --log-json. Structured payloads (assignment content, submission
//! content, evaluation suggestions) are passed inline as JSON or as
//! `@path` file references.

pub mod output;
pub mod parse;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crosswork_core::model::{
    AssignmentType, EvaluatorRole, SchoolStage, SubmissionMode,
};
pub use output::OutputFormat;

/// Crosswork - K12 cross-disciplinary assignment management CLI
#[derive(Parser, Debug)]
#[command(name = "crosswork")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Explicit store root path (defaults to CROSSWORK_STORE, then ./.crosswork)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Verbose logging (crosswork=debug)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Explicit log filter (overrides --verbose)
    #[arg(long, global = true, env = "CROSSWORK_LOG")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new crosswork store
    Init,

    /// Apply pending schema migrations
    Migrate {
        /// Read migration SQL files from a directory instead of the
        /// compiled-in set
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show store health: applied migrations and row counts
    Status,

    /// Design and manage assignments
    Assignment {
        #[command(subcommand)]
        command: AssignmentCommands,
    },

    /// Manage student submissions
    Submission {
        #[command(subcommand)]
        command: SubmissionCommands,
    },

    /// Record and list evaluations
    Evaluation {
        #[command(subcommand)]
        command: EvaluationCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AssignmentCommands {
    /// Create an assignment
    Create {
        /// Assignment title
        title: String,

        /// Short topic (defaults to the title)
        #[arg(long)]
        topic: Option<String>,

        /// Free-form description
        #[arg(long, default_value = "")]
        description: String,

        /// School stage
        #[arg(long, value_parser = parse::parse_school_stage, default_value = "primary")]
        stage: SchoolStage,

        /// Grade (1-9)
        #[arg(long)]
        grade: i64,

        /// Main subject id
        #[arg(long)]
        subject: i64,

        /// Related subject ids (repeatable)
        #[arg(long = "related", action = clap::ArgAction::Append)]
        related_subjects: Vec<i64>,

        /// Assignment type
        #[arg(long = "type", value_parser = parse::parse_assignment_type, default_value = "inquiry")]
        assignment_type: AssignmentType,

        /// Submission mode
        #[arg(long, value_parser = parse::parse_submission_mode, default_value = "phased")]
        mode: SubmissionMode,

        /// Duration in weeks
        #[arg(long, default_value_t = 2)]
        weeks: i64,

        /// Designing teacher's user id
        #[arg(long)]
        teacher: i64,

        /// Structured content as inline JSON or @path
        /// ({objectives, phases, rubric}, e.g. raw AI output)
        #[arg(long)]
        content: Option<String>,
    },

    /// Show an assignment
    Show {
        /// Assignment id
        id: i64,
    },

    /// List assignments
    List {
        /// Filter by designing teacher's user id
        #[arg(long)]
        teacher: Option<i64>,
    },

    /// Publish an assignment so students can submit
    Publish {
        /// Assignment id
        id: i64,
    },

    /// Replace the phase plan wholesale from a regenerated payload
    RegenPhases {
        /// Assignment id
        id: i64,

        /// Phases payload as inline JSON or @path
        #[arg(long)]
        phases: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SubmissionCommands {
    /// Create a draft submission
    Create {
        /// Assignment id
        #[arg(long)]
        assignment: i64,

        /// Student's user id
        #[arg(long)]
        student: i64,

        /// Group id for group work
        #[arg(long)]
        group: Option<i64>,

        /// Zero-based phase index
        #[arg(long, default_value_t = 0)]
        phase: i64,

        /// Submission content as inline JSON or @path
        #[arg(long)]
        content: Option<String>,
    },

    /// Show a submission
    Show {
        /// Submission id
        id: i64,
    },

    /// Update a draft or returned submission's content
    Update {
        /// Submission id
        id: i64,

        /// Submission content as inline JSON or @path
        #[arg(long)]
        content: String,
    },

    /// Formally submit a draft
    Submit {
        /// Submission id
        id: i64,
    },

    /// Send a submission back to the student for revision
    Return {
        /// Submission id
        id: i64,
    },

    /// Delete a draft submission
    Delete {
        /// Submission id
        id: i64,
    },

    /// List submissions
    List {
        /// Filter by assignment id
        #[arg(long)]
        assignment: Option<i64>,

        /// Filter by student's user id
        #[arg(long)]
        student: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum EvaluationCommands {
    /// Record an evaluation of a submission
    Record {
        /// Submission id
        #[arg(long)]
        submission: i64,

        /// Evaluator's user id
        #[arg(long)]
        evaluator: i64,

        /// Evaluator role
        #[arg(long, value_parser = parse::parse_evaluator_role, default_value = "teacher")]
        role: EvaluatorRole,

        /// Overall score (1-4)
        #[arg(long)]
        score: Option<i64>,

        /// Overall level (canonical label, letter grade, or percentage)
        #[arg(long)]
        level: Option<String>,

        /// Per-dimension scores as inline JSON or @path
        #[arg(long)]
        dimensions: Option<String>,

        /// Free-form feedback
        #[arg(long, default_value = "")]
        feedback: String,
    },

    /// Normalize an AI grading suggestion against the rubric and record it
    Suggest {
        /// Submission id
        #[arg(long)]
        submission: i64,

        /// Evaluator's user id the suggestion is recorded under
        #[arg(long)]
        evaluator: i64,

        /// Raw suggestion payload as inline JSON or @path
        #[arg(long)]
        payload: String,
    },

    /// List evaluations for a submission
    List {
        /// Submission id
        #[arg(long)]
        submission: i64,
    },
}
