//! `crosswork evaluation` - record and list evaluations

use serde_json::Value;

use crosswork_core::ai;
use crosswork_core::db::{Database, NewEvaluation};
use crosswork_core::error::Result;
use crosswork_core::model::EvaluatorRole;

use crate::cli::{parse, Cli, EvaluationCommands};
use crate::commands::emit;

pub fn execute(cli: &Cli, db: &Database, command: &EvaluationCommands) -> Result<()> {
    match command {
        EvaluationCommands::Record {
            submission,
            evaluator,
            role,
            score,
            level,
            dimensions,
            feedback,
        } => {
            let dimension_scores = dimensions
                .as_deref()
                .map(parse::json_object_payload)
                .transpose()?
                .unwrap_or_default();
            let response = db.record_evaluation(NewEvaluation {
                submission_id: *submission,
                evaluator_id: *evaluator,
                role: *role,
                score_numeric: *score,
                score_level: level.clone().map(Value::String),
                dimension_scores,
                feedback: feedback.clone(),
                ai_generated: false,
            })?;
            emit(cli, &response, |r| {
                println!(
                    "Recorded {} evaluation {} of submission {}: {} ({})",
                    r.evaluation.role.as_str(),
                    r.evaluation.id,
                    r.evaluation.submission_id,
                    r.evaluation.score_numeric,
                    r.score_level_label
                );
            })
        }

        EvaluationCommands::Suggest {
            submission,
            evaluator,
            payload,
        } => {
            // The raw model output is coerced against the assignment's
            // rubric before anything touches the database
            let raw = parse::json_payload(payload)?;
            let row = db.get_submission(*submission)?;
            let assignment = db.get_assignment(row.assignment_id)?;
            let suggestion = ai::normalize_suggestion(&raw, &assignment.rubric);

            let dimension_scores = suggestion
                .dimension_scores
                .iter()
                .map(|(name, score)| (name.clone(), Value::from(*score)))
                .collect();
            let response = db.record_evaluation(NewEvaluation {
                submission_id: *submission,
                evaluator_id: *evaluator,
                role: EvaluatorRole::Teacher,
                score_numeric: Some(suggestion.score_numeric),
                score_level: None,
                dimension_scores,
                feedback: suggestion.feedback,
                ai_generated: true,
            })?;
            emit(cli, &response, |r| {
                println!(
                    "Recorded AI-suggested evaluation {} of submission {}: {} ({})",
                    r.evaluation.id,
                    r.evaluation.submission_id,
                    r.evaluation.score_numeric,
                    r.score_level_label
                );
            })
        }

        EvaluationCommands::List { submission } => {
            let responses = db.list_evaluations(*submission)?;
            emit(cli, &responses, |list| {
                for r in list {
                    let evaluator = if r.evaluation.is_anonymous {
                        "anonymous".to_string()
                    } else {
                        r.evaluation.evaluator_id.to_string()
                    };
                    println!(
                        "{}\t{}\tby {}\t{} ({})",
                        r.evaluation.id,
                        r.evaluation.role.as_str(),
                        evaluator,
                        r.evaluation.score_numeric,
                        r.score_level_label
                    );
                }
            })
        }
    }
}
