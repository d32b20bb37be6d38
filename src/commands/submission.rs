//! `crosswork submission` - submission lifecycle commands

use serde_json::json;

use crosswork_core::db::{Database, NewSubmission, UpdateSubmission};
use crosswork_core::error::Result;
use crosswork_core::model::Submission;

use crate::cli::{parse, Cli, SubmissionCommands};
use crate::commands::emit;

pub fn execute(cli: &Cli, db: &Database, command: &SubmissionCommands) -> Result<()> {
    match command {
        SubmissionCommands::Create {
            assignment,
            student,
            group,
            phase,
            content,
        } => {
            let content = content
                .as_deref()
                .map(parse::json_object_payload)
                .transpose()?
                .unwrap_or_default();
            let submission = db.create_submission(NewSubmission {
                assignment_id: *assignment,
                student_id: *student,
                group_id: *group,
                phase_index: *phase,
                content,
                ..NewSubmission::default()
            })?;
            emit(cli, &submission, |s| {
                println!(
                    "Created draft {} for assignment {} phase {}",
                    s.id, s.assignment_id, s.phase_index
                );
            })
        }

        SubmissionCommands::Show { id } => {
            let submission = db.get_submission(*id)?;
            emit(cli, &submission, print_submission)
        }

        SubmissionCommands::Update { id, content } => {
            let content = parse::json_object_payload(content)?;
            let submission = db.update_submission(
                *id,
                UpdateSubmission {
                    content: Some(content),
                    ..UpdateSubmission::default()
                },
            )?;
            emit(cli, &submission, |s| {
                println!("Updated submission {}", s.id);
            })
        }

        SubmissionCommands::Submit { id } => {
            let outcome = db.submit_submission(*id)?;
            let output = json!({
                "submission": outcome.submission,
                "next_submission_id": outcome.next_submission_id,
            });
            emit(cli, &output, |_| {
                println!("Submitted {}", outcome.submission.id);
                if let Some(next) = outcome.next_submission_id {
                    println!("Next phase draft: {}", next);
                }
            })
        }

        SubmissionCommands::Return { id } => {
            let submission = db.return_submission(*id)?;
            emit(cli, &submission, |s| {
                println!("Returned submission {} for revision", s.id);
            })
        }

        SubmissionCommands::Delete { id } => {
            db.delete_submission(*id)?;
            let output = json!({ "status": "ok", "deleted": id });
            emit(cli, &output, |_| {
                println!("Deleted submission {}", id);
            })
        }

        SubmissionCommands::List {
            assignment,
            student,
        } => {
            let submissions = db.list_submissions(*assignment, *student)?;
            emit(cli, &submissions, |list| {
                for s in list {
                    println!(
                        "{}\tassignment {}\tstudent {}\tphase {}\t{}",
                        s.id,
                        s.assignment_id,
                        s.student_id,
                        s.phase_index,
                        s.status.as_str()
                    );
                }
            })
        }
    }
}

fn print_submission(s: &Submission) {
    println!("submission {} ({})", s.id, s.status.as_str());
    println!(
        "  assignment {} / student {} / phase {}",
        s.assignment_id, s.student_id, s.phase_index
    );
    if !s.content.is_empty() {
        println!("  content keys: {}", s.content.keys().cloned().collect::<Vec<_>>().join(", "));
    }
    if !s.attachments.is_empty() {
        println!("  attachments: {}", s.attachments.len());
    }
}
