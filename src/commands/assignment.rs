//! `crosswork assignment` - design, publish, and inspect assignments

use chrono::SecondsFormat;

use crosswork_core::db::{Database, NewAssignment};
use crosswork_core::error::Result;
use crosswork_core::model::Assignment;

use crate::cli::{parse, AssignmentCommands, Cli};
use crate::commands::emit;

pub fn execute(cli: &Cli, db: &Database, command: &AssignmentCommands) -> Result<()> {
    match command {
        AssignmentCommands::Create {
            title,
            topic,
            description,
            stage,
            grade,
            subject,
            related_subjects,
            assignment_type,
            mode,
            weeks,
            teacher,
            content,
        } => {
            let content = content.as_deref().map(parse::json_payload).transpose()?;
            let assignment = db.create_assignment(NewAssignment {
                title: title.clone(),
                topic: topic.clone(),
                description: description.clone(),
                school_stage: *stage,
                grade: *grade,
                main_subject_id: *subject,
                related_subject_ids: related_subjects.clone(),
                assignment_type: *assignment_type,
                submission_mode: *mode,
                duration_weeks: *weeks,
                created_by: *teacher,
                content,
            })?;
            emit(cli, &assignment, |a| {
                println!("Created assignment {} ({})", a.id, a.title);
            })
        }

        AssignmentCommands::Show { id } => {
            let assignment = db.get_assignment(*id)?;
            emit(cli, &assignment, print_assignment)
        }

        AssignmentCommands::List { teacher } => {
            let assignments = db.list_assignments(*teacher)?;
            emit(cli, &assignments, |list| {
                for a in list {
                    let published = if a.is_published { "published" } else { "draft" };
                    println!(
                        "{}\t{}\t{}\t{} phases\t{}",
                        a.id,
                        a.title,
                        a.assignment_type.as_str(),
                        a.phases.len(),
                        published
                    );
                }
            })
        }

        AssignmentCommands::Publish { id } => {
            let assignment = db.publish_assignment(*id)?;
            emit(cli, &assignment, |a| {
                println!("Published assignment {} ({})", a.id, a.title);
            })
        }

        AssignmentCommands::RegenPhases { id, phases } => {
            let payload = parse::json_payload(phases)?;
            let assignment = db.replace_assignment_phases(*id, &payload)?;
            emit(cli, &assignment, |a| {
                println!(
                    "Replaced phases of assignment {} ({} phases)",
                    a.id,
                    a.phases.len()
                );
            })
        }
    }
}

fn print_assignment(a: &Assignment) {
    println!("assignment {}: {}", a.id, a.title);
    println!("  topic: {}", a.topic);
    println!(
        "  {} / grade {} / {} / {}",
        a.school_stage.as_str(),
        a.grade,
        a.assignment_type.as_str(),
        a.submission_mode.as_str()
    );
    match &a.published_at {
        Some(at) => println!(
            "  published at {}",
            at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        None => println!("  not published"),
    }
    for (index, phase) in a.phases.iter().enumerate() {
        println!("  phase {}: {} ({} steps)", index, phase.name, phase.steps.len());
    }
    for dim in &a.rubric.dimensions {
        println!("  rubric: {}", dim.name);
    }
}
