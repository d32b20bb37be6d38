//! Normalization of AI-model output
//!
//! The LLM call itself is an external collaborator: an opaque function
//! returning best-effort structured text that may be malformed. Nothing an
//! AI tool produced is trusted until it has passed through this module,
//! which coerces arbitrary JSON into the typed shapes the store persists.
//! Like the rubric normalizer, these functions never fail; garbage input
//! degrades to plausible defaults.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{
    AssignmentType, Checkpoint, Level, Objectives, Phase, Rubric, Step,
};
use crate::rubric::normalize_rubric;
use crate::scoring;

/// Structured content generated for an assignment: objectives, phased task
/// guidance, and a rubric
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub objectives: Objectives,
    pub phases: Vec<Phase>,
    pub rubric: Rubric,
}

/// A normalized AI evaluation suggestion, guaranteed in-range and
/// label-consistent
#[derive(Debug, Clone, serde::Serialize)]
pub struct EvaluationSuggestion {
    pub score_numeric: i64,
    pub score_level: Level,
    pub dimension_scores: BTreeMap<String, i64>,
    pub feedback: String,
}

const EVIDENCE_TYPES: [&str; 6] = ["text", "document", "image", "video", "confirm", "link"];

/// Guess the evidence type a checkpoint asks for from its wording
fn infer_evidence_type(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    if lowered.contains("http") || lowered.contains("www.") || text.contains("链接") {
        return "link";
    }
    if ["视频", "录像", "录屏", "音频", "录音"]
        .iter()
        .any(|kw| text.contains(kw))
    {
        return "video";
    }
    if ["图片", "照片", "图表", "截图", "海报", "流程图"]
        .iter()
        .any(|kw| text.contains(kw))
    {
        return "image";
    }
    if ["确认", "勾选", "已读", "签字"].iter().any(|kw| text.contains(kw)) {
        return "confirm";
    }
    if ["报告", "文档", "表格", "清单", "记录", "方案", "问卷", "日志", "论文"]
        .iter()
        .any(|kw| text.contains(kw))
        || ["ppt", "pdf", "doc", "xls"].iter().any(|kw| lowered.contains(kw))
    {
        return "document";
    }
    "text"
}

fn str_at<'a>(map: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Objectives accepted as a map, a positional list, or a bare string
fn normalize_objectives(value: Option<&Value>) -> Objectives {
    match value {
        Some(Value::Object(map)) => Objectives {
            knowledge: str_at(map, &["knowledge"]).unwrap_or_default().to_string(),
            process: str_at(map, &["process"]).unwrap_or_default().to_string(),
            emotion: str_at(map, &["emotion"]).unwrap_or_default().to_string(),
        },
        Some(Value::Array(items)) => {
            let text = |i: usize| {
                items
                    .get(i)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Objectives {
                knowledge: text(0),
                process: text(1),
                emotion: text(2),
            }
        }
        Some(Value::String(s)) => Objectives {
            knowledge: s.clone(),
            ..Objectives::default()
        },
        _ => Objectives::default(),
    }
}

fn normalize_checkpoint(raw: &Value, context: &str) -> Option<Checkpoint> {
    let (content, evidence_type) = match raw {
        Value::String(s) => (s.trim().to_string(), None),
        Value::Object(map) => {
            let content = str_at(map, &["content", "text", "description"])?
                .to_string();
            let evidence_type = str_at(map, &["evidence_type"])
                .filter(|et| EVIDENCE_TYPES.contains(et))
                .map(str::to_string);
            (content, evidence_type)
        }
        _ => return None,
    };
    if content.is_empty() {
        return None;
    }
    let evidence_type = evidence_type.unwrap_or_else(|| {
        let seed = if content.is_empty() { context } else { &content };
        infer_evidence_type(seed).to_string()
    });
    Some(Checkpoint {
        content,
        evidence_type,
    })
}

/// Lists that AI models sometimes emit as a single object or bare string
fn coerce_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(_)) => vec![value.cloned().unwrap_or(Value::Null)],
        Some(Value::String(s)) => vec![Value::String(s.clone())],
        _ => Vec::new(),
    }
}

fn normalize_step(raw: &Value) -> Option<Step> {
    let map = match raw {
        Value::String(s) => {
            return Some(Step {
                name: s.chars().take(12).collect(),
                description: s.clone(),
                checkpoints: Vec::new(),
            });
        }
        Value::Object(map) => map,
        _ => return None,
    };

    let description = str_at(map, &["description", "content", "detail"])
        .unwrap_or_default()
        .to_string();
    let checkpoints: Vec<Checkpoint> =
        coerce_list(map.get("checkpoints").or_else(|| map.get("checkpoint")))
            .iter()
            .filter_map(|cp| normalize_checkpoint(cp, &description))
            .collect();

    let name = str_at(map, &["name", "title", "label"])
        .map(str::to_string)
        .unwrap_or_else(|| {
            if !description.is_empty() {
                description.chars().take(12).collect()
            } else if let Some(cp) = checkpoints.first() {
                cp.content.chars().take(12).collect()
            } else {
                "步骤".to_string()
            }
        });

    let description = if description.is_empty() {
        checkpoints
            .first()
            .map(|cp| cp.content.clone())
            .unwrap_or_default()
    } else {
        description
    };

    Some(Step {
        name,
        description,
        checkpoints,
    })
}

fn normalize_phases(value: Option<&Value>) -> Vec<Phase> {
    coerce_list(value)
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let map = match raw {
                Value::String(s) => {
                    return Some(Phase {
                        name: s.clone(),
                        order: (index + 1) as i64,
                        steps: Vec::new(),
                    });
                }
                Value::Object(map) => map,
                _ => return None,
            };
            let name = str_at(map, &["name", "title", "phase"])
                .map(str::to_string)
                .unwrap_or_else(|| format!("阶段{}", index + 1));
            let order = map
                .get("order")
                .and_then(Value::as_i64)
                .unwrap_or((index + 1) as i64);
            let steps = coerce_list(map.get("steps").or_else(|| map.get("items")))
                .iter()
                .filter_map(normalize_step)
                .collect();
            Some(Phase { name, order, steps })
        })
        .collect()
}

/// Normalize a raw AI assignment-generation payload into typed content.
///
/// A missing or malformed rubric falls back to the per-type default; empty
/// objectives/phases are returned empty so the caller can substitute its
/// own templates.
pub fn normalize_assignment_output(
    payload: &Value,
    assignment_type: AssignmentType,
) -> GeneratedContent {
    let map = payload.as_object();
    let objectives = normalize_objectives(map.and_then(|m| m.get("objectives")));
    let phases = normalize_phases(
        map.and_then(|m| m.get("phases").or_else(|| m.get("phase"))),
    );
    let rubric = normalize_rubric(
        map.and_then(|m| m.get("rubric")).unwrap_or(&Value::Null),
        assignment_type,
    );

    GeneratedContent {
        objectives,
        phases,
        rubric,
    }
}

const DEFAULT_SUGGESTION_FEEDBACK: &str =
    "请补充更具体的过程证据，并将每一步与评价维度对应起来。";

/// Normalize a raw AI evaluation suggestion against the assignment rubric.
///
/// Suggested scores go through the same clamp/derive pipeline as human
/// input: every dimension is clamped into [1,4], the aggregate is
/// recomputed from the clamped dimensions, and the level is re-derived
/// from the aggregate.
pub fn normalize_suggestion(payload: &Value, rubric: &Rubric) -> EvaluationSuggestion {
    let map = payload.as_object();

    let suggested_level = map
        .and_then(|m| {
            m.get("suggested_level")
                .or_else(|| m.get("suggested_score"))
                .or_else(|| m.get("score_level"))
        })
        .map(scoring::level_from_legacy)
        .unwrap_or(Level::Pass);

    let empty = serde_json::Map::new();
    let raw_scores = map
        .and_then(|m| m.get("dimension_scores"))
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let dimension_scores = scoring::normalize_dimension_scores(
        &rubric.dimensions,
        raw_scores,
        suggested_level.score(),
    );

    let score_numeric =
        scoring::average_score(&dimension_scores).unwrap_or_else(|| suggested_level.score());
    let score_level = Level::from_score(score_numeric);

    let feedback = map
        .and_then(|m| str_at(m, &["feedback", "comment"]))
        .unwrap_or(DEFAULT_SUGGESTION_FEEDBACK)
        .to_string();

    EvaluationSuggestion {
        score_numeric,
        score_level,
        dimension_scores,
        feedback,
    }
}
