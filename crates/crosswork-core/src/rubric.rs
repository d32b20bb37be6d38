//! Rubric normalization
//!
//! Rubric data arrives from three sources: human-authored defaults, legacy
//! persisted records (flat name lists or weighted dimensions), and AI-model
//! output (best-effort structured text). This module converts all of them
//! into the one canonical shape before anything is persisted or rendered:
//! `{dimensions: [{name, levels: {excellent, good, pass, improve}}]}`.
//!
//! Normalization never fails; malformed input degrades to generated
//! defaults so the application keeps working with garbage AI output.

use serde_json::Value;

use crate::model::{AssignmentType, Dimension, Level, LevelTexts, Rubric};

/// Generic level description derived from the dimension name, used to
/// backfill a missing level key
pub fn default_level_text(dimension: &str, level: Level) -> String {
    format!("{}达到「{}」水平。", dimension, level.label())
}

/// Level descriptions seeded from a legacy free-text dimension description
fn level_texts_from_description(name: &str, description: &str) -> LevelTexts {
    let base = if description.trim().is_empty() {
        name
    } else {
        description.trim()
    };
    LevelTexts {
        excellent: format!("{}，表现突出，超出预期。", base),
        good: format!("{}，完成良好，略有不足。", base),
        pass: format!("{}，基本达标，仍需打磨。", base),
        improve: format!("{}，尚未达标，需要改进。", base),
    }
}

/// Fill any empty level key with a generated default phrase
fn backfill_levels(name: &str, mut levels: LevelTexts) -> LevelTexts {
    for level in Level::ALL {
        if levels.get(level).trim().is_empty() {
            levels.set(level, default_level_text(name, level));
        }
    }
    levels
}

/// Default rubric for an assignment type, expressed in the four-level model
pub fn default_rubric(assignment_type: AssignmentType) -> Rubric {
    let seeds: &[(&str, &str)] = match assignment_type {
        AssignmentType::Practical => &[
            ("实践准备", "计划完整性与材料准备情况"),
            ("实践参与", "任务完成度与参与积极性"),
            ("过程记录", "记录的完整性与真实性"),
            ("跨学科运用", "多学科知识应用与解释能力"),
            ("成果表达", "成果质量与表达清晰度"),
            ("反思能力", "反思深度与改进意识"),
        ],
        AssignmentType::Project => &[
            ("问题分析", "对真实问题的理解深度"),
            ("规划协作", "计划合理性与团队协作"),
            ("迭代改进", "改进次数与优化质量"),
            ("成果质量", "成果完成度与创新性"),
            ("展示汇报", "表达清晰度与答辩表现"),
            ("复盘反思", "复盘深度与个人成长"),
        ],
        AssignmentType::Inquiry => &[
            ("问题意识", "问题价值性与可探究性"),
            ("方案设计", "方法选择与步骤可操作性"),
            ("探究过程", "数据真实性与过程规范性"),
            ("结论质量", "论证逻辑性与结论可靠性"),
            ("反思能力", "反思深度与改进思路"),
        ],
    };

    Rubric {
        dimensions: seeds
            .iter()
            .map(|(name, description)| Dimension {
                name: name.to_string(),
                levels: level_texts_from_description(name, description),
            })
            .collect(),
    }
}

fn string_field(dim: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| dim.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize one dimension entry from any recognized legacy shape
fn normalize_dimension(raw: &Value, index: usize) -> Option<Dimension> {
    match raw {
        Value::String(name) if !name.trim().is_empty() => {
            let name = name.trim().to_string();
            let levels = backfill_levels(&name, LevelTexts::default());
            Some(Dimension { name, levels })
        }
        Value::Object(dim) => {
            let name = string_field(dim, &["name", "dimension", "criterion"])
                .unwrap_or_else(|| format!("维度{}", index + 1));

            let levels = match dim.get("levels") {
                // Already leveled: keep provided texts, backfill the rest.
                // Numeric weights alongside are dropped.
                Some(Value::Object(level_map)) => {
                    let mut levels = LevelTexts::default();
                    for level in Level::ALL {
                        if let Some(text) =
                            level_map.get(level.as_str()).and_then(Value::as_str)
                        {
                            levels.set(level, text.to_string());
                        }
                    }
                    backfill_levels(&name, levels)
                }
                // Legacy weighted shape: seed all four levels from the
                // free-text description; the weight carries no meaning
                // under the four-level model and is discarded.
                _ => {
                    let description =
                        string_field(dim, &["description", "desc"]).unwrap_or_default();
                    if description.is_empty() {
                        backfill_levels(&name, LevelTexts::default())
                    } else {
                        level_texts_from_description(&name, &description)
                    }
                }
            };
            Some(Dimension { name, levels })
        }
        _ => None,
    }
}

/// Normalize an arbitrary structured value purporting to describe evaluation
/// dimensions into the canonical rubric shape.
///
/// Empty or unrecognizable input yields the default rubric for the
/// assignment type. Idempotent on already-canonical input.
pub fn normalize_rubric(value: &Value, assignment_type: AssignmentType) -> Rubric {
    let dimensions = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("dimensions").or_else(|| map.get("criteria")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let normalized: Vec<Dimension> = dimensions
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| normalize_dimension(raw, index))
        .collect();

    if normalized.is_empty() {
        return default_rubric(assignment_type);
    }

    Rubric {
        dimensions: normalized,
    }
}
