//! Coerces raw model output onto the canonical result types.
//!
//! Each result type carries a table of [`FieldRule`]s. A rule names a field by
//! path, the shape it must have, and what happens when the delivered value
//! cannot be repaired into that shape. Rules run in table order, so a parent
//! rule always runs before the rules for its children. After the table pass the
//! value goes through strict serde deserialization.
//!
//! Path syntax: `a.b` addresses a nested key, `a[].b` addresses key `b` in every
//! element of list `a`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::models::{AnalysisResult, InnovationCategory, Level, RedesignResult, RoadmapResult};

/// Sub-keys tried, in order, when an object shows up where a string belongs.
const REDUCTION_KEYS: &[&str] = &["step", "description", "title", "duration", "timeline"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("model output is not valid JSON: {0}")]
    MalformedOutput(String),
    #[error("model output does not match schema at `{field}`: {reason}")]
    SchemaInvalid { field: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Scalar string. Lists are joined with `", "`, objects reduced by sub-key.
    Text,
    /// Flat list of strings. A comma-joined string is split; object elements are reduced.
    TextList,
    /// Integer in `0..=100`. Numeric strings parse; floats round.
    Score,
    /// One of a fixed set of spellings, matched case-insensitively.
    Choice(&'static [&'static str]),
    Object,
    /// List of objects. A lone object is wrapped.
    ObjectList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Unrepairable value fails the stage.
    Required,
    /// Unrepairable or missing value is replaced by the shape's empty value.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub path: &'static str,
    pub shape: Shape,
    pub fallback: Fallback,
}

const fn required(path: &'static str, shape: Shape) -> FieldRule {
    FieldRule { path, shape, fallback: Fallback::Required }
}

const fn defaulted(path: &'static str, shape: Shape) -> FieldRule {
    FieldRule { path, shape, fallback: Fallback::Default }
}

/// A result type with a coercion table.
pub trait Canonical: DeserializeOwned {
    const RULES: &'static [FieldRule];
}

// ── Tables ───────────────────────────────────────────────────────────────────

pub const ANALYSIS_RULES: &[FieldRule] = &[
    required("ui_ux_audit", Shape::Object),
    required("ui_ux_audit.score", Shape::Score),
    required("ui_ux_audit.issues", Shape::TextList),
    required("ui_ux_audit.positive_findings", Shape::TextList),
    required("seo_audit", Shape::Object),
    required("seo_audit.score", Shape::Score),
    required("seo_audit.issues", Shape::TextList),
    required("seo_audit.missing_elements", Shape::TextList),
    required("performance_audit", Shape::Object),
    required("performance_audit.score_estimation", Shape::Score),
    required("performance_audit.notes", Shape::Text),
    required("mobile_responsiveness_audit", Shape::Object),
    required("mobile_responsiveness_audit.score", Shape::Score),
    required("mobile_responsiveness_audit.issues", Shape::TextList),
    required("accessibility_audit", Shape::Object),
    required("accessibility_audit.score", Shape::Score),
    required("accessibility_audit.issues", Shape::TextList),
    required("innovation_suggestions", Shape::ObjectList),
    required("innovation_suggestions[].name", Shape::Text),
    required("innovation_suggestions[].description", Shape::Text),
    required("innovation_suggestions[].category", Shape::Choice(InnovationCategory::NAMES)),
    required("recommendation_engine", Shape::Object),
    required("recommendation_engine.priority_actions", Shape::ObjectList),
    required("recommendation_engine.priority_actions[].action", Shape::Text),
    required("recommendation_engine.priority_actions[].impact", Shape::Choice(Level::NAMES)),
    required("recommendation_engine.priority_actions[].difficulty", Shape::Choice(Level::NAMES)),
    required("recommendation_engine.priority_actions[].why_it_matters", Shape::Text),
    required("recommendation_engine.priority_actions[].description", Shape::Text),
];

pub const REDESIGN_RULES: &[FieldRule] = &[
    defaulted("color_palette", Shape::Object),
    defaulted("color_palette.primary", Shape::Text),
    defaulted("color_palette.secondary", Shape::Text),
    defaulted("color_palette.accent", Shape::Text),
    defaulted("color_palette.background", Shape::Text),
    defaulted("color_palette.text", Shape::Text),
    defaulted("typography_recommendation", Shape::Object),
    defaulted("typography_recommendation.headings", Shape::Text),
    defaulted("typography_recommendation.body", Shape::Text),
    defaulted("layout_suggestions", Shape::Object),
    defaulted("layout_suggestions.hero_section", Shape::Text),
    defaulted("layout_suggestions.navigation", Shape::Text),
    defaulted("layout_suggestions.key_sections", Shape::TextList),
    defaulted("wireframe_description", Shape::Text),
    defaulted("visual_preview", Shape::Object),
    defaulted("visual_preview.hero", Shape::Object),
    defaulted("visual_preview.hero.headline", Shape::Text),
    defaulted("visual_preview.hero.subheadline", Shape::Text),
    defaulted("visual_preview.hero.cta_text", Shape::Text),
    defaulted("visual_preview.features", Shape::ObjectList),
    defaulted("visual_preview.features[].title", Shape::Text),
    defaulted("visual_preview.features[].description", Shape::Text),
    defaulted("visual_preview.features[].icon", Shape::Text),
    defaulted("visual_preview.testimonials", Shape::ObjectList),
    defaulted("visual_preview.testimonials[].quote", Shape::Text),
    defaulted("visual_preview.testimonials[].author", Shape::Text),
];

pub const ROADMAP_RULES: &[FieldRule] = &[
    defaulted("tech_stack_recommendation", Shape::Object),
    defaulted("tech_stack_recommendation.frontend", Shape::Text),
    defaulted("tech_stack_recommendation.backend", Shape::Text),
    defaulted("tech_stack_recommendation.tools", Shape::TextList),
    required("migration_steps", Shape::TextList),
    required("component_list", Shape::TextList),
    defaulted("estimated_timeline", Shape::Text),
];

impl Canonical for AnalysisResult {
    const RULES: &'static [FieldRule] = ANALYSIS_RULES;
}

impl Canonical for RedesignResult {
    const RULES: &'static [FieldRule] = REDESIGN_RULES;
}

impl Canonical for RoadmapResult {
    const RULES: &'static [FieldRule] = ROADMAP_RULES;
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Parse raw model text and coerce it into `T`.
pub fn normalize<T: Canonical>(raw: &str) -> Result<T, NormalizeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| NormalizeError::MalformedOutput(e.to_string()))?;
    normalize_value(value)
}

pub fn normalize_value<T: Canonical>(value: Value) -> Result<T, NormalizeError> {
    let repaired = repair(value, T::RULES)?;
    serde_json::from_value(repaired).map_err(|e| NormalizeError::SchemaInvalid {
        field: "$".to_string(),
        reason: e.to_string(),
    })
}

/// Run a rule table over `value`. Exposed separately so the repair pass can be
/// checked on its own.
pub fn repair(mut value: Value, rules: &[FieldRule]) -> Result<Value, NormalizeError> {
    if !value.is_object() {
        return Err(NormalizeError::SchemaInvalid {
            field: "$".to_string(),
            reason: format!("expected an object, found {}", kind(&value)),
        });
    }
    for rule in rules {
        let segments = parse_path(rule.path);
        apply(&mut value, &segments, rule, "")?;
    }
    Ok(value)
}

// ── Table evaluation ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    Each,
}

fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        match part.strip_suffix("[]") {
            Some(key) => {
                segments.push(Segment::Key(key));
                segments.push(Segment::Each);
            }
            None => segments.push(Segment::Key(part)),
        }
    }
    segments
}

fn join_trail(trail: &str, key: &str) -> String {
    if trail.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", trail, key)
    }
}

fn apply(
    node: &mut Value,
    segments: &[Segment<'_>],
    rule: &FieldRule,
    trail: &str,
) -> Result<(), NormalizeError> {
    match segments {
        [] => Ok(()),
        [Segment::Key(key)] => {
            let field = join_trail(trail, key);
            let obj = node.as_object_mut().ok_or_else(|| NormalizeError::SchemaInvalid {
                field: field.clone(),
                reason: "parent is not an object".to_string(),
            })?;
            let found = obj.get(*key);
            match found.and_then(|v| coerce(rule.shape, v)) {
                Some(repaired) => {
                    obj.insert(key.to_string(), repaired);
                    Ok(())
                }
                None => match rule.fallback {
                    Fallback::Default => {
                        if let Some(v) = found {
                            tracing::debug!("defaulting `{}`: found {}", field, kind(v));
                        }
                        obj.insert(key.to_string(), empty_value(rule.shape));
                        Ok(())
                    }
                    Fallback::Required => Err(NormalizeError::SchemaInvalid {
                        reason: format!(
                            "expected {}, found {}",
                            describe(rule.shape),
                            found.map_or("nothing", kind)
                        ),
                        field,
                    }),
                },
            }
        }
        [Segment::Key(key), rest @ ..] => {
            let field = join_trail(trail, key);
            match node.get_mut(*key) {
                Some(child) => apply(child, rest, rule, &field),
                None => Err(NormalizeError::SchemaInvalid {
                    field,
                    reason: "missing".to_string(),
                }),
            }
        }
        [Segment::Each, rest @ ..] => {
            let items = node.as_array_mut().ok_or_else(|| NormalizeError::SchemaInvalid {
                field: trail.to_string(),
                reason: "expected a list".to_string(),
            })?;
            for (i, item) in items.iter_mut().enumerate() {
                apply(item, rest, rule, &format!("{}[{}]", trail, i))?;
            }
            Ok(())
        }
    }
}

// ── Coercion rules ───────────────────────────────────────────────────────────

/// Repair `value` into `shape`, or `None` when no repair applies.
fn coerce(shape: Shape, value: &Value) -> Option<Value> {
    match shape {
        Shape::Text => as_text(value).map(Value::String),
        Shape::TextList => as_text_list(value).map(|items| {
            Value::Array(items.into_iter().map(Value::String).collect())
        }),
        Shape::Score => as_score(value).map(Value::from),
        Shape::Choice(names) => value.as_str().and_then(|s| {
            let s = s.trim();
            names
                .iter()
                .find(|n| n.eq_ignore_ascii_case(s))
                .map(|n| Value::String(n.to_string()))
        }),
        Shape::Object => value.is_object().then(|| value.clone()),
        Shape::ObjectList => match value {
            Value::Array(items) if items.iter().all(Value::is_object) => Some(value.clone()),
            Value::Object(_) => Some(Value::Array(vec![value.clone()])),
            _ => None,
        },
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(as_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(map) => Some(reduce_object(map)),
        Value::Null => None,
    }
}

fn as_text_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(as_text).collect()),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Value::Number(_) | Value::Bool(_) => as_text(value).map(|s| vec![s]),
        Value::Object(_) | Value::Null => None,
    }
}

fn as_score(value: &Value) -> Option<u64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u64)
}

/// First recognised sub-key carrying text, else the object's JSON rendering.
fn reduce_object(map: &Map<String, Value>) -> String {
    REDUCTION_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| Value::Object(map.clone()).to_string())
}

fn empty_value(shape: Shape) -> Value {
    match shape {
        Shape::Text => Value::String(String::new()),
        Shape::TextList | Shape::ObjectList => Value::Array(Vec::new()),
        Shape::Object => Value::Object(Map::new()),
        Shape::Score => Value::from(0u64),
        Shape::Choice(names) => Value::String(names.first().copied().unwrap_or("").to_string()),
    }
}

fn describe(shape: Shape) -> &'static str {
    match shape {
        Shape::Text => "a string",
        Shape::TextList => "a list of strings",
        Shape::Score => "a number from 0 to 100",
        Shape::Choice(_) => "one of the allowed values",
        Shape::Object => "an object",
        Shape::ObjectList => "a list of objects",
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
