//! # Structured-Workout Classification
//!
//! Classifies a structured workout definition (the JSON document a training
//! platform attaches to a planned session) into a high-level workout type,
//! extracts per-step pace/cadence targets, and renders a human-readable
//! summary of the planned steps.
//!
//! Keyword rules are applied to the workout name first (higher confidence),
//! then to its description; the first matching rule wins. Everything here is
//! non-fatal: malformed or missing JSON nodes yield `Unknown` / empty
//! targets, never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::pace::{format_pace, pace_from_speed, PaceUnit};
use crate::segments::StepType;

/// High-level workout type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    /// Speed intervals / track repeats (800 m, 400 m, mile, …)
    Speed,
    /// Hill repeats
    Hill,
    /// Tempo / lactate threshold / race-pace work
    RacePace,
    /// Aerobic base builder
    LongRun,
    /// Easy / recovery
    Easy,
    /// Cadence / form / acceleration drills
    Drills,
    Unknown,
}

/// Classification result for one workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutClassification {
    pub workout_type: WorkoutType,
    /// 0.85 for a name match, 0.70 for a description-only match, 0.50 for
    /// no match
    pub confidence: f64,
    pub reasoning: String,
    pub workout_name: Option<String>,
    pub workout_description: Option<String>,
    /// Human-readable step structure, one line per executable step
    pub structured_summary: String,
}

/// Pace/cadence targets and metadata extracted from one executable workout
/// step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTarget {
    pub step_type: Option<StepType>,
    /// e.g. "time", "distance", "lap.button"
    pub end_condition_key: Option<String>,
    /// Seconds (time) or meters (distance)
    pub end_condition_value: Option<f64>,
    /// Slow bound of the target pace band (s/km)
    pub target_pace_slow_s_per_km: Option<f64>,
    /// Fast bound of the target pace band (s/km)
    pub target_pace_fast_s_per_km: Option<f64>,
    pub target_cadence_low: Option<f64>,
    pub target_cadence_high: Option<f64>,
    pub description: Option<String>,
}

/// Keyword rules in priority order; the first match wins.
fn keyword_rules() -> Vec<(WorkoutType, Regex)> {
    [
        (WorkoutType::Hill, r"(?i)\bhills?\b|\bhill\s+repeat"),
        (WorkoutType::LongRun, r"(?i)\blong.?run\b|\blr\b"),
        (
            WorkoutType::Speed,
            r"(?i)\bspeed\b|\binterval|\b800\s*m?\b|\b400\s*m?\b|\b1200\s*m?\b|\b1600\s*m?\b",
        ),
        (
            WorkoutType::RacePace,
            r"(?i)\btempo\b|\blactate\b|\bthreshold\b|\brace.?pace\b|\bmp\b",
        ),
        (WorkoutType::Easy, r"(?i)\beasy\b|\brecovery\s+run\b|\bjog\b"),
        (
            WorkoutType::Drills,
            r"(?i)\bdrills?\b|\bcadence\b|\bstrides?\b|\bglider\b|\bacceleration\b",
        ),
    ]
    .into_iter()
    .map(|(wtype, pattern)| (wtype, Regex::new(pattern).expect("static keyword pattern")))
    .collect()
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn nested_key(value: &Value, outer: &str, inner: &str) -> Option<String> {
    value.get(outer).and_then(|v| v.get(inner)).and_then(Value::as_str).map(str::to_string)
}

/// Extract targets from one `ExecutableStepDTO` JSON node.
///
/// For pace-zone targets the platform convention is: value one = faster m/s
/// (fewer s/km, the fast bound), value two = slower m/s (the slow bound).
pub fn parse_step_targets(step: &Value) -> StepTarget {
    let target_key = nested_key(step, "targetType", "workoutTargetTypeKey").unwrap_or_default();
    let val_one = step.get("targetValueOne").and_then(Value::as_f64);
    let val_two = step.get("targetValueTwo").and_then(Value::as_f64);

    let mut target = StepTarget {
        step_type: nested_key(step, "stepType", "stepTypeKey")
            .as_deref()
            .and_then(StepType::from_key),
        end_condition_key: nested_key(step, "endCondition", "conditionTypeKey"),
        end_condition_value: step.get("endConditionValue").and_then(Value::as_f64),
        description: str_field(step, "description"),
        ..StepTarget::default()
    };

    match target_key.as_str() {
        "pace.zone" => {
            target.target_pace_fast_s_per_km = val_one.and_then(pace_from_speed);
            target.target_pace_slow_s_per_km = val_two.and_then(pace_from_speed);
        }
        "cadence" => {
            target.target_cadence_low = val_one;
            target.target_cadence_high = val_two;
        }
        _ => {}
    }
    target
}

/// Recursively flatten repeat groups into a list of executable steps.
fn collect_executable_steps<'a>(steps: &'a [Value], out: &mut Vec<&'a Value>) {
    for step in steps {
        if step.get("type").and_then(Value::as_str) == Some("RepeatGroupDTO") {
            if let Some(children) = step.get("workoutSteps").and_then(Value::as_array) {
                collect_executable_steps(children, out);
            }
        } else {
            out.push(step);
        }
    }
}

/// Build a lookup from wktStepIndex to step targets.
///
/// The platform's wktStepIndex on lap data is 0-based while step order in
/// the workout definition is 1-based: wktStepIndex = stepOrder − 1. Repeat
/// group containers occupy step-order slots but generate no laps, so gaps in
/// the resulting keys are expected.
pub fn build_step_target_map(workout_def: &Value) -> HashMap<u32, StepTarget> {
    let mut map = HashMap::new();
    let Some(segments) = workout_def.get("workoutSegments").and_then(Value::as_array) else {
        return map;
    };
    for segment in segments {
        let Some(steps) = segment.get("workoutSteps").and_then(Value::as_array) else {
            continue;
        };
        let mut executable = Vec::new();
        collect_executable_steps(steps, &mut executable);
        for step in executable {
            if let Some(order) = step.get("stepOrder").and_then(Value::as_u64) {
                if order >= 1 {
                    map.insert((order - 1) as u32, parse_step_targets(step));
                }
            }
        }
    }
    map
}

fn format_duration(seconds: f64) -> String {
    let s = seconds as u64;
    format!("{}:{:02}", s / 60, s % 60)
}

fn format_target_pace(pace_s_per_km: f64) -> String {
    format_pace(pace_s_per_km, PaceUnit::PerKm)
}

/// Append summary lines for a step or repeat group.
fn summarize_step(step: &Value, lines: &mut Vec<String>) {
    if step.get("type").and_then(Value::as_str) == Some("RepeatGroupDTO") {
        let n = step.get("numberOfIterations").and_then(Value::as_u64).unwrap_or(1);
        let children = step.get("workoutSteps").and_then(Value::as_array);
        for child in children.into_iter().flatten() {
            let mut child_lines = Vec::new();
            summarize_step(child, &mut child_lines);
            for line in child_lines {
                if line.contains('×') {
                    lines.push(line);
                } else {
                    lines.push(format!("{line} ×{n}"));
                }
            }
        }
        return;
    }

    let target = parse_step_targets(step);
    let step_type_key = nested_key(step, "stepType", "stepTypeKey").unwrap_or_default();
    let description = target.description.clone().unwrap_or_else(|| {
        let mut chars = step_type_key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    });

    let cond_str = match (target.end_condition_key.as_deref(), target.end_condition_value) {
        (Some("distance"), Some(v)) => format!("{}m", v as i64),
        (Some("time"), Some(v)) => format_duration(v),
        (Some("lap.button"), _) => "lap button".to_string(),
        (Some("iterations"), _) => "repeats".to_string(),
        _ => String::new(),
    };

    let target_str = match (
        target.target_pace_slow_s_per_km,
        target.target_pace_fast_s_per_km,
        target.target_cadence_low,
        target.target_cadence_high,
    ) {
        (Some(slow), Some(fast), _, _) => format!(
            "target pace {}–{}",
            format_target_pace(fast),
            format_target_pace(slow)
        ),
        (_, _, Some(low), Some(high)) => {
            format!("target cadence {}–{} spm", low as i64, high as i64)
        }
        _ => "no target".to_string(),
    };

    let mut parts = vec![description];
    if !cond_str.is_empty() {
        parts.push(cond_str);
    }
    parts.push(format!("| {target_str}"));
    lines.push(parts.join(" "));
}

/// Multi-line human-readable summary of the workout's planned steps.
fn build_structured_summary(workout_def: &Value) -> String {
    let mut lines = Vec::new();
    if let Some(segments) = workout_def.get("workoutSegments").and_then(Value::as_array) {
        for segment in segments {
            if let Some(steps) = segment.get("workoutSteps").and_then(Value::as_array) {
                for step in steps {
                    summarize_step(step, &mut lines);
                }
            }
        }
    }
    if lines.is_empty() {
        "(no steps)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Classify a structured workout definition into a [`WorkoutType`].
///
/// Keyword rules are checked against the workout name first (confidence
/// 0.85), then the description (0.70); no match yields `Unknown` (0.50).
pub fn classify_workout_definition(workout_def: &Value) -> WorkoutClassification {
    let name = str_field(workout_def, "workoutName").unwrap_or_default();
    let description = str_field(workout_def, "description").unwrap_or_default();

    let rules = keyword_rules();
    let mut workout_type = WorkoutType::Unknown;
    let mut confidence = 0.50;
    let mut reasoning = "No keyword matched in name or description.".to_string();

    for (wtype, pattern) in &rules {
        if pattern.is_match(&name) {
            workout_type = *wtype;
            confidence = 0.85;
            reasoning = format!("Keyword matched in workout name: '{}'", pattern.as_str());
            break;
        }
    }

    if workout_type == WorkoutType::Unknown {
        for (wtype, pattern) in &rules {
            if pattern.is_match(&description) {
                workout_type = *wtype;
                confidence = 0.70;
                reasoning = format!("Keyword matched in description: '{}'", pattern.as_str());
                break;
            }
        }
    }

    WorkoutClassification {
        workout_type,
        confidence,
        reasoning,
        workout_name: (!name.is_empty()).then_some(name),
        workout_description: (!description.is_empty()).then_some(description),
        structured_summary: build_structured_summary(workout_def),
    }
}

/// Classify a workout definition supplied as a raw JSON string.
///
/// Returns `None` if the string is not valid JSON; always non-fatal.
pub fn classify_workout_json(raw: &str) -> Option<WorkoutClassification> {
    let workout_def: Value = serde_json::from_str(raw).ok()?;
    Some(classify_workout_definition(&workout_def))
}

// =============================================================================
// Unit Tests
// =============================================================================
