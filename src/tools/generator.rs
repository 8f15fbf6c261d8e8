//! Per-characteristic tool generation
//!
//! Turns the accessory list into one tool per writable characteristic. The
//! result is a pure function of the input: no network access and no state.

use super::{LIST_ACCESSORIES, SET_CHARACTERISTIC, SET_CHARACTERISTICS_BATCH};
use crate::client::{Accessory, ServiceCharacteristic};
use crate::validation::{CharacteristicFormat, ValidationRule};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};

/// Longest tool name the MCP runtime accepts
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Characters of the accessory id tried first when disambiguating a name
const COLLISION_SUFFIX_LEN: usize = 8;

/// Names owned by the static tools
const RESERVED_NAMES: [&str; 3] = [
    LIST_ACCESSORIES,
    SET_CHARACTERISTIC,
    SET_CHARACTERISTICS_BATCH,
];

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex is valid"));

/// Where a generated tool writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTarget {
    pub unique_id: String,
    pub characteristic_type: String,
}

/// A generated tool bound to one characteristic
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub format: CharacteristicFormat,
    #[serde(skip)]
    pub rule: ValidationRule,
    pub target: WriteTarget,
}

impl ToolDescriptor {
    /// Input schema: a single required `value` constrained by the rule
    pub fn input_schema(&self) -> serde_json::Value {
        let mut value_schema = self.rule.input_schema();
        value_schema["description"] = json!(format!(
            "New {} value ({})",
            self.target.characteristic_type, self.format
        ));
        json!({
            "type": "object",
            "properties": { "value": value_schema },
            "required": ["value"],
        })
    }
}

/// Why a characteristic did not get a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    UnsupportedFormat(String),
    NameTooLong(String),
    /// Accessory and characteristic names have no alphanumeric characters
    EmptyName,
}

/// Characteristic left out of generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTool {
    pub target: WriteTarget,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Generated tools plus everything that was left out
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolGeneration {
    pub tools: Vec<ToolDescriptor>,
    pub skipped: Vec<SkippedTool>,
}

/// Lower-case, collapse non-alphanumeric runs to `_`, trim `_` at both ends
pub fn normalize_tool_name(raw: &str) -> String {
    let lower = raw.to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Build tools for every writable, non-opaque characteristic
pub fn generate(accessories: &[Accessory]) -> ToolGeneration {
    let mut generation = ToolGeneration::default();

    for accessory in accessories {
        for characteristic in &accessory.service_characteristics {
            if !characteristic.can_write || characteristic.format == "tlv8" {
                continue;
            }

            let target = WriteTarget {
                unique_id: accessory.unique_id.clone(),
                characteristic_type: characteristic.characteristic_type.clone(),
            };

            let (format, rule) = match characteristic
                .format
                .parse::<CharacteristicFormat>()
                .and_then(|format| Ok((format, format.rule()?)))
            {
                Ok((format, rule)) => (
                    format,
                    rule.with_bounds(characteristic.min_value, characteristic.max_value),
                ),
                Err(e) => {
                    generation.skipped.push(SkippedTool {
                        target,
                        reason: SkipReason::UnsupportedFormat(e.to_string()),
                    });
                    continue;
                }
            };

            generation.tools.push(ToolDescriptor {
                name: normalize_tool_name(&format!(
                    "{}_{}",
                    accessory.display_name(),
                    characteristic.characteristic_type
                )),
                description: describe(accessory, characteristic, format),
                format,
                rule,
                target,
            });
        }
    }

    let (mut tools, unnamed): (Vec<_>, Vec<_>) = generation
        .tools
        .into_iter()
        .partition(|tool| !tool.name.is_empty());
    generation
        .skipped
        .extend(unnamed.into_iter().map(|tool| SkippedTool {
            reason: SkipReason::EmptyName,
            target: tool.target,
        }));

    assign_unique_names(&mut tools);

    let (tools, too_long): (Vec<_>, Vec<_>) = tools
        .into_iter()
        .partition(|tool| tool.name.len() <= MAX_TOOL_NAME_LEN);
    generation.tools = tools;
    generation
        .skipped
        .extend(too_long.into_iter().map(|tool| SkippedTool {
            reason: SkipReason::NameTooLong(tool.name),
            target: tool.target,
        }));

    generation
}

/// Make every name distinct from each other and from the static tools
///
/// A name held by exactly one tool is kept. Every other tool tries
/// `{name}_{first 8 id chars}`, then `{name}_{full id}`, then a numeric
/// suffix, taking the first candidate nobody holds yet.
fn assign_unique_names(tools: &mut [ToolDescriptor]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for tool in tools.iter() {
        *counts.entry(tool.name.clone()).or_default() += 1;
    }

    let mut taken: HashSet<String> = RESERVED_NAMES.iter().map(|n| n.to_string()).collect();
    let keeps_name: Vec<bool> = tools
        .iter()
        .map(|tool| counts.get(&tool.name) == Some(&1) && !taken.contains(&tool.name))
        .collect();
    taken.extend(
        tools
            .iter()
            .zip(&keeps_name)
            .filter(|(_, keep)| **keep)
            .map(|(tool, _)| tool.name.clone()),
    );

    for (tool, keep) in tools.iter_mut().zip(keeps_name) {
        if keep {
            continue;
        }

        let id: String = normalize_tool_name(
            &tool
                .target
                .unique_id
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>(),
        );
        let short: String = id.chars().take(COLLISION_SUFFIX_LEN).collect();

        let mut candidates = Vec::new();
        if !short.is_empty() {
            candidates.push(format!("{}_{}", tool.name, short));
        }
        if id.len() > short.len() {
            candidates.push(format!("{}_{}", tool.name, id));
        }
        let stem = candidates.last().cloned().unwrap_or_else(|| tool.name.clone());

        let name = match candidates.into_iter().find(|c| !taken.contains(c)) {
            Some(name) => name,
            None => {
                let mut n = 2;
                loop {
                    let candidate = format!("{stem}_{n}");
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                    n += 1;
                }
            }
        };

        taken.insert(name.clone());
        tool.name = name;
    }
}

fn describe(
    accessory: &Accessory,
    characteristic: &ServiceCharacteristic,
    format: CharacteristicFormat,
) -> String {
    let label = if characteristic.description.is_empty() {
        &characteristic.characteristic_type
    } else {
        &characteristic.description
    };

    let mut description = format!(
        "Set {} on {} ({}, id {}). Characteristic type {}, format {}",
        label,
        accessory.display_name(),
        if accessory.human_type.is_empty() {
            &accessory.accessory_type
        } else {
            &accessory.human_type
        },
        accessory.unique_id,
        characteristic.characteristic_type,
        format
    );

    if let Some(unit) = &characteristic.unit {
        description.push_str(&format!(", unit {unit}"));
    }
    match (characteristic.min_value, characteristic.max_value) {
        (Some(min), Some(max)) => description.push_str(&format!(", range {min}..{max}")),
        (Some(min), None) => description.push_str(&format!(", min {min}")),
        (None, Some(max)) => description.push_str(&format!(", max {max}")),
        (None, None) => {}
    }
    if let Some(step) = characteristic.min_step {
        description.push_str(&format!(", step {step}"));
    }
    if let Some(value) = &characteristic.value {
        description.push_str(&format!(". Current value: {value}"));
    }

    description
}
