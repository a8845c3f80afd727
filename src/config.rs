use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::rules::{FieldUseRule, MethodUseRule, OpcodeUseRule, Rule, TypeUseRule};

/// On-disk configuration shape:
///
/// ```json
/// {
///   "settings": { "ignore_annotations": ["Lcom/example/IgnoreChecks;"] },
///   "groups": {
///     "banned": {
///       "method_use": ["com/example/Util unsafeOp(I)V"],
///       "field_use": ["com/example/Holder *"],
///       "opcode_use": ["MONITORENTER"],
///       "type_use": ["sun/misc"]
///     }
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    groups: BTreeMap<String, GroupSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    #[serde(default)]
    ignore_annotations: Vec<String>,
}

/// One rule group. Unknown discriminants are rejected at parse time.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupSpec {
    method_use: Option<Vec<String>>,
    field_use: Option<Vec<String>>,
    opcode_use: Option<Vec<String>>,
    type_use: Option<Vec<String>>,
}

/// The immutable rule configuration shared read-only by all scan workers.
/// Groups evaluate in name order; within a group, rules evaluate in the
/// fixed order method_use, field_use, opcode_use, type_use.
#[derive(Debug)]
pub(crate) struct RuleSet {
    pub(crate) markers: HashSet<String>,
    pub(crate) groups: BTreeMap<String, Vec<Rule>>,
}

pub(crate) fn load(path: &Path) -> Result<RuleSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ConfigFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    build(config)
}

pub(crate) fn build(config: ConfigFile) -> Result<RuleSet> {
    let markers = config.settings.ignore_annotations.into_iter().collect();

    let mut groups = BTreeMap::new();
    for (name, spec) in config.groups {
        let mut rules = Vec::new();
        if let Some(entries) = &spec.method_use {
            let rule = MethodUseRule::parse(entries)
                .with_context(|| format!("invalid method_use rule in group '{name}'"))?;
            rules.push(Rule::MethodUse(rule));
        }
        if let Some(entries) = &spec.field_use {
            let rule = FieldUseRule::parse(entries)
                .with_context(|| format!("invalid field_use rule in group '{name}'"))?;
            rules.push(Rule::FieldUse(rule));
        }
        if let Some(entries) = &spec.opcode_use {
            let rule = OpcodeUseRule::parse(entries)
                .with_context(|| format!("invalid opcode_use rule in group '{name}'"))?;
            rules.push(Rule::OpcodeUse(rule));
        }
        if let Some(entries) = &spec.type_use {
            rules.push(Rule::TypeUse(TypeUseRule::parse(entries)));
        }
        groups.insert(name, rules);
    }

    Ok(RuleSet { markers, groups })
}
