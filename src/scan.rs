use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use rayon::prelude::*;
use tracing::warn;

use crate::classfile;
use crate::config::RuleSet;
use crate::exclusions::{self, WILDCARD};
use crate::ir::Class;
use crate::report::{locate, Finding, MethodFindings, ScanReport};
use crate::walk::ClassInput;

/// Aggregated scan results plus input accounting.
#[derive(Debug)]
pub(crate) struct ScanOutput {
    pub(crate) report: ScanReport,
    pub(crate) scanned: usize,
    pub(crate) skipped: usize,
}

/// Apply the rule set to every enumerated class, one parallel task per
/// class. A class that fails to decode is skipped with a warning; a
/// duplicate class identity aborts the run.
pub(crate) fn scan_inputs(inputs: &[ClassInput], rules: &RuleSet) -> Result<ScanOutput> {
    let report = ScanReport::new();
    let scanned = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);

    inputs.par_iter().try_for_each(|input| -> Result<()> {
        let class = match classfile::parse(&input.data) {
            Ok(class) => class,
            Err(err) => {
                warn!(source = %input.source, "skipping undecodable class: {err:#}");
                skipped.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
        };
        scanned.fetch_add(1, Ordering::Relaxed);

        let methods = scan_class(&class, rules);
        if !methods.is_empty() {
            report.insert_class(class.name, methods)?;
        }
        Ok(())
    })?;

    Ok(ScanOutput {
        report,
        scanned: scanned.load(Ordering::Relaxed),
        skipped: skipped.load(Ordering::Relaxed),
    })
}

/// Scan one decoded class. Findings for a method are ordered by instruction,
/// then group name, then rule order within the group.
fn scan_class(class: &Class, rules: &RuleSet) -> MethodFindings {
    let mut findings_by_method = MethodFindings::new();

    let class_excluded = exclusions::excluded_groups(&class.annotations, &rules.markers);
    if class_excluded.contains(WILDCARD) {
        return findings_by_method;
    }

    for method in &class.methods {
        let method_excluded = exclusions::excluded_groups(&method.annotations, &rules.markers);
        if method_excluded.contains(WILDCARD) {
            continue;
        }

        let active: Vec<(&String, &Vec<_>)> = rules
            .groups
            .iter()
            .filter(|(name, _)| !class_excluded.contains(*name) && !method_excluded.contains(*name))
            .collect();
        if active.is_empty() {
            continue;
        }

        let mut findings = Vec::new();
        for (index, insn) in method.instructions.iter().enumerate() {
            for &(group, group_rules) in &active {
                for rule in group_rules {
                    if let Some(problem) = rule.check(insn) {
                        findings.push(Finding {
                            group: group.clone(),
                            problem,
                            location: locate(method, index),
                        });
                    }
                }
            }
        }
        if !findings.is_empty() {
            findings_by_method.insert(method.identifier(), findings);
        }
    }

    findings_by_method
}
