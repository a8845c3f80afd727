use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{bail, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::ir::{InsnKind, Method};

/// Where a finding sits inside its method: the nearest preceding source line
/// when the compiler emitted one, always the absolute instruction index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Location {
    pub(crate) line: Option<u16>,
    pub(crate) index: usize,
}

impl Location {
    pub(crate) fn describe(&self) -> String {
        match self.line {
            Some(line) => format!("line {line}"),
            None => format!("insn index {}", self.index),
        }
    }
}

/// Resolve the location of the instruction at `index` by scanning backward
/// for the nearest line-number marker. The walk is bounded by the distance
/// to the previous marker, not the whole method.
pub(crate) fn locate(method: &Method, index: usize) -> Location {
    let line = method.instructions[..=index]
        .iter()
        .rev()
        .find_map(|insn| match insn.kind {
            InsnKind::Line(line) => Some(line),
            _ => None,
        });
    Location { line, index }
}

/// One detected violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Finding {
    pub(crate) group: String,
    pub(crate) problem: String,
    pub(crate) location: Location,
}

/// Findings of one class, keyed by method identifier.
pub(crate) type MethodFindings = BTreeMap<String, Vec<Finding>>;

/// Fully aggregated report: class name -> method identifier -> findings.
pub(crate) type SortedReport = BTreeMap<String, MethodFindings>;

/// Concurrent aggregation target shared by scan workers. Class entries are
/// written exactly once; a second write for the same class name is an
/// integrity error, never a silent overwrite.
#[derive(Debug, Default)]
pub(crate) struct ScanReport {
    classes: DashMap<String, MethodFindings>,
}

impl ScanReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_class(&self, name: String, methods: MethodFindings) -> Result<()> {
        match self.classes.entry(name) {
            Entry::Occupied(entry) => bail!("duplicate class detected: {}", entry.key()),
            Entry::Vacant(entry) => {
                entry.insert(methods);
                Ok(())
            }
        }
    }

    /// Snapshot with deterministic ordering for rendering.
    pub(crate) fn into_sorted(self) -> SortedReport {
        self.classes.into_iter().collect()
    }
}

/// Render the grouped listing, or the distinguishable all-clear line.
pub(crate) fn render_text(report: &SortedReport, writer: &mut impl Write) -> Result<()> {
    if report.is_empty() {
        writeln!(writer, "All good.")?;
        return Ok(());
    }
    writeln!(writer, "Errors detected:")?;
    for (class, methods) in report {
        writeln!(writer, "{class}")?;
        for (method, findings) in methods {
            writeln!(writer, " {method}")?;
            for finding in findings {
                writeln!(
                    writer,
                    "  [{}] {}, {}",
                    finding.group,
                    finding.problem,
                    finding.location.describe()
                )?;
            }
        }
    }
    Ok(())
}
