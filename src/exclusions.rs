use std::collections::HashSet;

use tracing::warn;

use crate::ir::{Annotation, AnnotationValue};

/// Wildcard group name suppressing every rule group for its scope.
pub(crate) const WILDCARD: &str = "*";

/// Resolve the rule-group names suppressed by the given annotation list.
///
/// Every annotation whose descriptor is a recognized suppression marker
/// contributes its group-name array. A marker with no arguments suppresses
/// everything for its scope. Malformed marker arguments are logged and
/// contribute nothing; the scan continues.
pub(crate) fn excluded_groups(
    annotations: &[Annotation],
    markers: &HashSet<String>,
) -> HashSet<String> {
    let mut excluded = HashSet::new();
    for annotation in annotations {
        if !markers.contains(&annotation.descriptor) {
            continue;
        }
        if annotation.values.is_empty() {
            excluded.insert(WILDCARD.to_string());
            continue;
        }
        let [(_, value)] = &annotation.values[..] else {
            warn!(
                annotation = %annotation.descriptor,
                "failed to parse suppression marker: expected a single element, got {}",
                annotation.values.len()
            );
            continue;
        };
        add_values(&mut excluded, value, &annotation.descriptor);
    }
    excluded
}

fn add_values(excluded: &mut HashSet<String>, value: &AnnotationValue, descriptor: &str) {
    match value {
        AnnotationValue::Str(group) => {
            excluded.insert(group.clone());
        }
        AnnotationValue::List(values) => {
            for value in values {
                add_values(excluded, value, descriptor);
            }
        }
        AnnotationValue::Other => {
            warn!(
                annotation = %descriptor,
                "unexpected value type in suppression marker"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Lcom/example/IgnoreChecks;";

    fn markers() -> HashSet<String> {
        HashSet::from([MARKER.to_string()])
    }

    fn marker_with(values: Vec<(String, AnnotationValue)>) -> Annotation {
        Annotation {
            descriptor: MARKER.to_string(),
            values,
        }
    }

    fn groups(names: &[&str]) -> Annotation {
        marker_with(vec![(
            "value".to_string(),
            AnnotationValue::List(
                names
                    .iter()
                    .map(|n| AnnotationValue::Str(n.to_string()))
                    .collect(),
            ),
        )])
    }

    #[test]
    fn empty_annotation_list_yields_empty_set() {
        assert!(excluded_groups(&[], &markers()).is_empty());
    }

    #[test]
    fn unrecognized_annotations_contribute_nothing() {
        let other = Annotation {
            descriptor: "Ljava/lang/Deprecated;".to_string(),
            values: Vec::new(),
        };
        assert!(excluded_groups(&[other], &markers()).is_empty());
    }

    #[test]
    fn marker_groups_are_unioned() {
        let excluded = excluded_groups(&[groups(&["banned"]), groups(&["unsafe", "io"])], &markers());
        assert_eq!(
            excluded,
            HashSet::from(["banned".to_string(), "unsafe".to_string(), "io".to_string()])
        );
    }

    #[test]
    fn marker_without_arguments_means_wildcard() {
        let excluded = excluded_groups(&[marker_with(Vec::new())], &markers());
        assert!(excluded.contains(WILDCARD));
    }

    #[test]
    fn malformed_marker_contributes_no_suppression() {
        let malformed = marker_with(vec![
            ("value".to_string(), AnnotationValue::Str("banned".to_string())),
            ("extra".to_string(), AnnotationValue::Str("io".to_string())),
        ]);
        let excluded = excluded_groups(&[malformed, groups(&["unsafe"])], &markers());
        // The malformed instance is skipped, the well-formed one still counts.
        assert_eq!(excluded, HashSet::from(["unsafe".to_string()]));
    }

    #[test]
    fn non_string_values_are_ignored() {
        let odd = marker_with(vec![("value".to_string(), AnnotationValue::Other)]);
        assert!(excluded_groups(&[odd], &markers()).is_empty());
    }
}
