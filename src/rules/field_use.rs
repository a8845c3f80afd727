use anyhow::{bail, Result};

use crate::ir::{Insn, InsnKind, MemberRef};
use crate::rules::{internal_name, problem};

/// Flags field-access instructions targeting configured fields.
#[derive(Debug)]
pub(crate) struct FieldUseRule {
    predicates: Vec<FieldPredicate>,
}

#[derive(Debug)]
struct FieldPredicate {
    owner: String,
    name: String,
}

impl FieldUseRule {
    /// Parse `owner name` entries. A `*` name matches every field access on
    /// the owner.
    pub(crate) fn parse(entries: &[String]) -> Result<Self> {
        let mut predicates = Vec::with_capacity(entries.len());
        for entry in entries {
            let segments: Vec<&str> = entry.split_whitespace().collect();
            let &[owner, name] = segments.as_slice() else {
                bail!("expected 2 segments in field predicate, got: '{entry}'");
            };
            predicates.push(FieldPredicate {
                owner: internal_name(owner),
                name: name.to_string(),
            });
        }
        Ok(Self { predicates })
    }

    pub(crate) fn check(&self, insn: &Insn) -> Option<String> {
        let InsnKind::Field(field) = &insn.kind else {
            return None;
        };
        if self.predicates.iter().any(|p| p.matches(field)) {
            Some(problem(
                insn,
                &format!(
                    "usage of field: {} {} : {}",
                    field.owner, field.name, field.descriptor
                ),
            ))
        } else {
            None
        }
    }
}

impl FieldPredicate {
    fn matches(&self, field: &MemberRef) -> bool {
        if field.owner != self.owner {
            return false;
        }
        self.name == "*" || field.name == self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes;

    fn access(opcode: &str, owner: &str, name: &str) -> Insn {
        Insn {
            opcode: opcodes::value_of(opcode),
            kind: InsnKind::Field(MemberRef {
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: "I".to_string(),
            }),
        }
    }

    #[test]
    fn matches_exact_field_name_only() {
        let rule = FieldUseRule::parse(&["com.example.Holder count".to_string()]).expect("parse");

        let found = rule.check(&access("GETSTATIC", "com/example/Holder", "count"));
        assert_eq!(
            found.as_deref(),
            Some("GETSTATIC usage of field: com/example/Holder count : I")
        );

        // No prefix or partial matching.
        assert!(rule.check(&access("GETSTATIC", "com/example/Holder", "counter")).is_none());
        assert!(rule.check(&access("GETSTATIC", "com/example/Holder", "coun")).is_none());
        assert!(rule.check(&access("GETSTATIC", "com/example/Other", "count")).is_none());
    }

    #[test]
    fn wildcard_matches_every_field_on_owner() {
        let rule = FieldUseRule::parse(&["com/example/Holder *".to_string()]).expect("parse");

        assert!(rule.check(&access("PUTFIELD", "com/example/Holder", "a")).is_some());
        assert!(rule.check(&access("GETFIELD", "com/example/Holder", "b")).is_some());
        assert!(rule.check(&access("GETFIELD", "com/example/Other", "a")).is_none());
    }

    #[test]
    fn non_field_instructions_never_match() {
        let rule = FieldUseRule::parse(&["com/example/Holder *".to_string()]).expect("parse");

        let call = Insn {
            opcode: opcodes::value_of("INVOKEVIRTUAL"),
            kind: InsnKind::Call(MemberRef {
                owner: "com/example/Holder".to_string(),
                name: "get".to_string(),
                descriptor: "()I".to_string(),
            }),
        };
        assert!(rule.check(&call).is_none());
    }

    #[test]
    fn malformed_predicate_is_rejected() {
        assert!(FieldUseRule::parse(&["justOneSegment".to_string()]).is_err());
    }
}
