use crate::descriptor;
use crate::ir::{Insn, InsnKind, MemberRef};
use crate::rules::{internal_name, problem};

/// Flags type instructions, field accesses, and method calls that reference
/// a type under one of the configured name prefixes, looking through member
/// descriptors recursively.
#[derive(Debug)]
pub(crate) struct TypeUseRule {
    prefixes: Vec<String>,
}

impl TypeUseRule {
    pub(crate) fn parse(entries: &[String]) -> Self {
        Self {
            prefixes: entries.iter().map(|e| internal_name(e)).collect(),
        }
    }

    pub(crate) fn check(&self, insn: &Insn) -> Option<String> {
        if self.matches(insn) {
            Some(problem(insn, ""))
        } else {
            None
        }
    }

    fn matches(&self, insn: &Insn) -> bool {
        match &insn.kind {
            InsnKind::TypeRef(operand) => descriptor::element_class(operand)
                .is_some_and(|class| self.matches_name(&class)),
            InsnKind::Field(member) | InsnKind::Call(member) => self.matches_member(member),
            _ => false,
        }
    }

    fn matches_member(&self, member: &MemberRef) -> bool {
        if self.matches_name(&member.owner) {
            return true;
        }
        descriptor::referenced_classes(&member.descriptor)
            .iter()
            .any(|class| self.matches_name(class))
    }

    fn matches_name(&self, name: &str) -> bool {
        self.prefixes.iter().any(|prefix| name.starts_with(prefix))
    }
}
