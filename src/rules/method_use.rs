use anyhow::{bail, Result};

use crate::ir::{Insn, InsnKind, MemberRef};
use crate::rules::{internal_name, problem};

/// Flags call instructions targeting configured methods.
#[derive(Debug)]
pub(crate) struct MethodUseRule {
    predicates: Vec<MethodPredicate>,
}

#[derive(Debug)]
struct MethodPredicate {
    owner: String,
    name: String,
    descriptor: Option<String>,
}

impl MethodUseRule {
    /// Parse `owner name` or `owner name(desc)` entries. A `*` name matches
    /// every call on the owner.
    pub(crate) fn parse(entries: &[String]) -> Result<Self> {
        let mut predicates = Vec::with_capacity(entries.len());
        for entry in entries {
            let segments: Vec<&str> = entry.split_whitespace().collect();
            let &[owner, member] = segments.as_slice() else {
                bail!("expected 2 segments in method predicate, got: '{entry}'");
            };

            let (name, descriptor) = match member.find('(') {
                Some(brace) => (&member[..brace], Some(member[brace..].to_string())),
                None => (member, None),
            };

            predicates.push(MethodPredicate {
                owner: internal_name(owner),
                name: name.to_string(),
                descriptor,
            });
        }
        Ok(Self { predicates })
    }

    pub(crate) fn check(&self, insn: &Insn) -> Option<String> {
        let InsnKind::Call(call) = &insn.kind else {
            return None;
        };
        if self.predicates.iter().any(|p| p.matches(call)) {
            Some(problem(
                insn,
                &format!("usage of method: {} {}{}", call.owner, call.name, call.descriptor),
            ))
        } else {
            None
        }
    }
}

impl MethodPredicate {
    fn matches(&self, call: &MemberRef) -> bool {
        if call.owner != self.owner {
            return false;
        }
        if self.name == "*" {
            return true;
        }
        if call.name != self.name {
            return false;
        }
        match &self.descriptor {
            Some(descriptor) => *descriptor == call.descriptor,
            None => true,
        }
    }
}
