use crate::ir::Insn;
use crate::opcodes;

pub(crate) mod field_use;
pub(crate) mod method_use;
pub(crate) mod opcode_use;
pub(crate) mod type_use;

pub(crate) use field_use::FieldUseRule;
pub(crate) use method_use::MethodUseRule;
pub(crate) use opcode_use::OpcodeUseRule;
pub(crate) use type_use::TypeUseRule;

/// One configured matcher. Each variant holds an immutable predicate list
/// built at configuration time, so a `Rule` is freely shared across scan
/// workers without synchronization.
#[derive(Debug)]
pub(crate) enum Rule {
    MethodUse(MethodUseRule),
    FieldUse(FieldUseRule),
    OpcodeUse(OpcodeUseRule),
    TypeUse(TypeUseRule),
}

impl Rule {
    /// Test one instruction, returning the problem description on a match.
    pub(crate) fn check(&self, insn: &Insn) -> Option<String> {
        match self {
            Rule::MethodUse(rule) => rule.check(insn),
            Rule::FieldUse(rule) => rule.check(insn),
            Rule::OpcodeUse(rule) => rule.check(insn),
            Rule::TypeUse(rule) => rule.check(insn),
        }
    }
}

/// Problem text for a matched instruction: the concrete opcode mnemonic,
/// optionally followed by a member description.
pub(super) fn problem(insn: &Insn, detail: &str) -> String {
    let name = match insn.opcode {
        Some(opcode) => opcodes::mnemonic(opcode),
        None => "UNKNOWN".to_string(),
    };
    if detail.is_empty() {
        name
    } else {
        format!("{name} {detail}")
    }
}

/// Internal-name form of a configured type: dots become slashes.
pub(super) fn internal_name(name: &str) -> String {
    name.replace('.', "/")
}
