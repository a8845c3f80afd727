use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::ir::Insn;
use crate::opcodes;
use crate::rules::problem;

/// Flags any instruction whose opcode is in the configured set.
#[derive(Debug)]
pub(crate) struct OpcodeUseRule {
    opcodes: BTreeSet<u8>,
}

impl OpcodeUseRule {
    /// Resolve opcode mnemonics to numeric values. An unknown mnemonic or an
    /// empty set is a configuration error.
    pub(crate) fn parse(entries: &[String]) -> Result<Self> {
        if entries.is_empty() {
            bail!("opcode_use rule requires at least one opcode");
        }
        let mut set = BTreeSet::new();
        for entry in entries {
            match opcodes::value_of(entry) {
                Some(value) => {
                    set.insert(value);
                }
                None => bail!("unknown opcode name: '{entry}'"),
            }
        }
        Ok(Self { opcodes: set })
    }

    pub(crate) fn check(&self, insn: &Insn) -> Option<String> {
        let opcode = insn.opcode?;
        if self.opcodes.contains(&opcode) {
            Some(problem(insn, ""))
        } else {
            None
        }
    }
}
