use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use jclassfile::attributes::{
    Annotation as RawAnnotation, Attribute, BootstrapMethodRecord as BootstrapMethod, ElementValue,
};
use jclassfile::class_file;
use jclassfile::constant_pool::ConstantPool;

use crate::ir::{Annotation, AnnotationValue, Class, DynamicRef, Insn, InsnKind, MemberRef, Method};

/// Decode a class file into the scan engine's view types: class name,
/// runtime-visible annotations, and per-method instruction sequences with
/// line-number markers interleaved. Container parsing is delegated to
/// `jclassfile`; only the instruction stream, which the container keeps as
/// raw `Code` bytes, is decoded here.
pub(crate) fn parse(data: &[u8]) -> Result<Class> {
    let class_file = class_file::parse(data).context("malformed class file")?;
    let pool = class_file.constant_pool();

    let name = class_name(pool, class_file.this_class())?.to_string();

    let mut annotations = Vec::new();
    let mut bootstrap = Vec::new();
    for attribute in class_file.attributes() {
        match attribute {
            Attribute::RuntimeVisibleAnnotations { annotations: raw, .. } => {
                annotations = convert_annotations(pool, raw)?;
            }
            Attribute::BootstrapMethods { bootstrap_methods, .. } => {
                bootstrap = bootstrap_handles(pool, bootstrap_methods)?;
            }
            _ => {}
        }
    }

    let mut methods = Vec::with_capacity(class_file.methods().len());
    for info in class_file.methods() {
        let method_name = utf8(pool, info.name_index())?.to_string();
        let descriptor = utf8(pool, info.descriptor_index())?.to_string();

        let mut method_annotations = Vec::new();
        let mut instructions = Vec::new();
        for attribute in info.attributes() {
            match attribute {
                Attribute::Code { code, attributes, .. } => {
                    let lines = line_table(attributes);
                    instructions = decode_instructions(code, &lines, pool, &bootstrap)
                        .with_context(|| format!("undecodable bytecode in {method_name}"))?;
                }
                Attribute::RuntimeVisibleAnnotations { annotations: raw, .. } => {
                    method_annotations = convert_annotations(pool, raw)?;
                }
                _ => {}
            }
        }

        methods.push(Method {
            name: method_name,
            descriptor,
            annotations: method_annotations,
            instructions,
        });
    }

    Ok(Class {
        name,
        annotations,
        methods,
    })
}

/// Flattened LineNumberTable entries nested inside a `Code` attribute.
fn line_table(attributes: &[Attribute]) -> Vec<(u16, u16)> {
    let mut lines = Vec::new();
    for attribute in attributes {
        if let Attribute::LineNumberTable { line_number_table, .. } = attribute {
            for entry in line_number_table {
                lines.push((entry.start_pc(), entry.line_number()));
            }
        }
    }
    lines
}

fn convert_annotations(
    pool: &[ConstantPool],
    annotations: &[RawAnnotation],
) -> Result<Vec<Annotation>> {
    annotations
        .iter()
        .map(|annotation| convert_annotation(pool, annotation))
        .collect()
}

fn convert_annotation(pool: &[ConstantPool], annotation: &RawAnnotation) -> Result<Annotation> {
    let descriptor = utf8(pool, annotation.type_index())?.to_string();
    let mut values = Vec::with_capacity(annotation.element_value_pairs().len());
    for pair in annotation.element_value_pairs() {
        let name = utf8(pool, pair.element_name_index())?.to_string();
        values.push((name, convert_element_value(pool, pair.value())?));
    }
    Ok(Annotation { descriptor, values })
}

/// Suppression resolution only needs strings and string arrays; every other
/// element-value shape collapses to `Other`.
fn convert_element_value(pool: &[ConstantPool], value: &ElementValue) -> Result<AnnotationValue> {
    Ok(match value {
        ElementValue::ConstValueIndex {
            tag: b's',
            const_value_index,
        } => AnnotationValue::Str(utf8(pool, *const_value_index)?.to_string()),
        ElementValue::ArrayValue { values, .. } => AnnotationValue::List(
            values
                .iter()
                .map(|value| convert_element_value(pool, value))
                .collect::<Result<_>>()?,
        ),
        _ => AnnotationValue::Other,
    })
}

/// Handle lists per bootstrap method: the bootstrap handle itself followed by
/// every handle-typed static argument.
fn bootstrap_handles(
    pool: &[ConstantPool],
    methods: &[BootstrapMethod],
) -> Result<Vec<Vec<MemberRef>>> {
    let mut handle_lists = Vec::with_capacity(methods.len());
    for method in methods {
        let mut handles = Vec::new();
        if let ConstantPool::MethodHandle { reference_index, .. } =
            entry(pool, method.bootstrap_method_ref())?
        {
            handles.push(member_ref(pool, *reference_index)?);
        }
        for &argument in method.bootstrap_arguments() {
            if let ConstantPool::MethodHandle { reference_index, .. } = entry(pool, argument)? {
                handles.push(member_ref(pool, *reference_index)?);
            }
        }
        handle_lists.push(handles);
    }
    Ok(handle_lists)
}

fn decode_instructions(
    code: &[u8],
    lines: &[(u16, u16)],
    pool: &[ConstantPool],
    bootstrap: &[Vec<MemberRef>],
) -> Result<Vec<Insn>> {
    let mut line_markers: HashMap<u32, Vec<u16>> = HashMap::new();
    for &(start_pc, line) in lines {
        line_markers.entry(start_pc as u32).or_default().push(line);
    }

    let mut instructions = Vec::new();
    let mut offset = 0usize;
    while offset < code.len() {
        if let Some(marker_lines) = line_markers.get(&(offset as u32)) {
            for &line in marker_lines {
                instructions.push(Insn {
                    opcode: None,
                    kind: InsnKind::Line(line),
                });
            }
        }

        let opcode = code[offset];
        let kind = match opcode {
            // getstatic/putstatic/getfield/putfield
            0xb2..=0xb5 => InsnKind::Field(member_ref(pool, read_u16(code, offset + 1)?)?),
            // invokevirtual/invokespecial/invokestatic/invokeinterface
            0xb6..=0xb9 => InsnKind::Call(member_ref(pool, read_u16(code, offset + 1)?)?),
            // invokedynamic
            0xba => {
                let index = read_u16(code, offset + 1)?;
                let ConstantPool::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                    ..
                } = entry(pool, index)?
                else {
                    bail!("invokedynamic operand {index} is not an InvokeDynamic constant");
                };
                let (name, descriptor) = name_and_type(pool, *name_and_type_index)?;
                let handles = bootstrap
                    .get(*bootstrap_method_attr_index as usize)
                    .cloned()
                    .unwrap_or_default();
                InsnKind::Dynamic(DynamicRef {
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                    handles,
                })
            }
            // new/anewarray/checkcast/instanceof/multianewarray
            0xbb | 0xbd | 0xc0 | 0xc1 | 0xc5 => {
                InsnKind::TypeRef(class_name(pool, read_u16(code, offset + 1)?)?.to_string())
            }
            _ => InsnKind::Other,
        };
        instructions.push(Insn {
            opcode: Some(opcode),
            kind,
        });

        offset += insn_length(code, offset)?;
    }
    Ok(instructions)
}

/// Total byte length of the instruction at `offset`, including its operands.
fn insn_length(code: &[u8], offset: usize) -> Result<usize> {
    let opcode = code[offset];
    let length = match opcode {
        0x10 | 0x12 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => 2,
        0x11 | 0x13 | 0x14 | 0x84 | 0x99..=0xa8 | 0xb2..=0xb8 | 0xbb | 0xbd | 0xc0 | 0xc1
        | 0xc6 | 0xc7 => 3,
        0xc5 => 4,
        0xb9 | 0xba | 0xc8 | 0xc9 => 5,
        // wide: 6 bytes for iinc, 4 for load/store/ret forms
        0xc4 => {
            if code.get(offset + 1) == Some(&0x84) {
                6
            } else {
                4
            }
        }
        // tableswitch
        0xaa => {
            let pad = padding(offset);
            let base = offset + 1 + pad;
            let low = read_i32(code, base + 4)? as i64;
            let high = read_i32(code, base + 8)? as i64;
            let count = high - low + 1;
            if count < 0 {
                bail!("invalid tableswitch range at offset {offset}");
            }
            1 + pad + 12 + 4 * count as usize
        }
        // lookupswitch
        0xab => {
            let pad = padding(offset);
            let base = offset + 1 + pad;
            let npairs = read_i32(code, base + 4)? as i64;
            if npairs < 0 {
                bail!("invalid lookupswitch pair count at offset {offset}");
            }
            1 + pad + 8 + 8 * npairs as usize
        }
        0x00..=0xc9 => 1,
        _ => bail!("unknown opcode 0x{opcode:02x} at offset {offset}"),
    };
    Ok(length)
}

/// Switch payloads are aligned to a 4-byte boundary from the method start.
fn padding(offset: usize) -> usize {
    (4 - ((offset + 1) % 4)) % 4
}

fn read_u16(code: &[u8], offset: usize) -> Result<u16> {
    let bytes: [u8; 2] = code
        .get(offset..offset + 2)
        .context("bytecode ends inside an instruction")?
        .try_into()?;
    Ok(u16::from_be_bytes(bytes))
}

fn read_i32(code: &[u8], offset: usize) -> Result<i32> {
    let bytes: [u8; 4] = code
        .get(offset..offset + 4)
        .context("bytecode ends inside an instruction")?
        .try_into()?;
    Ok(i32::from_be_bytes(bytes))
}

fn entry(pool: &[ConstantPool], index: u16) -> Result<&ConstantPool> {
    pool.get(index as usize)
        .with_context(|| format!("constant pool index {index} out of range"))
}

fn utf8(pool: &[ConstantPool], index: u16) -> Result<&str> {
    match entry(pool, index)? {
        ConstantPool::Utf8 { value } => Ok(value),
        _ => bail!("constant pool index {index} is not a Utf8 constant"),
    }
}

fn class_name(pool: &[ConstantPool], index: u16) -> Result<&str> {
    match entry(pool, index)? {
        ConstantPool::Class { name_index, .. } => utf8(pool, *name_index),
        _ => bail!("constant pool index {index} is not a Class constant"),
    }
}

fn name_and_type(pool: &[ConstantPool], index: u16) -> Result<(&str, &str)> {
    match entry(pool, index)? {
        ConstantPool::NameAndType {
            name_index,
            descriptor_index,
            ..
        } => Ok((utf8(pool, *name_index)?, utf8(pool, *descriptor_index)?)),
        _ => bail!("constant pool index {index} is not a NameAndType constant"),
    }
}

fn member_ref(pool: &[ConstantPool], index: u16) -> Result<MemberRef> {
    let (class_index, name_and_type_index) = match entry(pool, index)? {
        ConstantPool::Fieldref {
            class_index,
            name_and_type_index,
            ..
        }
        | ConstantPool::Methodref {
            class_index,
            name_and_type_index,
            ..
        }
        | ConstantPool::InterfaceMethodref {
            class_index,
            name_and_type_index,
            ..
        } => (*class_index, *name_and_type_index),
        _ => bail!("constant pool index {index} is not a member reference"),
    };
    let owner = class_name(pool, class_index)?.to_string();
    let (name, descriptor) = name_and_type(pool, name_and_type_index)?;
    Ok(MemberRef {
        owner,
        name: name.to_string(),
        descriptor: descriptor.to_string(),
    })
}
