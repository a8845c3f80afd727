#![allow(dead_code)]

/// Decoded, read-only representation of a JVM class consumed by the scan
/// engine. Produced by the `classfile` decoder.
#[derive(Clone, Debug)]
pub(crate) struct Class {
    pub(crate) name: String,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) methods: Vec<Method>,
}

/// A method with its ordered instruction sequence.
#[derive(Clone, Debug)]
pub(crate) struct Method {
    pub(crate) name: String,
    pub(crate) descriptor: String,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) instructions: Vec<Insn>,
}

impl Method {
    /// Composite identifier used as the per-class report key, e.g. `run()V`.
    pub(crate) fn identifier(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }
}

/// One entry of a method's instruction sequence. Line-number markers are
/// kept in-line as pseudo-instructions with no opcode, mirroring how the
/// `Code` attribute interleaves them with real instructions.
#[derive(Clone, Debug)]
pub(crate) struct Insn {
    pub(crate) opcode: Option<u8>,
    pub(crate) kind: InsnKind,
}

#[derive(Clone, Debug)]
pub(crate) enum InsnKind {
    /// getstatic/putstatic/getfield/putfield.
    Field(MemberRef),
    /// invokevirtual/invokespecial/invokestatic/invokeinterface.
    Call(MemberRef),
    /// invokedynamic call site with its bootstrap method handles.
    Dynamic(DynamicRef),
    /// new/anewarray/checkcast/instanceof/multianewarray operand.
    TypeRef(String),
    /// LineNumberTable marker preceding the instruction at its offset.
    Line(u16),
    Other,
}

/// Symbolic reference to a field or method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MemberRef {
    pub(crate) owner: String,
    pub(crate) name: String,
    pub(crate) descriptor: String,
}

/// invokedynamic call-site name/descriptor plus every method handle it
/// references through its bootstrap method entry.
#[derive(Clone, Debug)]
pub(crate) struct DynamicRef {
    pub(crate) name: String,
    pub(crate) descriptor: String,
    pub(crate) handles: Vec<MemberRef>,
}

/// A runtime-visible annotation attached to a class or method.
#[derive(Clone, Debug)]
pub(crate) struct Annotation {
    pub(crate) descriptor: String,
    pub(crate) values: Vec<(String, AnnotationValue)>,
}

/// Annotation element values, decoded only as deeply as suppression
/// resolution needs.
#[derive(Clone, Debug)]
pub(crate) enum AnnotationValue {
    Str(String),
    List(Vec<AnnotationValue>),
    Other,
}
