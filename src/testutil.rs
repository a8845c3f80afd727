//! Byte-level class-file assembly for decoder and orchestrator tests.

/// Builds a minimal but well-formed class file: one class, optional
/// runtime-visible annotations, and methods whose `Code` attribute carries
/// caller-supplied bytecode and line-number tables.
pub(crate) struct ClassFileBuilder {
    pool: Vec<Vec<u8>>,
    this_class: u16,
    super_class: u16,
    class_annotations: Vec<Vec<u8>>,
    methods: Vec<BuiltMethod>,
}

struct BuiltMethod {
    name: u16,
    descriptor: u16,
    code: Vec<u8>,
    lines: Vec<(u16, u16)>,
    annotations: Vec<Vec<u8>>,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            this_class: 0,
            super_class: 0,
            class_annotations: Vec::new(),
            methods: Vec::new(),
        };
        builder.this_class = builder.class_ref(class_name);
        builder.super_class = builder.class_ref("java/lang/Object");
        builder
    }

    pub(crate) fn utf8(&mut self, text: &str) -> u16 {
        let bytes = text.as_bytes();
        let mut entry = vec![1];
        entry.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        entry.extend_from_slice(bytes);
        self.push(entry)
    }

    pub(crate) fn class_ref(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        let mut entry = vec![7];
        entry.extend_from_slice(&name.to_be_bytes());
        self.push(entry)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut entry = vec![12];
        entry.extend_from_slice(&name.to_be_bytes());
        entry.extend_from_slice(&descriptor.to_be_bytes());
        self.push(entry)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class_ref(owner);
        let name_and_type = self.name_and_type(name, descriptor);
        let mut entry = vec![tag];
        entry.extend_from_slice(&class.to_be_bytes());
        entry.extend_from_slice(&name_and_type.to_be_bytes());
        self.push(entry)
    }

    pub(crate) fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, owner, name, descriptor)
    }

    pub(crate) fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, owner, name, descriptor)
    }

    pub(crate) fn invoke_dynamic_ref(
        &mut self,
        bootstrap_index: u16,
        name: &str,
        descriptor: &str,
    ) -> u16 {
        let name_and_type = self.name_and_type(name, descriptor);
        let mut entry = vec![18];
        entry.extend_from_slice(&bootstrap_index.to_be_bytes());
        entry.extend_from_slice(&name_and_type.to_be_bytes());
        self.push(entry)
    }

    pub(crate) fn method(&mut self, name: &str, descriptor: &str, code: Vec<u8>, lines: Vec<(u16, u16)>) {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.methods.push(BuiltMethod {
            name,
            descriptor,
            code,
            lines,
            annotations: Vec::new(),
        });
    }

    /// Annotate the class with `marker(value = {groups})`.
    pub(crate) fn annotate_class(&mut self, marker: &str, groups: &[&str]) {
        let annotation = self.annotation(marker, Some(groups));
        self.class_annotations.push(annotation);
    }

    /// Annotate the class with a bare `marker` carrying no arguments.
    pub(crate) fn annotate_class_bare(&mut self, marker: &str) {
        let annotation = self.annotation(marker, None);
        self.class_annotations.push(annotation);
    }

    pub(crate) fn annotate_last_method(&mut self, marker: &str, groups: &[&str]) {
        let annotation = self.annotation(marker, Some(groups));
        if let Some(method) = self.methods.last_mut() {
            method.annotations.push(annotation);
        }
    }

    pub(crate) fn annotate_last_method_bare(&mut self, marker: &str) {
        let annotation = self.annotation(marker, None);
        if let Some(method) = self.methods.last_mut() {
            method.annotations.push(annotation);
        }
    }

    fn annotation(&mut self, descriptor: &str, groups: Option<&[&str]>) -> Vec<u8> {
        let type_index = self.utf8(descriptor);
        let mut out = Vec::new();
        out.extend_from_slice(&type_index.to_be_bytes());
        match groups {
            None => out.extend_from_slice(&0u16.to_be_bytes()),
            Some(groups) => {
                let element_name = self.utf8("value");
                out.extend_from_slice(&1u16.to_be_bytes());
                out.extend_from_slice(&element_name.to_be_bytes());
                out.push(b'[');
                out.extend_from_slice(&(groups.len() as u16).to_be_bytes());
                for group in groups {
                    let value = self.utf8(group);
                    out.push(b's');
                    out.extend_from_slice(&value.to_be_bytes());
                }
            }
        }
        out
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        let code_name = self.utf8("Code");
        let line_table_name = self.utf8("LineNumberTable");
        let annotations_name = self.utf8("RuntimeVisibleAnnotations");

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor
        out.extend_from_slice(&52u16.to_be_bytes()); // major: Java 8

        out.extend_from_slice(&((self.pool.len() + 1) as u16).to_be_bytes());
        for entry in &self.pool {
            out.extend_from_slice(entry);
        }

        out.extend_from_slice(&0x0021u16.to_be_bytes()); // public super
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&0u16.to_be_bytes()); // fields

        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            out.extend_from_slice(&0x0001u16.to_be_bytes()); // public
            out.extend_from_slice(&method.name.to_be_bytes());
            out.extend_from_slice(&method.descriptor.to_be_bytes());

            let attribute_count = 1 + u16::from(!method.annotations.is_empty());
            out.extend_from_slice(&attribute_count.to_be_bytes());

            let mut code_body = Vec::new();
            code_body.extend_from_slice(&8u16.to_be_bytes()); // max_stack
            code_body.extend_from_slice(&8u16.to_be_bytes()); // max_locals
            code_body.extend_from_slice(&(method.code.len() as u32).to_be_bytes());
            code_body.extend_from_slice(&method.code);
            code_body.extend_from_slice(&0u16.to_be_bytes()); // exception table
            if method.lines.is_empty() {
                code_body.extend_from_slice(&0u16.to_be_bytes());
            } else {
                code_body.extend_from_slice(&1u16.to_be_bytes());
                code_body.extend_from_slice(&line_table_name.to_be_bytes());
                let length = 2 + 4 * method.lines.len() as u32;
                code_body.extend_from_slice(&length.to_be_bytes());
                code_body.extend_from_slice(&(method.lines.len() as u16).to_be_bytes());
                for &(start_pc, line) in &method.lines {
                    code_body.extend_from_slice(&start_pc.to_be_bytes());
                    code_body.extend_from_slice(&line.to_be_bytes());
                }
            }
            out.extend_from_slice(&code_name.to_be_bytes());
            out.extend_from_slice(&(code_body.len() as u32).to_be_bytes());
            out.extend_from_slice(&code_body);

            if !method.annotations.is_empty() {
                push_annotations(&mut out, annotations_name, &method.annotations);
            }
        }

        let class_attribute_count = u16::from(!self.class_annotations.is_empty());
        out.extend_from_slice(&class_attribute_count.to_be_bytes());
        if !self.class_annotations.is_empty() {
            push_annotations(&mut out, annotations_name, &self.class_annotations);
        }

        out
    }

    fn push(&mut self, entry: Vec<u8>) -> u16 {
        self.pool.push(entry);
        self.pool.len() as u16
    }
}

fn push_annotations(out: &mut Vec<u8>, name_index: u16, annotations: &[Vec<u8>]) {
    let mut body = Vec::new();
    body.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for annotation in annotations {
        body.extend_from_slice(annotation);
    }
    out.extend_from_slice(&name_index.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
}
