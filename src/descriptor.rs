use jdescriptor::{MethodDescriptor, TypeDescriptor};

/// Collect every class name referenced by a field or method descriptor,
/// looking through array dimensions and, for method descriptors, every
/// argument type plus the return type. Unparseable descriptors reference
/// nothing.
pub(crate) fn referenced_classes(descriptor: &str) -> Vec<String> {
    if descriptor.starts_with('(') {
        let Ok(method) = descriptor.parse::<MethodDescriptor>() else {
            return Vec::new();
        };
        let mut classes: Vec<String> = method
            .parameter_types()
            .iter()
            .filter_map(object_class)
            .map(str::to_string)
            .collect();
        if let Some(class) = object_class(method.return_type()) {
            classes.push(class.to_string());
        }
        classes
    } else {
        match descriptor.parse::<TypeDescriptor>() {
            Ok(parsed) => object_class(&parsed).map(str::to_string).into_iter().collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Class name referenced by a type-instruction operand. The operand is
/// normally a plain internal name, but anewarray/multianewarray may carry an
/// array descriptor whose element type is what matters.
pub(crate) fn element_class(operand: &str) -> Option<String> {
    if !operand.starts_with('[') {
        return Some(operand.to_string());
    }
    match operand.parse::<TypeDescriptor>() {
        Ok(parsed) => object_class(&parsed).map(str::to_string),
        Err(_) => None,
    }
}

fn object_class(descriptor: &TypeDescriptor) -> Option<&str> {
    match descriptor {
        TypeDescriptor::Object(name) => Some(name.as_str()),
        TypeDescriptor::Array(element, _) => object_class(element),
        _ => None,
    }
}
