//! Identity keys used to align declarations across independently parsed trees.
//!
//! - methods: `name(descriptor)`, constructors named `<init>`
//! - fields and nested types: simple name
//!
//! The descriptor is the JVM encoding of the erased parameter types, so
//! overloads get distinct keys and keys survive reformatting and reordering.

use crate::error::{DocPatchError, MemberKind, Result};
use crate::source::{FieldDecl, MethodDecl, Parameter, TypeDecl};
use std::collections::BTreeMap;

pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Identity key of a method or constructor.
pub fn method_key(method: &MethodDecl) -> String {
    let name = if method.constructor {
        CONSTRUCTOR_NAME
    } else {
        method.name.as_str()
    };
    format!("{}({})", name, parameters_descriptor(&method.parameters))
}

pub fn field_key(field: &FieldDecl) -> String {
    field.name.clone()
}

pub fn nested_type_key(ty: &TypeDecl) -> String {
    ty.name.clone()
}

fn parameters_descriptor(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| type_descriptor(&p.erased_type))
        .collect()
}

/// JVM descriptor of an erased binary type name.
///
/// `int` → `I`, `java.lang.String[]` → `[Ljava/lang/String;`,
/// `java.util.Map$Entry` → `Ljava/util/Map$Entry;`, `T...` → `[T` erased.
pub fn type_descriptor(erased: &str) -> String {
    let mut base = strip_generics(erased.trim());
    let mut dims = 0;
    loop {
        if let Some(stripped) = base.strip_suffix("[]") {
            base = stripped.trim_end().to_string();
            dims += 1;
        } else if let Some(stripped) = base.strip_suffix("...") {
            base = stripped.trim_end().to_string();
            dims += 1;
        } else {
            break;
        }
    }

    let element = match base.as_str() {
        "boolean" => "Z".to_string(),
        "byte" => "B".to_string(),
        "char" => "C".to_string(),
        "short" => "S".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "float" => "F".to_string(),
        "double" => "D".to_string(),
        "void" => "V".to_string(),
        other => format!("L{};", other.replace('.', "/")),
    };
    format!("{}{}", "[".repeat(dims), element)
}

/// Drop any `<...>` argument lists a parser left on an erased type.
fn strip_generics(ty: &str) -> String {
    let mut out = String::with_capacity(ty.len());
    let mut depth = 0usize;
    for c in ty.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Members of one type level, keyed by identity key.
#[derive(Debug, Default)]
pub struct MemberIndex<'a> {
    pub methods: BTreeMap<String, &'a MethodDecl>,
    pub fields: BTreeMap<String, &'a FieldDecl>,
    pub nested: BTreeMap<String, &'a TypeDecl>,
    duplicate: Option<(MemberKind, String)>,
}

impl<'a> MemberIndex<'a> {
    pub fn new(ty: &'a TypeDecl) -> Self {
        let mut index = MemberIndex::default();
        for method in &ty.methods {
            let key = method_key(method);
            if index.methods.insert(key.clone(), method).is_some() {
                index.duplicate.get_or_insert((MemberKind::Method, key));
            }
        }
        for field in &ty.fields {
            let key = field_key(field);
            if index.fields.insert(key.clone(), field).is_some() {
                index.duplicate.get_or_insert((MemberKind::Field, key));
            }
        }
        for nested in ty.named_nested_types() {
            let key = nested_type_key(nested);
            if index.nested.insert(key.clone(), nested).is_some() {
                index.duplicate.get_or_insert((MemberKind::NestedType, key));
            }
        }
        index
    }

    /// Like [`MemberIndex::new`], but fails if two members share a key.
    pub fn strict(ty: &'a TypeDecl, type_name: &str) -> Result<Self> {
        let index = Self::new(ty);
        match index.duplicate {
            Some((kind, key)) => Err(DocPatchError::DuplicateKey {
                kind,
                key,
                type_name: type_name.to_string(),
            }),
            None => Ok(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            erased_type: ty.to_string(),
        }
    }

    fn method(name: &str, params: Vec<Parameter>) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            parameters: params,
            ..Default::default()
        }
    }

    #[test]
    fn primitive_and_object_descriptors() {
        assert_eq!(type_descriptor("int"), "I");
        assert_eq!(type_descriptor("boolean"), "Z");
        assert_eq!(type_descriptor("java.lang.String"), "Ljava/lang/String;");
        assert_eq!(type_descriptor("java.util.Map$Entry"), "Ljava/util/Map$Entry;");
    }

    #[test]
    fn array_and_varargs_descriptors() {
        assert_eq!(type_descriptor("long[]"), "[J");
        assert_eq!(type_descriptor("java.lang.Object[][]"), "[[Ljava/lang/Object;");
        assert_eq!(type_descriptor("java.lang.String..."), "[Ljava/lang/String;");
        assert_eq!(type_descriptor("java.util.List<java.lang.String>"), "Ljava/util/List;");
    }

    #[test]
    fn overloads_get_distinct_keys() {
        let a = method("run", vec![param("n", "int")]);
        let b = method("run", vec![param("s", "java.lang.String")]);
        let c = method("run", vec![]);
        assert_eq!(method_key(&a), "run(I)");
        assert_eq!(method_key(&b), "run(Ljava/lang/String;)");
        assert_eq!(method_key(&c), "run()");
    }

    #[test]
    fn parameter_names_do_not_affect_keys() {
        let a = method("put", vec![param("key", "int"), param("value", "long[]")]);
        let b = method("put", vec![param("k", "int"), param("v", "long[]")]);
        assert_eq!(method_key(&a), method_key(&b));
        assert_eq!(method_key(&a), "put(I[J)");
    }

    #[test]
    fn constructors_use_init() {
        let ctor = MethodDecl {
            name: "Widget".to_string(),
            constructor: true,
            parameters: vec![param("name", "java.lang.String")],
            ..Default::default()
        };
        assert_eq!(method_key(&ctor), "<init>(Ljava/lang/String;)");
    }

    #[test]
    fn strict_index_reports_duplicates() {
        let ty = TypeDecl {
            name: "Widget".to_string(),
            methods: vec![
                method("run", vec![param("a", "int")]),
                method("run", vec![param("b", "int")]),
            ],
            ..Default::default()
        };
        let err = MemberIndex::strict(&ty, "com.example.Widget").unwrap_err();
        assert!(err.to_string().contains("duplicate method key `run(I)`"));
        assert_eq!(MemberIndex::new(&ty).methods.len(), 1);
    }
}
