//! The set of types references may resolve to.
//!
//! Two tiers, consulted in order: types of the parsed model, then an
//! external table standing in for the compile classpath.

use crate::source::{SourceUnit, TypeDecl};
use std::collections::BTreeMap;

/// A resolvable type: package plus (dotted, for nested types) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub package: String,
    /// `Widget`, or `Widget.Part` for a nested type
    pub name: String,
}

impl TypeInfo {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeInfo {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Split a qualified or binary name by Java naming convention: leading
    /// lower-case segments form the package. `java.util.Map$Entry` and
    /// `java.util.Map.Entry` both give package `java.util`, name `Map.Entry`.
    pub fn parse(qualified: &str) -> Self {
        let normalized = qualified.replace('$', ".");
        let segments: Vec<&str> = normalized.split('.').filter(|s| !s.is_empty()).collect();
        let split = segments
            .iter()
            .position(|s| s.starts_with(|c: char| c.is_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));
        TypeInfo {
            package: segments[..split].join("."),
            name: segments[split..].join("."),
        }
    }

    pub fn qualified(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Innermost simple name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Lookup capability used by the reference qualifier.
///
/// Shared read-only between worker threads during batch runs.
pub trait TypeUniverse: Send + Sync {
    /// A type declared in the parsed source model.
    fn lookup_model(&self, qualified: &str) -> Option<TypeInfo>;

    /// A type known only from outside the model (library classes).
    fn lookup_external(&self, _qualified: &str) -> Option<TypeInfo> {
        None
    }
}

/// `java.lang` types resolvable without an import.
const JAVA_LANG: &[&str] = &[
    "AutoCloseable",
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "ClassCastException",
    "ClassLoader",
    "Cloneable",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "FunctionalInterface",
    "IllegalArgumentException",
    "IllegalStateException",
    "IndexOutOfBoundsException",
    "Integer",
    "InterruptedException",
    "Iterable",
    "Long",
    "Math",
    "NullPointerException",
    "Number",
    "Object",
    "Override",
    "Record",
    "Runnable",
    "RuntimeException",
    "SafeVarargs",
    "Short",
    "String",
    "StringBuilder",
    "SuppressWarnings",
    "System",
    "Thread",
    "Throwable",
    "UnsupportedOperationException",
    "Void",
];

/// In-memory [`TypeUniverse`] built from parsed units and a symbol list.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    model: BTreeMap<String, TypeInfo>,
    external: BTreeMap<String, TypeInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the common `java.lang` types as external symbols.
    pub fn with_java_lang(mut self) -> Self {
        for name in JAVA_LANG {
            self.add_external_type(TypeInfo::new("java.lang", *name));
        }
        self
    }

    /// Register every named type of a unit, nested types included.
    pub fn add_unit(&mut self, unit: &SourceUnit) {
        for ty in &unit.types {
            self.add_type(&unit.package, None, ty);
        }
    }

    fn add_type(&mut self, package: &str, outer: Option<&str>, ty: &TypeDecl) {
        let name = match outer {
            Some(outer) => format!("{}.{}", outer, ty.name),
            None => ty.name.clone(),
        };
        for nested in ty.named_nested_types() {
            self.add_type(package, Some(&name), nested);
        }
        let info = TypeInfo::new(package, name);
        self.model.insert(info.qualified(), info);
    }

    pub fn add_external(&mut self, qualified: &str) {
        self.add_external_type(TypeInfo::parse(qualified));
    }

    pub fn add_external_type(&mut self, info: TypeInfo) {
        self.external.insert(info.qualified(), info);
    }

    /// Register external symbols from a list with one qualified name per
    /// line; blank lines and `#` comments are skipped.
    pub fn add_external_list(&mut self, list: &str) {
        for line in list.lines() {
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                self.add_external(line);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.model.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty() && self.external.is_empty()
    }
}

impl TypeUniverse for SymbolTable {
    fn lookup_model(&self, qualified: &str) -> Option<TypeInfo> {
        self.model.get(qualified).cloned()
    }

    fn lookup_external(&self, qualified: &str) -> Option<TypeInfo> {
        self.external
            .get(qualified)
            .or_else(|| self.external.get(&qualified.replace('$', ".")))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_package_by_case() {
        let info = TypeInfo::parse("java.util.Map$Entry");
        assert_eq!(info.package, "java.util");
        assert_eq!(info.name, "Map.Entry");
        assert_eq!(info.simple_name(), "Entry");
        assert_eq!(info.qualified(), "java.util.Map.Entry");
        assert_eq!(TypeInfo::parse("Widget").qualified(), "Widget");
    }

    #[test]
    fn unit_types_register_with_nested() {
        let unit = SourceUnit {
            package: "com.example".to_string(),
            types: vec![TypeDecl {
                name: "Widget".to_string(),
                nested_types: vec![TypeDecl {
                    name: "Part".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut table = SymbolTable::new();
        table.add_unit(&unit);
        assert!(table.lookup_model("com.example.Widget").is_some());
        let part = table.lookup_model("com.example.Widget.Part").unwrap();
        assert_eq!(part.package, "com.example");
        assert_eq!(part.name, "Widget.Part");
        assert!(table.lookup_external("com.example.Widget").is_none());
    }

    #[test]
    fn external_list_skips_comments() {
        let mut table = SymbolTable::new().with_java_lang();
        table.add_external_list("# classpath\njava.util.List\n\njava.util.Map$Entry\n");
        assert!(table.lookup_external("java.lang.String").is_some());
        assert!(table.lookup_external("java.util.List").is_some());
        assert!(table.lookup_external("java.util.Map$Entry").is_some());
        assert!(table.lookup_model("java.util.List").is_none());
    }
}
