//! Declaration trees handed over by the external Java parser.
//!
//! One [`SourceUnit`] per compilation unit, serialized as JSON by the parser
//! and deserialized here. The engine never looks at source text; it only
//! needs names, erased parameter types, comments and the import table.

use crate::error::{DocPatchError, Result};
use serde::{Deserialize, Serialize};

/// A parsed compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnit {
    /// Package name, empty for the default package
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// One import statement of a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Import {
    /// `import com.example.Foo;`
    Type(String),
    /// `import com.example.*;`
    Package(String),
    /// An import the parser could not bind, kept as written (may end in `*`)
    Unresolved(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// A declared class, interface, enum, record or annotation type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Record components, in declaration order
    #[serde(default)]
    pub record_components: Vec<Parameter>,
    #[serde(default)]
    pub javadoc: Option<Javadoc>,
    /// Methods and constructors
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub nested_types: Vec<TypeDecl>,
    /// Qualified names of every type referenced inside this declaration
    #[serde(default)]
    pub referenced_types: Vec<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub local: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub constructor: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub javadoc: Option<Javadoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Erased binary type name: `int`, `java.lang.String[]`, `java.util.Map$Entry`
    #[serde(rename = "type")]
    pub erased_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(default)]
    pub javadoc: Option<Javadoc>,
}

/// A documentation comment as split by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Javadoc {
    /// First sentence / paragraph
    #[serde(default)]
    pub summary: String,
    /// Remaining description; equal to `summary` (or empty) for one-paragraph comments
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<JavadocTag>,
}

/// A block tag such as `@param x the x` or `@return the value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JavadocTag {
    pub name: String,
    /// Named target for tags that take one (`param`, `throws`, ...)
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl SourceUnit {
    /// The single top-level type of this unit.
    pub fn single_type(&self, unit: &str) -> Result<&TypeDecl> {
        match self.types.as_slice() {
            [only] => Ok(only),
            other => Err(DocPatchError::MultipleTypesInUnit {
                unit: unit.to_string(),
                count: other.len(),
            }),
        }
    }

    /// Qualified name of a (possibly nested) type given its simple-name path.
    pub fn qualified_name(&self, path: &[&str]) -> String {
        let relative = path.join(".");
        if self.package.is_empty() {
            relative
        } else {
            format!("{}.{}", self.package, relative)
        }
    }
}

impl TypeDecl {
    /// Nested types that can carry documentation: named and not local.
    pub fn named_nested_types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.nested_types
            .iter()
            .filter(|t| !t.anonymous && !t.local)
    }

    /// Names documented by `@param` on the type itself (record components).
    pub fn parameter_names(&self) -> Option<Vec<String>> {
        if self.kind == TypeKind::Record {
            Some(self.record_components.iter().map(|p| p.name.clone()).collect())
        } else {
            None
        }
    }
}

impl MethodDecl {
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

impl Javadoc {
    /// A one-paragraph comment with no tags.
    pub fn new(text: impl Into<String>) -> Self {
        Javadoc {
            summary: text.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, name: &str, param: Option<&str>, content: &str) -> Self {
        self.tags.push(JavadocTag {
            name: name.to_string(),
            param: param.map(str::to_string),
            content: content.to_string(),
        });
        self
    }

    /// Logical body: summary, plus the description on a new line when it differs.
    pub fn body(&self) -> String {
        if self.description.is_empty() || self.description == self.summary {
            self.summary.clone()
        } else {
            format!("{}\n{}", self.summary, self.description)
        }
    }
}

impl JavadocTag {
    /// Tag content with its parameter token reattached (`"x the x"`).
    pub fn content_with_param(&self, content: &str) -> String {
        match &self.param {
            Some(param) => format!("{} {}", param, content),
            None => content.to_string(),
        }
    }
}
