//! Reference qualifier: rewrite `@link`, `@linkplain`, `@see` and `@value`
//! references into canonical, fully qualified form.
//!
//! A reference has the shape `owner#member(desc) label`, every part
//! optional. The owner and each `desc` element are resolved to types; when
//! the canonical form differs from what was written and no label was given,
//! the written form (with `#` shown as `.`) is appended as the label so the
//! rendered text still reads the same.

pub mod resolve;
pub mod universe;

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::source::{SourceUnit, TypeDecl};
use resolve::Resolver;
pub use universe::{SymbolTable, TypeInfo, TypeUniverse};

// -- Patterns -----------------------------------------------------------------

const REFERENCE: &str = concat!(
    r"(?P<owner>[\w$.]*)",
    r"(?:#(?P<member>[\w%]+)?(?P<desc_full>\((?P<desc>[\w$., \[\]]+)?\))?)?",
    r"(?:(?P<gap>\s+)(?P<label>[^}\s][^}\n\r]*))?"
);

static RE_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"@(?P<tag>link|linkplain|see|value)(?P<space>\s+){}",
        REFERENCE
    ))
    .unwrap()
});

static RE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}", REFERENCE)).unwrap());

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Where a comment lives: its compilation unit and the type enclosing it
/// (the type itself for a type's own comment).
#[derive(Debug, Clone, Copy)]
pub struct DocContext<'a> {
    pub unit: &'a SourceUnit,
    pub owner: &'a TypeDecl,
}

impl<'a> DocContext<'a> {
    pub fn new(unit: &'a SourceUnit, owner: &'a TypeDecl) -> Self {
        DocContext { unit, owner }
    }
}

/// One matched reference, split into its parts.
struct Reference<'t> {
    owner: &'t str,
    member: Option<&'t str>,
    has_desc: bool,
    desc: Option<&'t str>,
    gap: &'t str,
    label: Option<&'t str>,
}

impl<'t> Reference<'t> {
    fn from_captures(caps: &Captures<'t>) -> Self {
        Reference {
            owner: caps.name("owner").map_or("", |m| m.as_str()),
            member: caps.name("member").map(|m| m.as_str()),
            has_desc: caps
                .name("desc_full")
                .is_some_and(|m| !m.as_str().trim().is_empty()),
            desc: caps.name("desc").map(|m| m.as_str()),
            gap: caps.name("gap").map_or(" ", |m| m.as_str()),
            label: caps.name("label").map(|m| m.as_str()),
        }
    }

    /// The reference exactly as written, without its label.
    fn literal(&self) -> String {
        let mut out = self.owner.to_string();
        if let Some(member) = self.member {
            out.push('#');
            out.push_str(member);
        }
        if self.has_desc {
            out.push('(');
            out.push_str(self.desc.unwrap_or(""));
            out.push(')');
        }
        out
    }
}

/// Rewrites references against a [`TypeUniverse`].
pub struct Qualifier<'u> {
    resolver: Resolver<'u>,
}

impl<'u> Qualifier<'u> {
    pub fn new(universe: &'u dyn TypeUniverse) -> Self {
        Qualifier {
            resolver: Resolver::new(universe),
        }
    }

    /// Rewrite every inline reference in `text`.
    ///
    /// With `original` set, resolved names are shortened to what is visible
    /// from that context instead of being fully qualified.
    pub fn expand(
        &self,
        ctx: &DocContext<'_>,
        text: &str,
        original: Option<&DocContext<'_>>,
    ) -> String {
        RE_INLINE
            .replace_all(text, |caps: &Captures| {
                let reference = Reference::from_captures(caps);
                format!(
                    "@{}{}{}",
                    &caps["tag"],
                    &caps["space"],
                    self.rewrite(ctx, &reference, original)
                )
            })
            .into_owned()
    }

    /// Rewrite the leading reference of a block tag's content. Only `@see`
    /// carries one; other tags are returned unchanged.
    pub fn process_block_tag(
        &self,
        tag: &str,
        ctx: &DocContext<'_>,
        content: &str,
        original: Option<&DocContext<'_>>,
    ) -> String {
        if tag != "see" {
            return content.to_string();
        }
        RE_BLOCK
            .replace(content, |caps: &Captures| {
                self.rewrite(ctx, &Reference::from_captures(caps), original)
            })
            .into_owned()
    }

    /// Full pass applied to block tag content before it is compared or
    /// stored: the leading `@see` reference, inline references, and
    /// per-line trimming.
    pub fn process_tag(
        &self,
        tag: &str,
        ctx: &DocContext<'_>,
        content: &str,
        original: Option<&DocContext<'_>>,
    ) -> String {
        let content = self.process_block_tag(tag, ctx, content, original);
        let content = self.expand(ctx, &content, original);
        content
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn rewrite(
        &self,
        ctx: &DocContext<'_>,
        reference: &Reference<'_>,
        original: Option<&DocContext<'_>>,
    ) -> String {
        let mut out = self.canonical(ctx, reference, original);
        if let Some(label) = reference.label {
            out.push_str(reference.gap);
            out.push_str(label);
        } else {
            let literal = reference.literal();
            if out != literal {
                out.push(' ');
                out.push_str(&literal.replace('#', "."));
            }
        }
        out
    }

    fn canonical(
        &self,
        ctx: &DocContext<'_>,
        reference: &Reference<'_>,
        original: Option<&DocContext<'_>>,
    ) -> String {
        let mut out = String::new();
        if !reference.owner.trim().is_empty() {
            out.push_str(&self.qualified_name(ctx, reference.owner, original));
        }
        if let Some(member) = reference.member {
            out.push('#');
            out.push_str(member);
        }
        if reference.has_desc {
            out.push('(');
            if let Some(desc) = reference.desc {
                out.push_str(&self.qualify_desc(ctx, desc, original));
            }
            out.push(')');
        }
        out
    }

    fn qualified_name(
        &self,
        ctx: &DocContext<'_>,
        name: &str,
        original: Option<&DocContext<'_>>,
    ) -> String {
        match self.resolver.qualify(ctx, name) {
            Some(ty) => self.resolver.simplify(ctx, &ty, original),
            None => {
                tracing::trace!(reference = name, "unresolved documentation reference");
                name.to_string()
            }
        }
    }

    /// Resolve each comma-separated parameter type, keeping array suffixes.
    fn qualify_desc(
        &self,
        ctx: &DocContext<'_>,
        desc: &str,
        original: Option<&DocContext<'_>>,
    ) -> String {
        desc.split(',')
            .map(|element| {
                let element = element.trim();
                let base = element.trim_end_matches("[]").trim_end_matches("...");
                let suffix = &element[base.len()..];
                if base.is_empty() || PRIMITIVES.contains(&base) {
                    element.to_string()
                } else {
                    format!("{}{}", self.qualified_name(ctx, base, original), suffix)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// HTML-escape text taken verbatim from existing comments.
pub fn sanitize(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
