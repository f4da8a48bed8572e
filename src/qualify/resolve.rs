//! Owner resolution: map a name written in a doc reference to a type.
//!
//! Resolution order mirrors what the javadoc tool would find:
//! referenced types, same-package siblings, single-type imports (including
//! `Outer.Inner` through an imported `Outer`), on-demand imports,
//! unresolved wildcard imports, the model by literal name, and finally the
//! external universe by literal name or as a `java.lang` type.

use super::universe::{TypeInfo, TypeUniverse};
use super::DocContext;
use crate::source::Import;

pub(crate) struct Resolver<'u> {
    universe: &'u dyn TypeUniverse,
}

impl<'u> Resolver<'u> {
    pub(crate) fn new(universe: &'u dyn TypeUniverse) -> Self {
        Resolver { universe }
    }

    /// Model first, then external.
    fn load(&self, qualified: &str) -> Option<TypeInfo> {
        self.universe
            .lookup_model(qualified)
            .or_else(|| self.universe.lookup_external(qualified))
    }

    /// A qualified name the parser vouched for; trusted even if the universe
    /// has never heard of it.
    fn known(&self, qualified: &str) -> TypeInfo {
        self.load(qualified)
            .unwrap_or_else(|| TypeInfo::parse(qualified))
    }

    pub(crate) fn qualify(&self, ctx: &DocContext<'_>, name: &str) -> Option<TypeInfo> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        if let Some(referenced) = ctx.owner.referenced_types.iter().find(|r| {
            r.as_str() == name || r.rsplit('.').next() == Some(name)
        }) {
            return Some(self.known(referenced));
        }

        if let Some(sibling) = self.universe.lookup_model(&ctx.unit.qualified_name(&[name])) {
            return Some(sibling);
        }

        if let Some(imported) = self.imported(ctx, name) {
            return Some(imported);
        }

        if name.starts_with("java.lang") {
            return self.load(name);
        }

        if let Some(direct) = self.universe.lookup_model(name) {
            return Some(direct);
        }

        self.load(name)
            .or_else(|| self.load(&format!("java.lang.{}", name)))
    }

    fn imported(&self, ctx: &DocContext<'_>, name: &str) -> Option<TypeInfo> {
        let imports = &ctx.unit.imports;

        let single = imports.iter().find_map(|import| match import {
            Import::Type(target) => {
                let simple = target.rsplit('.').next().unwrap_or(target);
                if name == simple {
                    Some(self.known(target))
                } else {
                    let rest = name.strip_prefix(simple)?.strip_prefix('.')?;
                    self.nested(self.known(target), rest)
                }
            }
            _ => None,
        });
        if single.is_some() {
            return single;
        }

        let on_demand = imports.iter().find_map(|import| match import {
            Import::Package(package) => self.load(&format!("{}.{}", package, name)),
            _ => None,
        });
        if on_demand.is_some() {
            return on_demand;
        }

        imports.iter().find_map(|import| match import {
            Import::Unresolved(reference) => {
                let prefix = reference.strip_suffix('*')?;
                self.load(&format!("{}{}", prefix, name))
            }
            _ => None,
        })
    }

    /// Walk `A.B` below an already resolved outer type.
    fn nested(&self, outer: TypeInfo, path: &str) -> Option<TypeInfo> {
        path.split('.').try_fold(outer, |current, part| {
            self.load(&format!("{}.{}", current.qualified(), part))
        })
    }

    /// Shortest name under which `ty` is visible from `original`.
    pub(crate) fn simplify(
        &self,
        ctx: &DocContext<'_>,
        ty: &TypeInfo,
        original: Option<&DocContext<'_>>,
    ) -> String {
        let Some(original) = original else {
            return ty.qualified();
        };
        if ty.package == "java.lang" || ty.package == ctx.unit.package {
            return ty.name.clone();
        }

        let qualified = ty.qualified();
        original
            .unit
            .imports
            .iter()
            .find_map(|import| match import {
                Import::Unresolved(reference) => {
                    let prefix = reference.strip_suffix('*').unwrap_or(reference);
                    if prefix == qualified {
                        Some(ty.simple_name().to_string())
                    } else if prefix.ends_with('.') {
                        qualified
                            .strip_prefix(prefix)
                            .map(str::to_string)
                    } else {
                        None
                    }
                }
                Import::Package(package) => {
                    (package == &ty.package).then(|| ty.name.clone())
                }
                Import::Type(target) => {
                    let simple = target.rsplit('.').next().unwrap_or(target);
                    if qualified == *target {
                        Some(simple.to_string())
                    } else {
                        qualified
                            .strip_prefix(target.as_str())
                            .filter(|rest| rest.starts_with('.'))
                            .map(|rest| format!("{}{}", simple, rest))
                    }
                }
            })
            .unwrap_or(qualified)
    }
}
