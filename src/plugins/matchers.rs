//! Shared recognizers for the Metro calling convention
//!
//! All factory-parameter names are minified, so matching goes through the
//! module's positional bindings. Recognition failures return `None`; the
//! caller leaves the subtree untouched.

use oxc_ast::ast::{CallExpression, Expression};

use crate::module::graph::GraphView;
use crate::module::{ModuleId, ModuleMeta, ParamRole};

/// A reference to another module as it appears inside a factory body:
/// either a positional `dependencyMap[i]` lookup or a direct numeric id
/// (older unbundled output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepRef {
    Slot(usize),
    Direct(ModuleId),
}

impl DepRef {
    /// The module id this reference points at, if the slot is populated.
    pub fn resolve(self, meta: &ModuleMeta) -> Option<ModuleId> {
        match self {
            DepRef::Slot(slot) => meta.dependency_at(slot),
            DepRef::Direct(id) => Some(id),
        }
    }
}

/// Which of the three module-loading parameters a call goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireKind {
    Require,
    ImportDefault,
    ImportAll,
}

/// Match `dependencyMap[i]` or a bare numeric module id.
pub fn dependency_ref(expression: &Expression<'_>, meta: &ModuleMeta) -> Option<DepRef> {
    match expression {
        Expression::ComputedMemberExpression(member) => {
            let Expression::Identifier(object) = &member.object else {
                return None;
            };
            if !meta.bindings.is(ParamRole::DependencyMap, object.name.as_str()) {
                return None;
            }
            let Expression::NumericLiteral(index) = &member.expression else {
                return None;
            };
            if index.value >= 0.0 && index.value.fract() == 0.0 {
                Some(DepRef::Slot(index.value as usize))
            } else {
                None
            }
        }
        Expression::NumericLiteral(id)
            if id.value >= 0.0 && id.value.fract() == 0.0 && id.value <= f64::from(u32::MAX) =>
        {
            Some(DepRef::Direct(id.value as ModuleId))
        }
        _ => None,
    }
}

/// Match `require(dependencyMap[i])`, `importDefault(...)` or
/// `importAll(...)` through the factory's positional bindings.
pub fn require_call(call: &CallExpression<'_>, meta: &ModuleMeta) -> Option<(RequireKind, DepRef)> {
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    let kind = match meta.bindings.role_of(callee.name.as_str())? {
        ParamRole::Require => RequireKind::Require,
        ParamRole::ImportDefault => RequireKind::ImportDefault,
        ParamRole::ImportAll => RequireKind::ImportAll,
        _ => return None,
    };
    if call.arguments.len() != 1 {
        return None;
    }
    let dep = dependency_ref(call.arguments[0].as_expression()?, meta)?;
    Some((kind, dep))
}

/// `require_call` on an arbitrary expression.
pub fn require_call_expr(
    expression: &Expression<'_>,
    meta: &ModuleMeta,
) -> Option<(RequireKind, DepRef)> {
    match expression {
        Expression::CallExpression(call) => require_call(call, meta),
        _ => None,
    }
}

/// Resolve a callee to the NPM package it loads, when that package is one
/// of the recognized helpers. Handles both a local binding created by an
/// earlier import rewrite and a direct `require(dependencyMap[i])` callee.
pub fn helper_package(
    callee: &Expression<'_>,
    meta: &ModuleMeta,
    graph: &GraphView,
) -> Option<String> {
    if let Expression::Identifier(ident) = callee {
        if let Some(package) = meta.helper_bindings.get(ident.name.as_str()) {
            return Some(package.clone());
        }
    }
    let (_, dep) = require_call_expr(callee.without_parentheses(), meta)?;
    let id = dep.resolve(meta)?;
    let info = graph.info(id)?;
    if info.is_npm_module {
        info.npm_module_name.clone()
    } else {
        None
    }
}

/// Canonical local name for a Babel runtime helper:
/// `@babel/runtime/helpers/toConsumableArray` becomes `_toConsumableArray`.
pub fn babel_helper_local(package: &str) -> Option<String> {
    let helper = package.strip_prefix("@babel/runtime/helpers/")?;
    Some(format!("_{helper}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::compiler::ModuleAst;
    use crate::module::FactoryBindings;
    use oxc_ast::ast::Statement;
    use oxc_span::SourceType;
    use smallvec::smallvec;

    fn meta() -> ModuleMeta {
        ModuleMeta::new(
            0,
            None,
            smallvec![Some(10), None, Some(12)],
            String::new(),
            0,
            FactoryBindings::from_params([
                "g".into(),
                "r".into(),
                "i".into(),
                "a".into(),
                "m".into(),
                "e".into(),
                "d".into(),
            ]),
        )
    }

    fn with_first_expression<R>(source: &str, func: impl FnOnce(&Expression<'_>) -> R) -> R {
        let ast = ModuleAst::parse(source.to_string(), SourceType::cjs()).unwrap();
        ast.with_program(|program| match &program.body[0] {
            Statement::ExpressionStatement(stmt) => func(&stmt.expression),
            other => panic!("expected expression statement, got {other:?}"),
        })
    }

    #[test]
    fn matches_slot_and_direct_refs() {
        let meta = meta();
        with_first_expression("r(d[0]);", |expr| {
            assert_eq!(
                require_call_expr(expr, &meta),
                Some((RequireKind::Require, DepRef::Slot(0)))
            );
        });
        with_first_expression("i(d[2]);", |expr| {
            assert_eq!(
                require_call_expr(expr, &meta),
                Some((RequireKind::ImportDefault, DepRef::Slot(2)))
            );
        });
        with_first_expression("a(42);", |expr| {
            assert_eq!(
                require_call_expr(expr, &meta),
                Some((RequireKind::ImportAll, DepRef::Direct(42)))
            );
        });
    }

    #[test]
    fn rejects_unbound_names_and_bad_shapes() {
        let meta = meta();
        for source in ["other(d[0]);", "r(x[0]);", "r(d[0], extra);", "r(d.length);"] {
            with_first_expression(source, |expr| {
                assert_eq!(require_call_expr(expr, &meta), None, "{source}");
            });
        }
    }

    #[test]
    fn slot_resolution_honors_holes() {
        let meta = meta();
        assert_eq!(DepRef::Slot(0).resolve(&meta), Some(10));
        assert_eq!(DepRef::Slot(1).resolve(&meta), None);
        assert_eq!(DepRef::Slot(9).resolve(&meta), None);
        assert_eq!(DepRef::Direct(7).resolve(&meta), Some(7));
    }

    #[test]
    fn helper_names_derive_from_the_package_path() {
        assert_eq!(
            babel_helper_local("@babel/runtime/helpers/toConsumableArray").as_deref(),
            Some("_toConsumableArray")
        );
        assert_eq!(babel_helper_local("lodash"), None);
    }
}
