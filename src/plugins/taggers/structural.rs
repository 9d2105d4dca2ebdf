//! Structural taggers
//!
//! These inspect the AST rather than the minified text. Two of them are
//! dependency-aware: they consult the tags assigned to the modules this
//! one depends on, and so may only settle on a later sweep of the tagger
//! stage over the graph.

use oxc_ast::ast::{
    AssignmentOperator, AssignmentTarget, Expression, Program, Statement,
};

use crate::module::{ModuleMeta, ParamRole};
use crate::plugins::matchers::require_call_expr;
use crate::plugins::{NodeKind, PluginMeta, Tagger};
use crate::router::context::TagContext;

/// Tags modules that carry the Babel ESM marker:
/// `Object.defineProperty(exports, "__esModule", { value: true })`.
pub struct EsModuleFlag;

impl PluginMeta for EsModuleFlag {
    fn name(&self) -> &'static str {
        "esmodule-flag"
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::CallExpression]
    }
}

impl Tagger for EsModuleFlag {
    fn tag_expression<'a>(&self, expression: &Expression<'a>, cx: &mut TagContext<'_>) {
        if is_es_module_define(expression, cx.module) {
            cx.tag("__esModule");
        }
    }
}

/// Whether `expression` is the `__esModule` define for this factory's
/// `exports` binding. Shared with the export decompiler, which drops the
/// statement.
pub fn is_es_module_define(expression: &Expression<'_>, meta: &ModuleMeta) -> bool {
    let Expression::CallExpression(call) = expression else {
        return false;
    };
    let Expression::StaticMemberExpression(callee) = &call.callee else {
        return false;
    };
    let Expression::Identifier(object) = &callee.object else {
        return false;
    };
    if object.name != "Object" || callee.property.name != "defineProperty" {
        return false;
    }
    if call.arguments.len() != 3 {
        return false;
    }
    let Some(Expression::Identifier(target)) = call.arguments[0].as_expression() else {
        return false;
    };
    if !meta.bindings.is(ParamRole::Exports, target.name.as_str()) {
        return false;
    }
    matches!(
        call.arguments[1].as_expression(),
        Some(Expression::StringLiteral(key)) if key.value == "__esModule"
    )
}

/// A module whose whole body is `module.exports = require(d[i])` inherits
/// the NPM identity of that dependency.
pub struct PassthroughWrapper;

impl PluginMeta for PassthroughWrapper {
    fn name(&self) -> &'static str {
        "passthrough-wrapper"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Tagger for PassthroughWrapper {
    fn tag_module<'a>(&self, program: &Program<'a>, cx: &mut TagContext<'_>) {
        if cx.module.is_npm_module {
            return;
        }
        let [Statement::ExpressionStatement(statement)] = program.body.as_slice() else {
            return;
        };
        let Expression::AssignmentExpression(assignment) = &statement.expression else {
            return;
        };
        if assignment.operator != AssignmentOperator::Assign {
            return;
        }
        let AssignmentTarget::StaticMemberExpression(target) = &assignment.left else {
            return;
        };
        let Expression::Identifier(object) = &target.object else {
            return;
        };
        if !cx.module.bindings.is(ParamRole::Module, object.name.as_str())
            || target.property.name != "exports"
        {
            return;
        }
        let Some((_, dep)) = require_call_expr(assignment.right.without_parentheses(), cx.module)
        else {
            return;
        };
        let Some(id) = dep.resolve(cx.module) else {
            return;
        };
        let Some(info) = cx.graph.info(id) else {
            return;
        };
        if info.is_npm_module {
            if let Some(package) = info.npm_module_name.clone() {
                cx.tag_as_npm_module(package);
            }
        }
    }
}

/// Dependency-aware React component detection: the module calls
/// `createElement` and one of its dependencies is tagged as `react`.
pub struct ReactComponent;

impl PluginMeta for ReactComponent {
    fn name(&self) -> &'static str {
        "react-component"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Tagger for ReactComponent {
    fn tag_module<'a>(&self, _program: &Program<'a>, cx: &mut TagContext<'_>) {
        if cx.module.is_npm_module || cx.module.has_tag("react-component") {
            return;
        }
        if !cx.module.original_code.contains(".createElement(") {
            return;
        }
        let react_slot = (0..cx.module.dependencies.len()).find(|&slot| {
            cx.dependency_info(slot)
                .is_some_and(|info| info.npm_module_name.as_deref() == Some("react"))
        });
        if let Some(slot) = react_slot {
            cx.tag_with_params("react-component", vec![slot.to_string()]);
        }
    }
}
