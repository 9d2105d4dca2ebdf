//! CommonJS exports to ESM export declarations

use oxc_ast::ast::{
    AssignmentExpression, AssignmentOperator, AssignmentTarget, Expression, Statement,
};

use crate::module::{ModuleMeta, ParamRole};
use crate::plugins::snippet::AstSnippet;
use crate::plugins::taggers::structural::is_es_module_define;
use crate::plugins::{NodeKind, PluginMeta, Rewriter};
use crate::router::context::{RewriteContext, StmtSite};

/// `module.exports = E` becomes `export default E`;
/// `exports.X = E` becomes `export { E as X }` when `E` is a binding and
/// `export const X = E` otherwise; the `__esModule` define is dropped.
pub struct ExportsToEsm;

impl PluginMeta for ExportsToEsm {
    fn name(&self) -> &'static str {
        "exports-to-esm"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::ExpressionStatement]
    }
}

enum ExportTarget {
    Default,
    Named(String),
}

/// Classify an assignment target as one of the factory's export surfaces.
fn export_target(target: &AssignmentTarget<'_>, meta: &ModuleMeta) -> Option<ExportTarget> {
    let AssignmentTarget::StaticMemberExpression(member) = target else {
        return None;
    };
    match &member.object {
        Expression::Identifier(object) => {
            if meta.bindings.is(ParamRole::Module, object.name.as_str())
                && member.property.name == "exports"
            {
                return Some(ExportTarget::Default);
            }
            if meta.bindings.is(ParamRole::Exports, object.name.as_str()) {
                return Some(if member.property.name == "default" {
                    ExportTarget::Default
                } else {
                    ExportTarget::Named(member.property.name.to_string())
                });
            }
            None
        }
        // `module.exports.X = E`
        Expression::StaticMemberExpression(inner) => {
            let Expression::Identifier(object) = &inner.object else {
                return None;
            };
            if !meta.bindings.is(ParamRole::Module, object.name.as_str())
                || inner.property.name != "exports"
            {
                return None;
            }
            Some(if member.property.name == "default" {
                ExportTarget::Default
            } else {
                ExportTarget::Named(member.property.name.to_string())
            })
        }
        _ => None,
    }
}

fn matched_assignment<'s, 'a>(
    statement: &'s Statement<'a>,
    meta: &ModuleMeta,
) -> Option<(&'s AssignmentExpression<'a>, ExportTarget)> {
    let Statement::ExpressionStatement(statement) = statement else {
        return None;
    };
    let Expression::AssignmentExpression(assignment) = &statement.expression else {
        return None;
    };
    if assignment.operator != AssignmentOperator::Assign {
        return None;
    }
    let target = export_target(&assignment.left, meta)?;
    Some((assignment, target))
}

impl Rewriter for ExportsToEsm {
    fn rewrite_statement<'a>(&self, site: &mut StmtSite<'_, 'a>, cx: &mut RewriteContext<'a, '_>) {
        // Export syntax is only legal at the top level.
        if !site.is_top_level() {
            return;
        }
        let snippet = AstSnippet::new(cx.ast);

        if let Statement::ExpressionStatement(statement) = site.stmt() {
            if is_es_module_define(&statement.expression, cx.module) {
                site.remove();
                return;
            }
        }

        let Some((_, target)) = matched_assignment(site.stmt(), cx.module) else {
            return;
        };

        let Statement::ExpressionStatement(statement) = site.stmt_mut() else {
            unreachable!("statement kind checked above");
        };
        let Expression::AssignmentExpression(assignment) = &mut statement.expression else {
            unreachable!("expression kind checked above");
        };
        let value = snippet.take_expression(&mut assignment.right);

        match target {
            ExportTarget::Default => {
                site.replace(vec![snippet.export_default_stmt(value)]);
            }
            ExportTarget::Named(exported) => match &value {
                Expression::Identifier(local) => {
                    site.replace(vec![
                        snippet.export_specifier_stmt(local.name.as_str(), &exported)
                    ]);
                }
                _ => {
                    site.replace(vec![snippet.export_const_stmt(&exported, value)]);
                }
            },
        }
    }
}
