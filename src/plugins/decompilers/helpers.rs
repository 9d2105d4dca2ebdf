//! Babel helper un-inlining and array-spread recovery

use oxc_ast::ast::{ArrayExpressionElement, Elision, Expression};
use oxc_span::SPAN;

use crate::module::PendingImport;
use crate::plugins::matchers::{babel_helper_local, helper_package};
use crate::plugins::snippet::AstSnippet;
use crate::plugins::{NodeKind, PluginMeta, Rewriter};
use crate::router::context::RewriteContext;

/// Rewrites call sites that reach a module tagged as a Babel runtime
/// helper, restoring the helper's canonical name and importing it.
pub struct HelperCallSites;

impl PluginMeta for HelperCallSites {
    fn name(&self) -> &'static str {
        "helper-call-sites"
    }

    fn priority(&self) -> i32 {
        15
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::CallExpression]
    }
}

impl Rewriter for HelperCallSites {
    fn rewrite_expression<'a>(
        &self,
        expression: &mut Expression<'a>,
        cx: &mut RewriteContext<'a, '_>,
    ) {
        let snippet = AstSnippet::new(cx.ast);
        let Expression::CallExpression(call) = expression else {
            return;
        };
        let Some(package) = helper_package(call.callee.without_parentheses(), cx.module, cx.graph)
        else {
            return;
        };
        let Some(canonical) = babel_helper_local(&package) else {
            return;
        };
        if matches!(&call.callee, Expression::Identifier(callee) if callee.name == canonical) {
            return;
        }
        call.callee = snippet.id_ref_expr(&canonical);
        cx.queue_import(PendingImport::Default {
            local: canonical.clone(),
            source: package.clone(),
        });
        cx.module.helper_bindings.insert(canonical, package);
        cx.mark_changed();
    }
}

/// What to do with one `concat` argument.
enum SpreadPlan {
    Spread,
    Inline,
}

/// `[].concat(toConsumableArray(x), [y])` becomes `[...x, y]`. The rewrite
/// only fires when every argument is either a spread-helper call or an
/// array literal; anything else leaves the call untouched.
pub struct SpreadRecovery;

impl PluginMeta for SpreadRecovery {
    fn name(&self) -> &'static str {
        "spread-recovery"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::CallExpression]
    }
}

impl Rewriter for SpreadRecovery {
    fn rewrite_expression<'a>(
        &self,
        expression: &mut Expression<'a>,
        cx: &mut RewriteContext<'a, '_>,
    ) {
        let Expression::CallExpression(call) = expression else {
            return;
        };
        {
            let Expression::StaticMemberExpression(callee) = &call.callee else {
                return;
            };
            if callee.property.name != "concat" {
                return;
            }
            let Expression::ArrayExpression(receiver) = callee.object.without_parentheses() else {
                return;
            };
            if !receiver.elements.is_empty() || call.arguments.is_empty() {
                return;
            }
        }

        let mut plan = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            let Some(expr) = argument.as_expression() else {
                return;
            };
            match expr.without_parentheses() {
                Expression::CallExpression(inner)
                    if inner.arguments.len() == 1
                        && inner.arguments[0].as_expression().is_some()
                        && is_spread_helper(&inner.callee, cx) =>
                {
                    plan.push(SpreadPlan::Spread);
                }
                Expression::ArrayExpression(array)
                    if array
                        .elements
                        .iter()
                        .all(|e| !matches!(e, ArrayExpressionElement::SpreadElement(_))) =>
                {
                    plan.push(SpreadPlan::Inline);
                }
                _ => return,
            }
        }

        let snippet = AstSnippet::new(cx.ast);
        let mut elements = cx.ast.vec();
        for (argument, action) in call.arguments.iter_mut().zip(plan) {
            let Some(expr) = argument.as_expression_mut() else {
                unreachable!("argument shapes verified above");
            };
            match (action, expr) {
                (SpreadPlan::Spread, Expression::CallExpression(inner)) => {
                    let spread_arg = inner.arguments[0]
                        .as_expression_mut()
                        .expect("argument shapes verified above");
                    elements.push(ArrayExpressionElement::SpreadElement(
                        cx.ast.alloc_spread_element(SPAN, snippet.take_expression(spread_arg)),
                    ));
                }
                (SpreadPlan::Inline, Expression::ArrayExpression(array)) => {
                    for element in array.elements.iter_mut() {
                        let taken = std::mem::replace(
                            element,
                            ArrayExpressionElement::Elision(Elision { span: SPAN }),
                        );
                        elements.push(taken);
                    }
                }
                _ => unreachable!("argument shapes verified above"),
            }
        }
        *expression = cx.ast.expression_array(SPAN, elements);
        cx.mark_changed();
    }
}

/// Whether `callee` resolves to the `toConsumableArray` helper, through a
/// binding, an import, or a direct positional require.
fn is_spread_helper(callee: &Expression<'_>, cx: &RewriteContext<'_, '_>) -> bool {
    helper_package(callee.without_parentheses(), cx.module, cx.graph)
        .is_some_and(|package| package.ends_with("/toConsumableArray"))
}
