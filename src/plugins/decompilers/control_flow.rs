//! Minifier control-flow contractions back to statements

use oxc_ast::ast::{Expression, Statement};
use oxc_syntax::operator::LogicalOperator;

use crate::plugins::snippet::AstSnippet;
use crate::plugins::{NodeKind, PluginMeta, Rewriter};
use crate::router::context::{RewriteContext, StmtSite};

/// Statement-position short-circuits and ternaries:
/// `a && b();` becomes `if (a) b();`, `a || b();` becomes `if (!a) b();`,
/// `a ? b() : c();` becomes an `if`/`else`. Nullish coalescing carries its
/// own semantics and is left alone.
pub struct ShortCircuitToIf;

impl PluginMeta for ShortCircuitToIf {
    fn name(&self) -> &'static str {
        "short-circuit-to-if"
    }

    fn priority(&self) -> i32 {
        25
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::ExpressionStatement]
    }
}

impl Rewriter for ShortCircuitToIf {
    fn rewrite_statement<'a>(&self, site: &mut StmtSite<'_, 'a>, cx: &mut RewriteContext<'a, '_>) {
        let snippet = AstSnippet::new(cx.ast);
        let Statement::ExpressionStatement(statement) = site.stmt_mut() else {
            return;
        };
        match &mut statement.expression {
            Expression::LogicalExpression(logical) => {
                let negate = match logical.operator {
                    LogicalOperator::And => false,
                    LogicalOperator::Or => true,
                    LogicalOperator::Coalesce => return,
                };
                let mut test = snippet.take_expression(&mut logical.left);
                if negate {
                    test = snippet.not_expr(test);
                }
                let body = snippet.expr_stmt(snippet.take_expression(&mut logical.right));
                site.replace(vec![snippet.if_stmt(test, body, None)]);
            }
            Expression::ConditionalExpression(conditional) => {
                let test = snippet.take_expression(&mut conditional.test);
                let consequent =
                    snippet.expr_stmt(snippet.take_expression(&mut conditional.consequent));
                let alternate =
                    snippet.expr_stmt(snippet.take_expression(&mut conditional.alternate));
                site.replace(vec![snippet.if_stmt(test, consequent, Some(alternate))]);
            }
            _ => {}
        }
    }
}
