//! Statement-level clean-ups

use oxc_ast::ast::{Expression, Statement, VariableDeclarationKind};

use crate::plugins::snippet::AstSnippet;
use crate::plugins::{NodeKind, PluginMeta, Rewriter};
use crate::router::context::{RewriteContext, StmtSite};

/// `(a(), b(), c);` at statement position becomes three statements.
pub struct SequenceSplitter;

impl PluginMeta for SequenceSplitter {
    fn name(&self) -> &'static str {
        "sequence-splitter"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::ExpressionStatement]
    }
}

impl Rewriter for SequenceSplitter {
    fn rewrite_statement<'a>(&self, site: &mut StmtSite<'_, 'a>, cx: &mut RewriteContext<'a, '_>) {
        let snippet = AstSnippet::new(cx.ast);
        let Statement::ExpressionStatement(statement) = site.stmt_mut() else {
            return;
        };
        let Expression::SequenceExpression(sequence) =
            &mut statement.expression
        else {
            return;
        };
        let mut statements = Vec::with_capacity(sequence.expressions.len());
        for expression in sequence.expressions.iter_mut() {
            statements.push(snippet.expr_stmt(snippet.take_expression(expression)));
        }
        site.replace(statements);
    }
}

/// Unwraps a statement-position IIFE with no parameters, no arguments and
/// a body of plain expression statements. Anything that declares bindings
/// or returns keeps its wrapper.
pub struct IifeUnwrapper;

impl PluginMeta for IifeUnwrapper {
    fn name(&self) -> &'static str {
        "iife-unwrapper"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::ExpressionStatement]
    }
}

impl Rewriter for IifeUnwrapper {
    fn rewrite_statement<'a>(&self, site: &mut StmtSite<'_, 'a>, cx: &mut RewriteContext<'a, '_>) {
        let snippet = AstSnippet::new(cx.ast);
        let Statement::ExpressionStatement(statement) = site.stmt_mut() else {
            return;
        };
        let Expression::CallExpression(call) = &mut statement.expression else {
            return;
        };
        if !call.arguments.is_empty() {
            return;
        }
        let callee = match &mut call.callee {
            Expression::ParenthesizedExpression(paren) => &mut paren.expression,
            other => other,
        };
        let Expression::FunctionExpression(function) = callee else {
            return;
        };
        if !function.params.items.is_empty() {
            return;
        }
        let Some(body) = function.body.as_mut() else {
            return;
        };
        if !body.directives.is_empty()
            || !body.statements.iter().all(|s| matches!(s, Statement::ExpressionStatement(_)))
        {
            return;
        }
        let mut statements = Vec::with_capacity(body.statements.len());
        for inner in body.statements.iter_mut() {
            statements.push(snippet.take_statement(inner));
        }
        site.replace(statements);
    }
}

/// Merges a `var` declaration statement into an immediately preceding
/// `var` declaration statement.
pub struct VarMerger;

impl PluginMeta for VarMerger {
    fn name(&self) -> &'static str {
        "var-merger"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::VariableDeclaration]
    }
}

impl Rewriter for VarMerger {
    fn rewrite_statement<'a>(&self, site: &mut StmtSite<'_, 'a>, cx: &mut RewriteContext<'a, '_>) {
        let empty = cx.ast.vec();
        let Some((previous, current)) = site.prev_and_current_mut() else {
            return;
        };
        let (Statement::VariableDeclaration(previous), Statement::VariableDeclaration(current)) =
            (previous, current)
        else {
            return;
        };
        if previous.kind != VariableDeclarationKind::Var
            || current.kind != VariableDeclarationKind::Var
        {
            return;
        }
        let declarations = std::mem::replace(&mut current.declarations, empty);
        previous.declarations.extend(declarations);
        site.remove();
    }
}
