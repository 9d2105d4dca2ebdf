//! `require` protocol to ESM imports

use oxc_ast::ast::{Expression, Program, Statement};
use rustc_hash::FxHashSet;

use crate::module::{ModuleId, PendingImport};
use crate::plugins::matchers::{require_call_expr, RequireKind};
use crate::plugins::snippet::AstSnippet;
use crate::plugins::{NodeKind, PluginMeta, Rewriter};
use crate::router::context::{RewriteContext, StmtSite};

/// Declaration-position requires:
/// `var X = require(dependencyMap[i])` becomes `import X from '...'`,
/// `var X = importAll(...)` becomes `import * as X from '...'`, and a bare
/// `require(...)` statement becomes a side-effect import. Declarations
/// with several declarators are split; the convertible declarators turn
/// into imports, the rest stay a declaration.
pub struct RequireToImport;

impl PluginMeta for RequireToImport {
    fn name(&self) -> &'static str {
        "require-to-import"
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::VariableDeclaration, NodeKind::ExpressionStatement]
    }
}

struct ImportPlan {
    declarator: usize,
    local: String,
    kind: RequireKind,
    source: String,
    npm_package: Option<String>,
}

impl Rewriter for RequireToImport {
    fn rewrite_statement<'a>(&self, site: &mut StmtSite<'_, 'a>, cx: &mut RewriteContext<'a, '_>) {
        // Imports may only appear at the top level; nested requires are the
        // inline rewrite's business.
        if !site.is_top_level() {
            return;
        }
        let snippet = AstSnippet::new(cx.ast);
        match site.stmt() {
            Statement::VariableDeclaration(declaration) => {
                let mut plan: Vec<ImportPlan> = Vec::new();
                for (index, declarator) in declaration.declarations.iter().enumerate() {
                    let Some(init) = &declarator.init else {
                        continue;
                    };
                    let Some((kind, dep)) =
                        require_call_expr(init.without_parentheses(), cx.module)
                    else {
                        continue;
                    };
                    let Some(id) = dep.resolve(cx.module) else {
                        continue;
                    };
                    let Some(local) = declarator.id.get_identifier_name() else {
                        continue;
                    };
                    plan.push(ImportPlan {
                        declarator: index,
                        local: local.to_string(),
                        kind,
                        source: cx.import_source(id),
                        npm_package: npm_package(cx, id),
                    });
                }
                if plan.is_empty() {
                    return;
                }

                let mut statements: Vec<Statement<'a>> = plan
                    .iter()
                    .map(|entry| match entry.kind {
                        RequireKind::ImportAll => {
                            snippet.import_namespace_stmt(&entry.local, &entry.source)
                        }
                        RequireKind::Require | RequireKind::ImportDefault => {
                            snippet.import_default_stmt(&entry.local, &entry.source)
                        }
                    })
                    .collect();
                for entry in &plan {
                    if let Some(package) = &entry.npm_package {
                        cx.module.helper_bindings.insert(entry.local.clone(), package.clone());
                    }
                }

                let consumed: FxHashSet<usize> = plan.iter().map(|e| e.declarator).collect();
                let taken = snippet.take_statement(site.stmt_mut());
                let Statement::VariableDeclaration(mut declaration) = taken else {
                    unreachable!("statement kind checked above");
                };
                let mut index = 0;
                declaration.declarations.retain(|_| {
                    let keep = !consumed.contains(&index);
                    index += 1;
                    keep
                });
                if !declaration.declarations.is_empty() {
                    statements.push(Statement::VariableDeclaration(declaration));
                }
                site.replace(statements);
            }
            Statement::ExpressionStatement(statement) => {
                let Some((_, dep)) =
                    require_call_expr(statement.expression.without_parentheses(), cx.module)
                else {
                    return;
                };
                let Some(id) = dep.resolve(cx.module) else {
                    return;
                };
                let source = cx.import_source(id);
                site.replace(vec![snippet.import_side_effect_stmt(&source)]);
            }
            _ => {}
        }
    }
}

fn npm_package(cx: &RewriteContext<'_, '_>, id: ModuleId) -> Option<String> {
    let info = cx.graph.info(id)?;
    if info.is_npm_module {
        info.npm_module_name.clone()
    } else {
        None
    }
}

/// Expression-position requires (`require(d[0]).something`, arguments,
/// callees). The call collapses to a synthesized local binding and the
/// matching import is queued for the finalizer.
pub struct InlineRequire;

impl PluginMeta for InlineRequire {
    fn name(&self) -> &'static str {
        "inline-require"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::CallExpression]
    }
}

impl Rewriter for InlineRequire {
    fn rewrite_expression<'a>(
        &self,
        expression: &mut Expression<'a>,
        cx: &mut RewriteContext<'a, '_>,
    ) {
        let snippet = AstSnippet::new(cx.ast);
        let Some((kind, dep)) = require_call_expr(expression, cx.module) else {
            return;
        };
        let Some(id) = dep.resolve(cx.module) else {
            return;
        };
        let source = cx.import_source(id);
        let local = local_name_for(&source, id);
        let import = match kind {
            RequireKind::ImportAll => {
                PendingImport::Namespace { local: local.clone(), source: source.clone() }
            }
            RequireKind::Require | RequireKind::ImportDefault => {
                PendingImport::Default { local: local.clone(), source: source.clone() }
            }
        };
        cx.queue_import(import);
        if let Some(package) = npm_package(cx, id) {
            cx.module.helper_bindings.insert(local.clone(), package);
        }
        *expression = snippet.id_ref_expr(&local);
        cx.mark_changed();
    }
}

/// A deterministic local binding name for an import source.
fn local_name_for(source: &str, id: ModuleId) -> String {
    if let Some(local) = crate::plugins::matchers::babel_helper_local(source) {
        return local;
    }
    if let Some(internal) = source.strip_prefix("./") {
        return format!("module{internal}");
    }
    let mut local = String::with_capacity(source.len() + 1);
    local.push('_');
    for ch in source.chars() {
        if ch.is_ascii_alphanumeric() {
            local.push(ch);
        } else if !local.ends_with('_') {
            local.push('_');
        }
    }
    if local == "_" {
        format!("module{id}")
    } else {
        local
    }
}

/// Whole-module finisher that materializes queued imports at the top of
/// the program. Runs last in the pass; draining the queue marks a change,
/// so the fixpoint gives every other decompiler one more look.
pub struct ImportFinalizer;

impl PluginMeta for ImportFinalizer {
    fn name(&self) -> &'static str {
        "import-finalizer"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Rewriter for ImportFinalizer {
    fn rewrite_module<'a>(&self, program: &mut Program<'a>, cx: &mut RewriteContext<'a, '_>) {
        if cx.module.pending_imports.is_empty() {
            return;
        }
        let snippet = AstSnippet::new(cx.ast);
        let pending = std::mem::take(&mut cx.module.pending_imports);
        for (position, import) in pending.iter().enumerate() {
            let statement = match import {
                PendingImport::Default { local, source } => {
                    snippet.import_default_stmt(local, source)
                }
                PendingImport::Namespace { local, source } => {
                    snippet.import_namespace_stmt(local, source)
                }
                PendingImport::SideEffect { source } => snippet.import_side_effect_stmt(source),
            };
            program.body.insert(position, statement);
        }
        cx.mark_changed();
    }
}
