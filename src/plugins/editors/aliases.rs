//! Factory-parameter aliases and directives

use oxc_ast::ast::{Expression, Program, Statement};

use crate::plugins::{NodeKind, PluginMeta, Rewriter};
use crate::router::context::RewriteContext;

/// Metro factories frequently re-bind a factory parameter before use
/// (`var t = r;`). Recording the alias on the module lets every later
/// matcher treat `t(...)` as a `require(...)` call, and the declarator
/// itself disappears.
pub struct ParamAliasInliner;

impl PluginMeta for ParamAliasInliner {
    fn name(&self) -> &'static str {
        "param-alias-inliner"
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Rewriter for ParamAliasInliner {
    fn rewrite_module<'a>(&self, program: &mut Program<'a>, cx: &mut RewriteContext<'a, '_>) {
        let mut changed = false;
        let mut index = 0;
        while index < program.body.len() {
            if let Statement::VariableDeclaration(declaration) = &mut program.body[index] {
                let before = declaration.declarations.len();
                let bindings = &mut cx.module.bindings;
                declaration.declarations.retain(|declarator| {
                    let Some(Expression::Identifier(init)) = &declarator.init else {
                        return true;
                    };
                    let Some(role) = bindings.role_of(init.name.as_str()) else {
                        return true;
                    };
                    let Some(alias) = declarator.id.get_identifier_name() else {
                        return true;
                    };
                    bindings.add_alias(role, alias.as_str());
                    false
                });
                if declaration.declarations.len() != before {
                    changed = true;
                }
                if declaration.declarations.is_empty() {
                    program.body.remove(index);
                    continue;
                }
            }
            index += 1;
        }
        if changed {
            cx.mark_changed();
        }
    }
}

/// Strips `"use strict"` directives; the emitted ES modules are strict by
/// definition.
pub struct UseStrictStripper;

impl PluginMeta for UseStrictStripper {
    fn name(&self) -> &'static str {
        "use-strict-stripper"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Rewriter for UseStrictStripper {
    fn rewrite_module<'a>(&self, program: &mut Program<'a>, cx: &mut RewriteContext<'a, '_>) {
        let before = program.directives.len();
        program.directives.retain(|directive| directive.directive != "use strict");
        if program.directives.len() != before {
            cx.mark_changed();
        }
    }
}
