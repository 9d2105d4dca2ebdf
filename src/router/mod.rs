//! Pass router
//!
//! Drives one traversal of a module's working AST per iteration,
//! dispatching every visited node to the plugins interested in its kind.
//! Tagger and decompiler passes re-traverse until no plugin reports a
//! change; editor passes run a single traversal. The fixed point is capped,
//! and hitting the cap is a fatal error naming the module and pass.

pub mod context;

use std::time::{Duration, Instant};

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::{Expression, Statement};
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk, walk_mut, Visit, VisitMut};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::module::graph::GraphView;
use crate::module::Module;
use crate::plugins::{NodeKind, Pass, Plugin, PluginMeta, Rewriter, Tagger};
use context::{RewriteContext, StmtSite, TagContext};

/// Upper bound on re-traversals of one module within one pass.
pub const MAX_FIXPOINT_ITERATIONS: usize = 16;

/// Cumulative wall time per plugin, reset between passes.
#[derive(Debug, Default)]
pub struct PluginTimings {
    totals: FxHashMap<&'static str, Duration>,
}

impl PluginTimings {
    fn record(&mut self, name: &'static str, elapsed: Duration) {
        *self.totals.entry(name).or_default() += elapsed;
    }

    /// Timings in descending order.
    pub fn sorted(&self) -> Vec<(&'static str, Duration)> {
        let mut entries: Vec<_> = self.totals.iter().map(|(n, d)| (*n, *d)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

fn timed<R>(timings: &mut PluginTimings, name: &'static str, func: impl FnOnce() -> R) -> R {
    let start = Instant::now();
    let result = func();
    timings.record(name, start.elapsed());
    result
}

/// Dispatch table for one pass: whole-module plugins plus an index from
/// node kind to the plugins interested in it, ordered by ascending
/// priority (stable on definition order).
struct DispatchTable<P> {
    module: Vec<P>,
    by_kind: FxHashMap<NodeKind, Vec<P>>,
}

impl<P: PluginMeta + Copy> DispatchTable<P> {
    fn build(mut plugins: Vec<P>) -> Self {
        plugins.sort_by_key(|p| p.priority());
        let mut module = Vec::new();
        let mut by_kind: FxHashMap<NodeKind, Vec<P>> = FxHashMap::default();
        for plugin in plugins {
            for &kind in plugin.interest() {
                if kind == NodeKind::Module {
                    module.push(plugin);
                } else {
                    by_kind.entry(kind).or_default().push(plugin);
                }
            }
        }
        DispatchTable { module, by_kind }
    }
}

/// The per-module pass driver.
pub struct Router<'p> {
    plugins: &'p [Plugin],
}

impl<'p> Router<'p> {
    pub fn new(plugins: &'p [Plugin]) -> Self {
        Router { plugins }
    }

    fn taggers(&self) -> Vec<&dyn Tagger> {
        self.plugins
            .iter()
            .filter_map(|p| match p {
                Plugin::Tagger(t) => Some(t.as_ref()),
                _ => None,
            })
            .collect()
    }

    fn rewriters(&self, pass: Pass) -> Vec<&dyn Rewriter> {
        self.plugins
            .iter()
            .filter_map(|p| match (pass, p) {
                (Pass::Editor, Plugin::Editor(r)) => Some(r.as_ref()),
                (Pass::Decompiler, Plugin::Decompiler(r)) => Some(r.as_ref()),
                _ => None,
            })
            .collect()
    }

    /// Run the tagger pass on one module, to fixed point. Returns whether
    /// any traversal changed the module's tag state, so the driver can
    /// keep sweeping the whole graph until dependency-aware taggers
    /// settle.
    pub fn route_tagger_pass(
        &self,
        module: &mut Module,
        view: &GraphView,
        timings: &mut PluginTimings,
    ) -> Result<bool> {
        let table = DispatchTable::build(self.taggers());
        let Module { meta, ast } = module;
        let mut any_changed = false;
        for _ in 0..MAX_FIXPOINT_ITERATIONS {
            let changed = ast.with_program(|program| {
                let mut walker = TagWalker {
                    table: &table,
                    cx: TagContext::new(&mut *meta, view),
                    timings: &mut *timings,
                };
                for tagger in &table.module {
                    let cx = &mut walker.cx;
                    timed(&mut *walker.timings, tagger.name(), || tagger.tag_module(program, cx));
                }
                walker.visit_program(program);
                walker.cx.take_changed()
            });
            if !changed {
                return Ok(any_changed);
            }
            any_changed = true;
        }
        Err(Error::FixpointExceeded {
            module: module.meta.id,
            pass: Pass::Tagger.name(),
            iterations: MAX_FIXPOINT_ITERATIONS,
        })
    }

    /// Run the editor or decompiler pass on one module. Editors traverse
    /// once; decompilers iterate to fixed point.
    pub fn route_rewrite_pass(
        &self,
        pass: Pass,
        module: &mut Module,
        view: &GraphView,
        timings: &mut PluginTimings,
    ) -> Result<()> {
        debug_assert!(pass != Pass::Tagger);
        let table = DispatchTable::build(self.rewriters(pass));
        let Module { meta, ast } = module;
        for _ in 0..MAX_FIXPOINT_ITERATIONS {
            let changed = ast.with_mut(|fields| {
                let builder = AstBuilder::new(fields.allocator);
                let mut walker = RewriteWalker {
                    table: &table,
                    cx: RewriteContext::new(builder, &mut *meta, view),
                    timings: &mut *timings,
                    list_depth: 0,
                };
                for rewriter in &table.module {
                    let cx = &mut walker.cx;
                    timed(&mut *walker.timings, rewriter.name(), || {
                        rewriter.rewrite_module(&mut *fields.program, cx)
                    });
                }
                walker.visit_program(fields.program);
                walker.cx.take_changed()
            });
            if !changed || pass == Pass::Editor {
                return Ok(());
            }
        }
        Err(Error::FixpointExceeded {
            module: module.meta.id,
            pass: pass.name(),
            iterations: MAX_FIXPOINT_ITERATIONS,
        })
    }
}

struct TagWalker<'w, 'ctx> {
    table: &'w DispatchTable<&'w dyn Tagger>,
    cx: TagContext<'ctx>,
    timings: &'w mut PluginTimings,
}

impl<'a> Visit<'a> for TagWalker<'_, '_> {
    fn visit_expression(&mut self, expression: &Expression<'a>) {
        if let Some(kind) = NodeKind::of_expression(expression) {
            if let Some(list) = self.table.by_kind.get(&kind) {
                for tagger in list {
                    let cx = &mut self.cx;
                    timed(&mut *self.timings, tagger.name(), || {
                        tagger.tag_expression(expression, cx)
                    });
                    if self.cx.take_skip() {
                        return;
                    }
                }
            }
        }
        walk::walk_expression(self, expression);
    }
}

struct RewriteWalker<'a, 'w, 'ctx> {
    table: &'w DispatchTable<&'w dyn Rewriter>,
    cx: RewriteContext<'a, 'ctx>,
    timings: &'w mut PluginTimings,
    list_depth: usize,
}

impl<'a> RewriteWalker<'a, '_, '_> {
    /// Dispatch plugins at one statement site. Returns how many statements
    /// now occupy the site and whether to descend into it.
    fn dispatch_statement(
        &mut self,
        statements: &mut ArenaVec<'a, Statement<'a>>,
        index: usize,
    ) -> (usize, bool) {
        let Some(kind) = NodeKind::of_statement(&statements[index]) else {
            return (1, true);
        };
        let table = self.table;
        let Some(list) = table.by_kind.get(&kind) else {
            return (1, true);
        };
        let top_level = self.list_depth == 1;
        for rewriter in list {
            let mut site = StmtSite::new(statements, index, top_level);
            let cx = &mut self.cx;
            timed(&mut *self.timings, rewriter.name(), || {
                rewriter.rewrite_statement(&mut site, cx)
            });
            if site.has_action() {
                let occupied = site.apply();
                self.cx.mark_changed();
                // The site changed structurally; the fixpoint re-traversal
                // picks up the new statements.
                return (occupied, false);
            }
            if self.cx.take_skip() {
                return (1, false);
            }
            if NodeKind::of_statement(&statements[index]) != Some(kind) {
                break;
            }
        }
        (1, true)
    }
}

impl<'a> VisitMut<'a> for RewriteWalker<'a, '_, '_> {
    fn visit_statements(&mut self, statements: &mut ArenaVec<'a, Statement<'a>>) {
        self.list_depth += 1;
        let mut index = 0;
        while index < statements.len() {
            let (occupied, descend) = self.dispatch_statement(statements, index);
            if descend {
                self.visit_statement(&mut statements[index]);
            }
            index += occupied;
        }
        self.list_depth -= 1;
    }

    fn visit_expression(&mut self, expression: &mut Expression<'a>) {
        let mut skip = false;
        if let Some(kind) = NodeKind::of_expression(expression) {
            let table = self.table;
            if let Some(list) = table.by_kind.get(&kind) {
                for rewriter in list {
                    let cx = &mut self.cx;
                    timed(&mut *self.timings, rewriter.name(), || {
                        rewriter.rewrite_expression(expression, cx)
                    });
                    if self.cx.take_skip() {
                        skip = true;
                        break;
                    }
                    if NodeKind::of_expression(expression) != Some(kind) {
                        // The node changed identity; later plugins see it
                        // on the next traversal.
                        break;
                    }
                }
            }
        }
        if !skip {
            walk_mut::walk_expression(self, expression);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::compiler::ModuleAst;
    use crate::module::{FactoryBindings, ModuleMeta};
    use oxc_ast::ast::Program;
    use oxc_span::SourceType;
    use smallvec::SmallVec;

    fn test_module(source: &str) -> Module {
        let meta = ModuleMeta::new(
            0,
            None,
            SmallVec::new(),
            source.to_string(),
            0,
            FactoryBindings::default(),
        );
        Module::new(meta, ModuleAst::parse(source.to_string(), SourceType::cjs()).unwrap())
    }

    struct CallCounter;

    impl PluginMeta for CallCounter {
        fn name(&self) -> &'static str {
            "call-counter"
        }
        fn interest(&self) -> &'static [NodeKind] {
            &[NodeKind::CallExpression]
        }
    }

    impl Tagger for CallCounter {
        fn tag_expression<'a>(&self, _expression: &Expression<'a>, cx: &mut TagContext<'_>) {
            cx.tag("has-call");
        }
    }

    struct NeverSettles;

    impl PluginMeta for NeverSettles {
        fn name(&self) -> &'static str {
            "never-settles"
        }
        fn interest(&self) -> &'static [NodeKind] {
            &[NodeKind::Module]
        }
    }

    impl Rewriter for NeverSettles {
        fn rewrite_module<'a>(
            &self,
            _program: &mut Program<'a>,
            cx: &mut RewriteContext<'a, '_>,
        ) {
            cx.mark_changed();
        }
    }

    #[test]
    fn tagger_pass_reaches_fixed_point() {
        let plugins = vec![Plugin::Tagger(Box::new(CallCounter))];
        let router = Router::new(&plugins);
        let mut module = test_module("f(); g();");
        let view = GraphView::default();
        let mut timings = PluginTimings::default();
        assert!(router.route_tagger_pass(&mut module, &view, &mut timings).unwrap());
        assert!(module.meta.has_tag("has-call"));
        // Idempotent: a second pass settles without reporting a change.
        assert!(!router.route_tagger_pass(&mut module, &view, &mut timings).unwrap());
        assert!(!timings.is_empty());
    }

    #[test]
    fn runaway_decompiler_hits_the_cap() {
        let plugins = vec![Plugin::Decompiler(Box::new(NeverSettles))];
        let router = Router::new(&plugins);
        let mut module = test_module("f();");
        let view = GraphView::default();
        let mut timings = PluginTimings::default();
        let err = router
            .route_rewrite_pass(Pass::Decompiler, &mut module, &view, &mut timings)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FixpointExceeded { module: 0, pass: "decompiler", iterations: MAX_FIXPOINT_ITERATIONS }
        ));
    }

    #[test]
    fn editor_pass_traverses_once() {
        let plugins = vec![Plugin::Editor(Box::new(NeverSettles))];
        let router = Router::new(&plugins);
        let mut module = test_module("f();");
        let view = GraphView::default();
        let mut timings = PluginTimings::default();
        // An editor that always reports a change must still terminate.
        router.route_rewrite_pass(Pass::Editor, &mut module, &view, &mut timings).unwrap();
    }
}
