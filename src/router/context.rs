//! Plugin contexts and node sites
//!
//! A site is the router's stand-in for a mutable node path: statement sites
//! expose the enclosing statement list so rewrites can splice, expression
//! sites hand out the expression slot itself. Contexts carry the current
//! module's metadata, a read-only view of the sibling modules, and the
//! skip/changed flags the router folds into its fixpoint.

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::Statement;
use oxc_ast::AstBuilder;

use crate::module::graph::GraphView;
use crate::module::{ModuleId, ModuleMeta, PendingImport};

/// Context handed to taggers. Taggers classify; they never touch the AST.
pub struct TagContext<'ctx> {
    pub module: &'ctx mut ModuleMeta,
    pub graph: &'ctx GraphView,
    changed: bool,
    skip: bool,
}

impl<'ctx> TagContext<'ctx> {
    pub fn new(module: &'ctx mut ModuleMeta, graph: &'ctx GraphView) -> Self {
        TagContext { module, graph, changed: false, skip: false }
    }

    /// Add a classification tag.
    pub fn tag(&mut self, name: impl Into<String>) {
        if self.module.tag(name) {
            self.changed = true;
        }
    }

    /// Add a classification tag with tagger-produced auxiliary data.
    pub fn tag_with_params(&mut self, name: impl Into<String>, params: Vec<String>) {
        if self.module.tag_with_params(name, params) {
            self.changed = true;
        }
    }

    /// Classify the module as a bundled NPM package (implies ignored).
    pub fn tag_as_npm_module(&mut self, package: impl Into<String>) {
        if self.module.tag_as_npm_module(package) {
            self.changed = true;
        }
    }

    /// Exclude the module from output.
    pub fn ignore(&mut self, reason: impl Into<String>) {
        if self.module.ignore(reason) {
            self.changed = true;
        }
    }

    /// Sibling metadata for the dependency in `slot`, if it resolves.
    pub fn dependency_info(&self, slot: usize) -> Option<&crate::module::graph::SiblingInfo> {
        self.graph.info(self.module.dependency_at(slot)?)
    }

    /// Do not descend below the current node.
    pub fn skip(&mut self) {
        self.skip = true;
    }

    pub(crate) fn take_skip(&mut self) -> bool {
        std::mem::take(&mut self.skip)
    }

    pub(crate) fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

/// Context handed to editors and decompilers.
pub struct RewriteContext<'a, 'ctx> {
    pub ast: AstBuilder<'a>,
    pub module: &'ctx mut ModuleMeta,
    pub graph: &'ctx GraphView,
    changed: bool,
    skip: bool,
}

impl<'a, 'ctx> RewriteContext<'a, 'ctx> {
    pub fn new(ast: AstBuilder<'a>, module: &'ctx mut ModuleMeta, graph: &'ctx GraphView) -> Self {
        RewriteContext { ast, module, graph, changed: false, skip: false }
    }

    /// Record that the AST was mutated; the router re-traverses until no
    /// plugin reports a change.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Do not descend below the current node.
    pub fn skip(&mut self) {
        self.skip = true;
    }

    /// The import source a dependency id resolves to.
    pub fn import_source(&self, id: ModuleId) -> String {
        self.graph.import_source(id)
    }

    /// Queue an import to be materialized by the import finalizer.
    pub fn queue_import(&mut self, import: PendingImport) {
        if !self.module.pending_imports.contains(&import) {
            self.module.pending_imports.push(import);
            self.changed = true;
        }
    }

    pub(crate) fn take_skip(&mut self) -> bool {
        std::mem::take(&mut self.skip)
    }

    pub(crate) fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

/// What a statement-site rewrite decided to do with the current statement.
enum SiteAction<'a> {
    Replace(Vec<Statement<'a>>),
    Remove,
}

/// A cursor into a statement list.
pub struct StmtSite<'p, 'a> {
    stmts: &'p mut ArenaVec<'a, Statement<'a>>,
    index: usize,
    top_level: bool,
    action: Option<SiteAction<'a>>,
}

impl<'p, 'a> StmtSite<'p, 'a> {
    pub(crate) fn new(
        stmts: &'p mut ArenaVec<'a, Statement<'a>>,
        index: usize,
        top_level: bool,
    ) -> Self {
        StmtSite { stmts, index, top_level, action: None }
    }

    /// Whether this site is in the module's top-level statement list.
    /// Import/export rewrites only apply there.
    pub fn is_top_level(&self) -> bool {
        self.top_level
    }

    pub fn stmt(&self) -> &Statement<'a> {
        &self.stmts[self.index]
    }

    pub fn stmt_mut(&mut self) -> &mut Statement<'a> {
        &mut self.stmts[self.index]
    }

    /// The previous statement and the current one, for merge rewrites.
    pub fn prev_and_current_mut(&mut self) -> Option<(&mut Statement<'a>, &mut Statement<'a>)> {
        if self.index == 0 {
            return None;
        }
        let (head, tail) = self.stmts.split_at_mut(self.index);
        Some((&mut head[self.index - 1], &mut tail[0]))
    }

    /// Replace the current statement with `statements`.
    pub fn replace(&mut self, statements: Vec<Statement<'a>>) {
        self.action = Some(SiteAction::Replace(statements));
    }

    /// Remove the current statement.
    pub fn remove(&mut self) {
        self.action = Some(SiteAction::Remove);
    }

    pub(crate) fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Apply the recorded action. Returns how many statements now occupy
    /// the site (the router advances past them without descending).
    pub(crate) fn apply(self) -> usize {
        match self.action {
            None => 1,
            Some(SiteAction::Remove) => {
                self.stmts.remove(self.index);
                0
            }
            Some(SiteAction::Replace(statements)) => {
                self.stmts.remove(self.index);
                let count = statements.len();
                for (offset, statement) in statements.into_iter().enumerate() {
                    self.stmts.insert(self.index + offset, statement);
                }
                count
            }
        }
    }
}
