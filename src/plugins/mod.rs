//! Plugin families
//!
//! Three families drive the pipeline, in increasing order of rewrite
//! ambition: taggers classify modules, editors perform local clean-ups,
//! decompilers recover ESM semantics from the Metro calling convention.
//! Families are expressed as capability traits behind a tagged `Plugin`
//! enum; the router dispatches over a node-kind table, no dynamic
//! base-class machinery involved.

pub mod decompilers;
pub mod editors;
pub mod matchers;
pub mod snippet;
pub mod taggers;

use oxc_ast::ast::{Expression, Program, Statement};

use crate::router::context::{RewriteContext, StmtSite, TagContext};

/// The three pipeline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Tagger,
    Editor,
    Decompiler,
}

impl Pass {
    pub fn name(self) -> &'static str {
        match self {
            Pass::Tagger => "tagger",
            Pass::Editor => "editor",
            Pass::Decompiler => "decompiler",
        }
    }
}

/// AST node kinds a plugin can declare interest in. `Module` is the
/// whole-module sentinel: the plugin runs once per module, not per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    ExpressionStatement,
    VariableDeclaration,
    CallExpression,
    SequenceExpression,
    LogicalExpression,
    ConditionalExpression,
    AssignmentExpression,
    ArrayExpression,
    MemberExpression,
    FunctionExpression,
}

impl NodeKind {
    pub fn of_statement(statement: &Statement<'_>) -> Option<NodeKind> {
        match statement {
            Statement::ExpressionStatement(_) => Some(NodeKind::ExpressionStatement),
            Statement::VariableDeclaration(_) => Some(NodeKind::VariableDeclaration),
            _ => None,
        }
    }

    pub fn of_expression(expression: &Expression<'_>) -> Option<NodeKind> {
        match expression {
            Expression::CallExpression(_) => Some(NodeKind::CallExpression),
            Expression::SequenceExpression(_) => Some(NodeKind::SequenceExpression),
            Expression::LogicalExpression(_) => Some(NodeKind::LogicalExpression),
            Expression::ConditionalExpression(_) => Some(NodeKind::ConditionalExpression),
            Expression::AssignmentExpression(_) => Some(NodeKind::AssignmentExpression),
            Expression::ArrayExpression(_) => Some(NodeKind::ArrayExpression),
            Expression::FunctionExpression(_) => Some(NodeKind::FunctionExpression),
            Expression::StaticMemberExpression(_)
            | Expression::ComputedMemberExpression(_)
            | Expression::PrivateFieldExpression(_) => Some(NodeKind::MemberExpression),
            _ => None,
        }
    }
}

/// Metadata shared by every plugin family.
pub trait PluginMeta {
    /// Human-readable identifier, used for the performance report.
    fn name(&self) -> &'static str;

    /// Lower runs first within a pass; ties resolve in definition order.
    fn priority(&self) -> i32 {
        0
    }

    /// Node kinds this plugin wants to see.
    fn interest(&self) -> &'static [NodeKind];
}

impl<T: PluginMeta + ?Sized> PluginMeta for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn priority(&self) -> i32 {
        (**self).priority()
    }
    fn interest(&self) -> &'static [NodeKind] {
        (**self).interest()
    }
}

/// Pattern recognizers. Taggers read the AST or the minified original code
/// and classify the module; they must not throw on non-matches and must be
/// idempotent.
pub trait Tagger: PluginMeta + Send + Sync {
    fn tag_module<'a>(&self, _program: &Program<'a>, _cx: &mut TagContext<'_>) {}
    fn tag_expression<'a>(&self, _expression: &Expression<'a>, _cx: &mut TagContext<'_>) {}
}

/// AST rewriters. Editors and decompilers share this capability; they
/// differ in pass placement and in whether the router iterates to fixpoint.
/// Every rewrite must be a pure function of the matched subtree: on a
/// non-match the node is left untouched.
pub trait Rewriter: PluginMeta + Send + Sync {
    fn rewrite_module<'a>(&self, _program: &mut Program<'a>, _cx: &mut RewriteContext<'a, '_>) {}
    fn rewrite_statement<'a>(
        &self,
        _site: &mut StmtSite<'_, 'a>,
        _cx: &mut RewriteContext<'a, '_>,
    ) {
    }
    fn rewrite_expression<'a>(
        &self,
        _expression: &mut Expression<'a>,
        _cx: &mut RewriteContext<'a, '_>,
    ) {
    }
}

/// A registered plugin, tagged by family.
pub enum Plugin {
    Tagger(Box<dyn Tagger>),
    Editor(Box<dyn Rewriter>),
    Decompiler(Box<dyn Rewriter>),
}

impl Plugin {
    pub fn pass(&self) -> Pass {
        match self {
            Plugin::Tagger(_) => Pass::Tagger,
            Plugin::Editor(_) => Pass::Editor,
            Plugin::Decompiler(_) => Pass::Decompiler,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plugin::Tagger(p) => p.name(),
            Plugin::Editor(p) => p.name(),
            Plugin::Decompiler(p) => p.name(),
        }
    }
}

/// The built-in plugin set, in definition order.
pub fn built_in_plugins() -> Vec<Plugin> {
    vec![
        // Taggers: cheap fingerprints first, structural recognizers after.
        Plugin::Tagger(Box::new(taggers::babel_helpers::BabelHelperFingerprints)),
        Plugin::Tagger(Box::new(taggers::npm_fingerprints::NpmFingerprints)),
        Plugin::Tagger(Box::new(taggers::structural::EsModuleFlag)),
        Plugin::Tagger(Box::new(taggers::structural::PassthroughWrapper)),
        Plugin::Tagger(Box::new(taggers::structural::ReactComponent)),
        Plugin::Tagger(Box::new(taggers::runtime_glue::RuntimeGlue)),
        // Editors: one traversal of shape-preserving clean-ups.
        Plugin::Editor(Box::new(editors::aliases::ParamAliasInliner)),
        Plugin::Editor(Box::new(editors::aliases::UseStrictStripper)),
        Plugin::Editor(Box::new(editors::statements::SequenceSplitter)),
        Plugin::Editor(Box::new(editors::statements::IifeUnwrapper)),
        Plugin::Editor(Box::new(editors::statements::VarMerger)),
        // Decompilers: Metro calling convention back to ESM.
        Plugin::Decompiler(Box::new(decompilers::imports::RequireToImport)),
        Plugin::Decompiler(Box::new(decompilers::imports::InlineRequire)),
        Plugin::Decompiler(Box::new(decompilers::exports::ExportsToEsm)),
        Plugin::Decompiler(Box::new(decompilers::helpers::HelperCallSites)),
        Plugin::Decompiler(Box::new(decompilers::helpers::SpreadRecovery)),
        Plugin::Decompiler(Box::new(decompilers::control_flow::ShortCircuitToIf)),
        Plugin::Decompiler(Box::new(decompilers::imports::ImportFinalizer)),
    ]
}
